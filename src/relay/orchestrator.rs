//! Two-Agent Research Orchestration
//!
//! The [`Orchestrator`] drives a bounded conversation between a primary agent (the
//! researcher) and a secondary agent (the synthesizer). It owns the global history, the only
//! place where every routed or injected message is recorded, and the turn protocol that
//! decides who speaks next and with which instruction.
//!
//! # Turn protocol
//!
//! ```text
//! Seeded ── human query ──▶ researcher
//!   │
//!   ▼   for turn in 1..=max_turns
//! Researching:   researcher responds ──route──▶ synthesizer
//!                orchestrator instruction ────▶ synthesizer
//! Synthesizing:  synthesizer responds ─route──▶ researcher
//!                (not final turn) follow-up ──▶ researcher
//!   │
//!   ▼
//! Completed
//! ```
//!
//! Recording into the global history happens at the exact moment a message becomes visible
//! to an agent (seed, route or inject), so history order is creation order and each agent's
//! partial view can be rebuilt by filtering.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_relay::{Agent, Orchestrator};
//! use agent_relay::clients::groq::GroqClient;
//! use std::sync::Arc;
//!
//! # async {
//! let client = || Arc::new(GroqClient::new_with_model_str("key", "llama3-70b-8192"));
//! let researcher = Agent::new("researcher_1", "ResearchBot", "information_gatherer", None, client());
//! let synthesizer = Agent::new("synthesizer_1", "SynthBot", "critic_summarizer", None, client());
//!
//! let mut orchestrator = Orchestrator::new(vec![researcher, synthesizer]).unwrap();
//! let transcript = orchestrator.run_workflow("What is quantum entanglement?", 2).await.unwrap();
//! assert_eq!(transcript.len(), 8);
//! orchestrator.save_transcript("mcp_transcript.json").unwrap();
//! # };
//! ```

use crate::relay::agent::{Agent, AgentError};
use crate::relay::client_wrapper::Role;
use crate::relay::event::{EventHandler, OrchestrationEvent};
use crate::relay::protocol::{ProtocolMessage, HUMAN_AUTHOR, ORCHESTRATOR_AUTHOR, TYPE_KEY};
use crate::relay::transcript::{self, TranscriptEntry, TranscriptError};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Instruction injected into the synthesizer after each research response.
pub const DEFAULT_SYNTHESIS_INSTRUCTION: &str =
    "Based on the research provided, please synthesize the key points and provide a critical analysis.";

/// Instruction injected into the researcher after each synthesis, except on the final turn.
pub const DEFAULT_FOLLOWUP_INSTRUCTION: &str = "Consider the synthesis and critique above. Please investigate further on any gaps or areas that need more explanation.";

/// Number of agents a workflow coordinates.
pub const AGENT_COUNT: usize = 2;

/// Where a workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Constructed, `run_workflow` not called yet.
    Idle,
    /// The initial query has been recorded and handed to the primary agent.
    Seeded,
    /// The primary agent is producing, or its output is being routed.
    Researching,
    /// The secondary agent is producing, or its output is being routed.
    Synthesizing,
    /// All turns are done, or the run was aborted.
    Completed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "Idle",
            WorkflowState::Seeded => "Seeded",
            WorkflowState::Researching => "Researching",
            WorkflowState::Synthesizing => "Synthesizing",
            WorkflowState::Completed => "Completed",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during orchestrator setup or execution.
#[derive(Debug)]
pub enum OrchestrationError {
    /// The orchestrator needs exactly [`AGENT_COUNT`] agents.
    InvalidAgentCount(usize),
    /// Two agents were registered with the same id.
    DuplicateAgent(String),
    /// A routing call named an agent that is not registered.
    AgentNotFound(String),
    /// `run_workflow` was called on an orchestrator that already ran.
    AlreadyRun,
    /// An agent failed under [`BackendFailurePolicy::FailRound`](crate::agent::BackendFailurePolicy::FailRound).
    AgentFailed(AgentError),
    /// Writing the transcript failed.
    Transcript(TranscriptError),
}

impl fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationError::InvalidAgentCount(n) => write!(
                f,
                "Orchestrator requires exactly {} agents, got {}",
                AGENT_COUNT, n
            ),
            OrchestrationError::DuplicateAgent(id) => {
                write!(f, "Agent with id '{}' already exists", id)
            }
            OrchestrationError::AgentNotFound(id) => write!(f, "Agent not found: {}", id),
            OrchestrationError::AlreadyRun => write!(f, "Workflow has already been run"),
            OrchestrationError::AgentFailed(e) => write!(f, "{}", e),
            OrchestrationError::Transcript(e) => write!(f, "{}", e),
        }
    }
}

impl Error for OrchestrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OrchestrationError::AgentFailed(e) => Some(e),
            OrchestrationError::Transcript(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AgentError> for OrchestrationError {
    fn from(e: AgentError) -> Self {
        OrchestrationError::AgentFailed(e)
    }
}

impl From<TranscriptError> for OrchestrationError {
    fn from(e: TranscriptError) -> Self {
        OrchestrationError::Transcript(e)
    }
}

/// Coordinates a researcher/synthesizer pair and records the conversation.
pub struct Orchestrator {
    /// Registered agents keyed by their [`Agent::id`].
    agents: HashMap<String, Agent>,

    /// Agent ids in registration order: primary first, secondary second.
    agent_order: Vec<String>,

    /// Every routed, injected or seeded message, in recording order.
    conversation_history: Vec<ProtocolMessage>,

    /// Ids already present in `conversation_history`.
    recorded_ids: HashSet<String>,

    state: WorkflowState,
    synthesis_instruction: String,
    followup_instruction: String,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Orchestrator {
    /// Register the two agents. The first is the primary (research) agent, the second the
    /// secondary (synthesis) agent.
    pub fn new(agents: Vec<Agent>) -> Result<Self, OrchestrationError> {
        if agents.len() != AGENT_COUNT {
            return Err(OrchestrationError::InvalidAgentCount(agents.len()));
        }

        let mut registry = HashMap::with_capacity(AGENT_COUNT);
        let mut agent_order = Vec::with_capacity(AGENT_COUNT);
        for agent in agents {
            if registry.contains_key(&agent.id) {
                return Err(OrchestrationError::DuplicateAgent(agent.id));
            }
            agent_order.push(agent.id.clone());
            registry.insert(agent.id.clone(), agent);
        }

        Ok(Self {
            agents: registry,
            agent_order,
            conversation_history: Vec::new(),
            recorded_ids: HashSet::new(),
            state: WorkflowState::Idle,
            synthesis_instruction: DEFAULT_SYNTHESIS_INSTRUCTION.to_string(),
            followup_instruction: DEFAULT_FOLLOWUP_INSTRUCTION.to_string(),
            event_handler: None,
        })
    }

    /// Register an event handler and propagate it to both agents.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        for agent in self.agents.values_mut() {
            agent.set_event_handler(Arc::clone(&handler));
        }
        self.event_handler = Some(handler);
        self
    }

    pub fn with_synthesis_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.synthesis_instruction = instruction.into();
        self
    }

    pub fn with_followup_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.followup_instruction = instruction.into();
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn get_agent(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Agents in registration order.
    pub fn list_agents(&self) -> Vec<&Agent> {
        self.agent_order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .collect()
    }

    pub fn primary_agent_id(&self) -> &str {
        &self.agent_order[0]
    }

    pub fn secondary_agent_id(&self) -> &str {
        &self.agent_order[1]
    }

    /// The global history, in recording order.
    pub fn get_conversation_history(&self) -> &[ProtocolMessage] {
        &self.conversation_history
    }

    /// Record `message` centrally and append it to the recipient's log in one step.
    ///
    /// A message that is already in the global history (routed to a second recipient) is
    /// delivered again but recorded only once.
    pub async fn send_message(
        &mut self,
        from_agent_id: &str,
        to_agent_id: &str,
        message: ProtocolMessage,
    ) -> Result<(), OrchestrationError> {
        if !self.agents.contains_key(to_agent_id) {
            return Err(OrchestrationError::AgentNotFound(to_agent_id.to_string()));
        }

        let message_id = message.id().to_string();
        if !self.recorded_ids.contains(&message_id) {
            self.record_message(message.clone());
        }
        if let Some(agent) = self.agents.get_mut(to_agent_id) {
            agent.add_message(message).await;
        }

        self.emit(OrchestrationEvent::MessageRouted {
            from_agent: from_agent_id.to_string(),
            to_agent: to_agent_id.to_string(),
            message_id,
        })
        .await;
        Ok(())
    }

    /// Record an orchestrator-authored user message and append it to `to_agent_id`'s log.
    pub async fn inject_instruction(
        &mut self,
        to_agent_id: &str,
        content: &str,
        references: Vec<String>,
    ) -> Result<ProtocolMessage, OrchestrationError> {
        if !self.agents.contains_key(to_agent_id) {
            return Err(OrchestrationError::AgentNotFound(to_agent_id.to_string()));
        }

        let message = ProtocolMessage::new(Role::User, content, ORCHESTRATOR_AUTHOR)
            .with_references(references)
            .with_metadata(TYPE_KEY, "instruction");

        self.record_message(message.clone());
        if let Some(agent) = self.agents.get_mut(to_agent_id) {
            agent.add_message(message.clone()).await;
        }

        self.emit(OrchestrationEvent::InstructionInjected {
            to_agent: to_agent_id.to_string(),
            message_id: message.id().to_string(),
            content: content.to_string(),
        })
        .await;
        Ok(message)
    }

    /// Run the full researcher/synthesizer exchange and return the flattened transcript.
    pub async fn run_workflow(
        &mut self,
        initial_query: &str,
        max_turns: usize,
    ) -> Result<Vec<TranscriptEntry>, OrchestrationError> {
        if self.state != WorkflowState::Idle {
            return Err(OrchestrationError::AlreadyRun);
        }

        let researcher_id = self.agent_order[0].clone();
        let synthesizer_id = self.agent_order[1].clone();

        self.emit(OrchestrationEvent::WorkflowStarted {
            query: initial_query.to_string(),
            max_turns,
            primary_agent: researcher_id.clone(),
            secondary_agent: synthesizer_id.clone(),
        })
        .await;

        let seed = ProtocolMessage::new(Role::User, initial_query, HUMAN_AUTHOR)
            .with_metadata(TYPE_KEY, "query");
        self.record_message(seed.clone());
        if let Some(researcher) = self.agents.get_mut(&researcher_id) {
            researcher.add_message(seed).await;
        }
        self.transition(WorkflowState::Seeded).await;

        for turn in 1..=max_turns {
            self.emit(OrchestrationEvent::TurnStarted { turn, max_turns })
                .await;

            self.transition(WorkflowState::Researching).await;
            let research_response = self.produce(&researcher_id).await?;
            let research_id = research_response.id().to_string();
            self.send_message(&researcher_id, &synthesizer_id, research_response)
                .await?;

            let synthesis_instruction = self.synthesis_instruction.clone();
            self.inject_instruction(&synthesizer_id, &synthesis_instruction, vec![research_id])
                .await?;

            self.transition(WorkflowState::Synthesizing).await;
            let synthesis_response = self.produce(&synthesizer_id).await?;
            let synthesis_id = synthesis_response.id().to_string();
            self.send_message(&synthesizer_id, &researcher_id, synthesis_response)
                .await?;

            if turn < max_turns {
                let followup_instruction = self.followup_instruction.clone();
                self.inject_instruction(&researcher_id, &followup_instruction, vec![synthesis_id])
                    .await?;
            }

            self.emit(OrchestrationEvent::TurnCompleted { turn }).await;
        }

        self.transition(WorkflowState::Completed).await;
        self.emit(OrchestrationEvent::WorkflowCompleted {
            turns: max_turns,
            messages_recorded: self.conversation_history.len(),
        })
        .await;

        Ok(self.transcript())
    }

    /// Flatten the global history into transcript entries.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        transcript::flatten(&self.conversation_history, &self.agents)
    }

    /// Write the flattened transcript to `path`, replacing any previous content.
    pub fn save_transcript(&self, path: impl AsRef<Path>) -> Result<(), OrchestrationError> {
        let path = path.as_ref();
        transcript::persist(&self.transcript(), path)?;
        log::info!("Transcript saved to {}", path.display());
        Ok(())
    }

    /// Ask `agent_id` for its next response. Under the fail-round policy the run is aborted
    /// and the state moves to `Completed`.
    async fn produce(&mut self, agent_id: &str) -> Result<ProtocolMessage, OrchestrationError> {
        let agent = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| OrchestrationError::AgentNotFound(agent_id.to_string()))?;
        let agent_name = agent.name.clone();

        match agent.generate_response(None).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.emit(OrchestrationEvent::AgentFailed {
                    agent_id: agent_id.to_string(),
                    agent_name,
                    error: e.to_string(),
                })
                .await;
                self.transition(WorkflowState::Completed).await;
                Err(e.into())
            }
        }
    }

    /// Append a not yet recorded message to the global history. References must point at
    /// already recorded messages.
    fn record_message(&mut self, message: ProtocolMessage) {
        debug_assert!(
            message
                .references()
                .iter()
                .all(|r| self.recorded_ids.contains(r)),
            "message {} references an unrecorded message",
            message.id()
        );
        debug_assert!(
            !self.recorded_ids.contains(message.id()),
            "message {} recorded twice",
            message.id()
        );
        self.recorded_ids.insert(message.id().to_string());
        self.conversation_history.push(message);
    }

    async fn transition(&mut self, to: WorkflowState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        self.emit(OrchestrationEvent::StateChanged { from, to }).await;
    }

    async fn emit(&self, event: OrchestrationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_orchestration_event(&event).await;
        }
    }
}
