//! Agent System
//!
//! This module provides the [`Agent`] struct: one participant's private, ordered view of the
//! conversation plus the ability to produce the next message through a backend
//! [`ClientWrapper`].
//!
//! # Log layout
//!
//! Position 0 of every agent's log is its system directive. Everything after it is appended
//! in arrival order: messages routed from the other agent, instructions injected by the
//! orchestrator, optional prompts passed to [`Agent::generate_response`], and the agent's own
//! responses. No alternation of roles is enforced.
//!
//! # Backend failures
//!
//! By default a failed backend call does not abort anything: the error is turned into an
//! ordinary assistant message (see [`BackendFailurePolicy::DegradeToContent`]). Use
//! [`Agent::with_failure_policy`] to get [`BackendFailurePolicy::FailRound`] instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_relay::Agent;
//! use agent_relay::clients::groq::{GroqClient, Model};
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(GroqClient::new_with_model_enum("key", Model::Llama3_70b8192));
//! let mut agent = Agent::new("researcher_1", "ResearchBot", "information_gatherer", None, client);
//!
//! let reply = agent.generate_response(Some("Summarise the EPR paradox")).await.unwrap();
//! assert_eq!(reply.references().len(), 1);
//! # };
//! ```

use crate::relay::client_wrapper::{ClientWrapper, Message, Role};
use crate::relay::event::{preview, AgentEvent, EventHandler, PREVIEW_CHARS};
use crate::relay::protocol::{ProtocolMessage, HUMAN_AUTHOR, TYPE_KEY};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// What an agent does when its backend call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendFailurePolicy {
    /// Turn the failure into an assistant message carrying the error text, append it like a
    /// normal response and keep the conversation going.
    #[default]
    DegradeToContent,
    /// Return [`AgentError::Backend`] and leave the log as it was before the call, without
    /// the prompt passed to [`Agent::generate_response`].
    FailRound,
}

/// Errors surfaced by [`Agent::generate_response`] under [`BackendFailurePolicy::FailRound`].
#[derive(Debug, Clone)]
pub enum AgentError {
    Backend {
        agent_id: String,
        provider: String,
        message: String,
    },
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Backend {
                agent_id,
                provider,
                message,
            } => write!(
                f,
                "Agent {} failed: Error in {} API call: {}",
                agent_id, provider, message
            ),
        }
    }
}

impl Error for AgentError {}

/// An LLM-backed participant with a stable identity and an append-only message log.
pub struct Agent {
    /// Stable identifier used as `author_id` on everything this agent produces.
    pub id: String,
    /// Human-readable display name used in transcripts and logs.
    pub name: String,
    /// Free-form role label (e.g. `"information_gatherer"`).
    pub role: String,

    messages: Vec<ProtocolMessage>,
    client: Arc<dyn ClientWrapper>,
    failure_policy: BackendFailurePolicy,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Agent {
    /// Create the agent and seed its log with the system directive.
    ///
    /// When `system_prompt` is `None` the directive defaults to
    /// `"You are {name}, an AI assistant with the role of {role}."`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        system_prompt: Option<String>,
        client: Arc<dyn ClientWrapper>,
    ) -> Self {
        let id = id.into();
        let name = name.into();
        let role = role.into();
        let directive = system_prompt.unwrap_or_else(|| default_system_prompt(&name, &role));
        let system_message = ProtocolMessage::new(Role::System, directive, id.as_str())
            .with_metadata(TYPE_KEY, "system_instruction");

        Self {
            id,
            name,
            role,
            messages: vec![system_message],
            client,
            failure_policy: BackendFailurePolicy::default(),
            event_handler: None,
        }
    }

    pub fn with_failure_policy(mut self, policy: BackendFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.event_handler = Some(handler);
    }

    pub fn failure_policy(&self) -> BackendFailurePolicy {
        self.failure_policy
    }

    /// Model name reported by the backend client.
    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// The system directive at log position 0.
    pub fn system_message(&self) -> &ProtocolMessage {
        &self.messages[0]
    }

    /// The full log, system directive first.
    pub fn messages(&self) -> &[ProtocolMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&ProtocolMessage> {
        self.messages.last()
    }

    /// Append a message to this agent's log.
    pub async fn add_message(&mut self, message: ProtocolMessage) {
        self.emit(AgentEvent::MessageReceived {
            agent_id: self.id.clone(),
            agent_name: self.name.clone(),
            message_id: message.id().to_string(),
            author_id: message.author_id().to_string(),
        })
        .await;
        self.messages.push(message);
    }

    /// Role/content view of the log as the backend will see it.
    pub fn format_history(&self) -> Vec<Message> {
        self.client.format_history(&self.messages)
    }

    /// Ask the backend for the next message.
    ///
    /// With a non-empty `prompt`, a user message authored by `"human"` is appended first. The
    /// response references the last log entry when that entry is user-role. Under the
    /// default policy this never returns `Err`.
    pub async fn generate_response(
        &mut self,
        prompt: Option<&str>,
    ) -> Result<ProtocolMessage, AgentError> {
        let log_len = self.messages.len();
        if let Some(prompt) = prompt.filter(|p| !p.is_empty()) {
            let user_msg = ProtocolMessage::new(Role::User, prompt, HUMAN_AUTHOR)
                .with_metadata(TYPE_KEY, "query");
            self.messages.push(user_msg);
        }

        let formatted = self.format_history();
        self.emit(AgentEvent::ResponseStarted {
            agent_id: self.id.clone(),
            agent_name: self.name.clone(),
            history_len: formatted.len(),
        })
        .await;

        let references: Vec<String> = match self.messages.last() {
            Some(last) if last.role() == Role::User => vec![last.id().to_string()],
            _ => Vec::new(),
        };

        let response = match self.client.send_message(&formatted).await {
            Ok(reply) => self
                .create_message(reply.content.to_string())
                .with_references(references),
            Err(err) => {
                let provider = self.client.provider_name().to_string();
                log::warn!(
                    "Agent::generate_response(...): {} backend error for {}: {}",
                    provider,
                    self.id,
                    err
                );
                self.emit(AgentEvent::BackendFailed {
                    agent_id: self.id.clone(),
                    agent_name: self.name.clone(),
                    error: err.to_string(),
                })
                .await;

                match self.failure_policy {
                    BackendFailurePolicy::FailRound => {
                        // Drop the prompt appended above.
                        self.messages.truncate(log_len);
                        return Err(AgentError::Backend {
                            agent_id: self.id.clone(),
                            provider,
                            message: err.to_string(),
                        });
                    }
                    BackendFailurePolicy::DegradeToContent => self
                        .create_message(format!("Error in {} API call: {}", provider, err))
                        .with_references(references)
                        .with_metadata(TYPE_KEY, "backend_error"),
                }
            }
        };

        self.messages.push(response.clone());

        let tokens_used = self.client.get_last_usage().await;
        self.emit(AgentEvent::ResponseCompleted {
            agent_id: self.id.clone(),
            agent_name: self.name.clone(),
            message_id: response.id().to_string(),
            tokens_used,
            response_length: response.content().chars().count(),
            preview: preview(response.content(), PREVIEW_CHARS),
        })
        .await;

        Ok(response)
    }

    /// Assistant message authored by this agent, tagged with its role label.
    fn create_message(&self, content: String) -> ProtocolMessage {
        ProtocolMessage::new(Role::Assistant, content, self.id.as_str())
            .with_metadata("agent_role", self.role.as_str())
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_agent_event(&event).await;
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("model", &self.client.model_name())
            .field("messages", &self.messages.len())
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

/// Directive used when an agent is built without an explicit system prompt.
pub fn default_system_prompt(name: &str, role: &str) -> String {
    format!("You are {}, an AI assistant with the role of {}.", name, role)
}
