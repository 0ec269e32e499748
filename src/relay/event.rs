//! Agent and Orchestrator event system.
//!
//! Provides a callback-based observability layer for agents and the orchestrator.
//! Implement [`EventHandler`] to receive real-time notifications about:
//!
//! - **Backend round-trips**: when an agent asks its LLM for a response and when it returns
//! - **Backend failures**: calls that were degraded into conversation content
//! - **Routing**: messages handed from one agent to the other and instructions injected by
//!   the orchestrator
//! - **Workflow lifecycle**: run start/end, turn boundaries and state transitions
//!
//! Both trait methods have default no-op implementations, so you only override what you
//! care about. The handler is wrapped in `Arc<dyn EventHandler>`; when registered on an
//! [`Orchestrator`](crate::orchestrator::Orchestrator) via
//! [`with_event_handler`](crate::orchestrator::Orchestrator::with_event_handler) it is
//! propagated to both agents.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_relay::event::{AgentEvent, EventHandler, OrchestrationEvent};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl EventHandler for MyHandler {
//!     async fn on_agent_event(&self, event: &AgentEvent) {
//!         if let AgentEvent::ResponseStarted { agent_name, .. } = event {
//!             println!("[{} thinking...]", agent_name);
//!         }
//!     }
//!     async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
//!         println!("Orchestrator: {:?}", event);
//!     }
//! }
//! ```

use crate::relay::client_wrapper::TokenUsage;
use crate::relay::orchestrator::WorkflowState;
use async_trait::async_trait;

/// Number of characters of a response shown by [`LoggingEventHandler`].
pub const PREVIEW_CHARS: usize = 150;

/// Events emitted by an [`Agent`](crate::Agent).
///
/// Every variant carries `agent_id` and `agent_name` so handlers can identify
/// the source agent without external state.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Fired before the backend is called from
    /// [`Agent::generate_response`](crate::Agent::generate_response).
    ResponseStarted {
        agent_id: String,
        agent_name: String,
        /// Number of messages in the log that will be formatted for the backend.
        history_len: usize,
    },

    /// Fired after a response message was appended to the agent's log.
    ResponseCompleted {
        agent_id: String,
        agent_name: String,
        message_id: String,
        /// Token usage reported by the backend, or `None` if the provider did not report it.
        tokens_used: Option<TokenUsage>,
        /// Character length of the response text.
        response_length: usize,
        /// First [`PREVIEW_CHARS`] characters of the response.
        preview: String,
    },

    /// The backend call failed. Under the default policy the error text becomes the
    /// response content and a `ResponseCompleted` follows.
    BackendFailed {
        agent_id: String,
        agent_name: String,
        error: String,
    },

    /// A message produced elsewhere was appended to this agent's log.
    MessageReceived {
        agent_id: String,
        agent_name: String,
        message_id: String,
        author_id: String,
    },
}

/// Events emitted by the [`Orchestrator`](crate::orchestrator::Orchestrator) during a run.
#[derive(Debug, Clone)]
pub enum OrchestrationEvent {
    /// Emitted once at the top of `run_workflow`, before the seed message is recorded.
    WorkflowStarted {
        query: String,
        max_turns: usize,
        primary_agent: String,
        secondary_agent: String,
    },

    /// The workflow moved to a new state.
    StateChanged {
        from: WorkflowState,
        to: WorkflowState,
    },

    /// A new turn is beginning (1-based).
    TurnStarted { turn: usize, max_turns: usize },

    /// A message was recorded centrally and appended to the recipient's log.
    MessageRouted {
        from_agent: String,
        to_agent: String,
        message_id: String,
    },

    /// An orchestrator-authored message was recorded and appended to an agent's log.
    InstructionInjected {
        to_agent: String,
        message_id: String,
        content: String,
    },

    /// A turn has completed (1-based, matching `TurnStarted`).
    TurnCompleted { turn: usize },

    /// The run finished; `messages_recorded` is the final global history length.
    WorkflowCompleted {
        turns: usize,
        messages_recorded: usize,
    },

    /// An agent failed under the fail-round policy and the run was aborted.
    AgentFailed {
        agent_id: String,
        agent_name: String,
        error: String,
    },
}

/// Callback trait for receiving real-time agent and orchestration events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_agent_event(&self, _event: &AgentEvent) {}

    async fn on_orchestration_event(&self, _event: &OrchestrationEvent) {}
}

/// Event handler that reports progress through the `log` facade.
///
/// This is what the `agent-relay` binary installs: turn banners, "thinking" markers and
/// short response previews at `info`, routing details at `debug`, failures at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn on_agent_event(&self, event: &AgentEvent) {
        match event {
            AgentEvent::ResponseStarted { agent_name, .. } => {
                log::info!("[{} thinking...]", agent_name);
            }
            AgentEvent::ResponseCompleted {
                agent_name,
                preview,
                response_length,
                ..
            } => {
                if *response_length > preview.chars().count() {
                    log::info!("[{}]: {}...", agent_name, preview);
                } else {
                    log::info!("[{}]: {}", agent_name, preview);
                }
            }
            AgentEvent::BackendFailed {
                agent_name, error, ..
            } => {
                log::warn!("{} backend call failed: {}", agent_name, error);
            }
            AgentEvent::MessageReceived {
                agent_name,
                message_id,
                author_id,
                ..
            } => {
                log::debug!("{} received {} from {}", agent_name, message_id, author_id);
            }
        }
    }

    async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
        match event {
            OrchestrationEvent::WorkflowStarted {
                query, max_turns, ..
            } => {
                log::info!("Starting workflow with query: {} ({} turns)", query, max_turns);
            }
            OrchestrationEvent::TurnStarted { turn, .. } => {
                log::info!("--- Turn {} ---", turn);
            }
            OrchestrationEvent::WorkflowCompleted {
                turns,
                messages_recorded,
            } => {
                log::info!(
                    "Workflow completed after {} turns, {} messages recorded",
                    turns,
                    messages_recorded
                );
            }
            OrchestrationEvent::AgentFailed {
                agent_name, error, ..
            } => {
                log::error!("{} failed, aborting run: {}", agent_name, error);
            }
            other => log::debug!("{:?}", other),
        }
    }
}

/// Truncate `text` to at most `max_chars` characters on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo wörld", 4), "héll");
        assert_eq!(preview("short", 150), "short");
    }
}
