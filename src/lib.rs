//! # agent_relay
//!
//! agent_relay coordinates two LLM-backed agents, a researcher and a synthesizer, through a
//! small referenceable message protocol, and records the whole exchange as a JSON transcript.
//!
//! The crate provides layered abstractions for:
//!
//! * **Protocol messages**: [`ProtocolMessage`] values with unique ids, author ids, reference
//!   links to earlier messages, scalar metadata and monotonic timestamps
//! * **Agents**: [`Agent`] holds one participant's ordered view of the conversation and
//!   produces its next message through any [`ClientWrapper`]
//! * **Orchestration**: [`Orchestrator`] runs the bounded researcher → synthesizer turn
//!   protocol, injecting instructions between turns and recording every message once
//! * **Transcripts**: the [`transcript`] module flattens and persists the global history
//! * **Provider Flexibility**: [`ClientWrapper`] is implemented for OpenAI (optionally
//!   through a LiteLLM proxy) and Groq
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use agent_relay::config::{AgentProfile, BackendConfig, BackendKind};
//! use agent_relay::event::LoggingEventHandler;
//! use agent_relay::Orchestrator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     agent_relay::init_logger();
//!
//!     let researcher = AgentProfile::researcher()
//!         .build(BackendConfig::from_env(BackendKind::Groq, None)?.into_client());
//!     let synthesizer = AgentProfile::synthesizer()
//!         .build(BackendConfig::from_env(BackendKind::OpenAI, None)?.into_client());
//!
//!     let mut orchestrator = Orchestrator::new(vec![researcher, synthesizer])?
//!         .with_event_handler(Arc::new(LoggingEventHandler));
//!
//!     orchestrator.run_workflow("What is quantum entanglement?", 3).await?;
//!     orchestrator.save_transcript("mcp_transcript.json")?;
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding agent_relay can opt-in to simple `RUST_LOG` driven diagnostics
/// without having to choose a specific logging backend upfront.
///
/// ```rust
/// agent_relay::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

/// Like [`init_logger`], but uses `default_filter` when `RUST_LOG` is not set.
pub fn init_logger_with_default(default_filter: &str) {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .init();
    });
}

// Import the top-level `relay` module.
pub mod relay;

// Re-exporting key items for easier external access.
pub use relay::agent;
pub use relay::agent::{Agent, AgentError, BackendFailurePolicy};
pub use relay::client_wrapper;
pub use relay::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
pub use relay::clients;
pub use relay::config;
pub use relay::event;
pub use relay::event::{AgentEvent, EventHandler, LoggingEventHandler, OrchestrationEvent};
pub use relay::orchestrator;
pub use relay::orchestrator::{OrchestrationError, Orchestrator, WorkflowState};
pub use relay::protocol;
pub use relay::protocol::{MetadataValue, ProtocolMessage};
pub use relay::transcript;
pub use relay::transcript::{TranscriptEntry, TranscriptError};
