use crate::relay::protocol::ProtocolMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A ClientWrapper is a wrapper around a specific cloud LLM service.
/// It provides a common interface to interact with the LLMs.
/// It does not keep track of the conversation, for that we use an [`Agent`](crate::Agent)
/// which owns the protocol message log and uses a ClientWrapper to interact with the LLM.
// src/relay/client_wrapper

/// Represents the possible roles for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // a message sent by a human user, or an instruction injected by the orchestrator
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI compatible chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to an LLM.
///
/// Only the conversational fields travel to the backend; protocol metadata such as ids and
/// references stays on the [`ProtocolMessage`] side.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: Arc<str>,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: Arc::from(content),
        }
    }
}

/// Error type returned across the backend boundary.
pub type ClientError = Box<dyn Error + Send + Sync>;

/// Trait defining the interface to interact with various LLM services.
///
/// This is the whole backend contract an agent depends on: format its log into
/// role/content pairs, then complete them into a single new message.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send the formatted history to the LLM and get a response.
    /// A failure is always an `Err`, never an empty message.
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError>;

    /// Model identifier injected into each request.
    fn model_name(&self) -> &str;

    /// Provider label used in diagnostics (e.g. `"OpenAI"`, `"Groq"`).
    fn provider_name(&self) -> &str {
        "LLM"
    }

    /// Convert an agent's protocol log into the role/content pairs sent to the backend.
    /// Log order is preserved and nothing but role and content is exposed.
    fn format_history(&self, log: &[ProtocolMessage]) -> Vec<Message> {
        log.iter()
            .map(|msg| Message::new(msg.role(), msg.content()))
            .collect()
    }

    /// Hook to retrieve usage from the *last* send_message() call.
    /// Default impl reads `usage_slot()` so wrappers only need to expose their slot.
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        // ClientWrapper implementations supporting TokenUsage tracking should return their slot here.
        None
    }
}
