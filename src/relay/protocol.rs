//! Referenceable protocol messages.
//!
//! A [`ProtocolMessage`] is one unit of dialogue exchanged between the orchestrator and its
//! agents. Besides the conversational `role`/`content` pair that backends understand, every
//! message carries protocol fields: a unique id, the id of the entity that produced it, the ids
//! of earlier messages it responds to, a small metadata bag and a creation timestamp.
//!
//! Messages are values. Once built (and optionally decorated with the consuming `with_*`
//! builders) they expose read-only accessors; changing anything means building a new message.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "role": "assistant",
//!   "content": "Entanglement is ...",
//!   "mcp": {
//!     "message_id": "msg_3fa85f6457",
//!     "agent_id": "researcher_1",
//!     "references": ["msg_0b1c2d3e4f"],
//!     "metadata": {"agent_role": "information_gatherer"},
//!     "timestamp": 1745590320.123456
//!   }
//! }
//! ```
//!
//! The `mcp` block is optional on input. Missing fields fall back to `"unknown"` for the
//! author, a fresh id, empty references and metadata, and the current clock reading.
//!
//! # Example
//!
//! ```rust
//! use agent_relay::protocol::{ProtocolMessage, HUMAN_AUTHOR};
//! use agent_relay::Role;
//!
//! let query = ProtocolMessage::new(Role::User, "What is quantum entanglement?", HUMAN_AUTHOR)
//!     .with_metadata("type", "query");
//!
//! let json = query.to_json().unwrap();
//! let back = ProtocolMessage::from_json(&json).unwrap();
//! assert_eq!(back, query);
//! ```

use crate::relay::client_wrapper::Role;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Author id used for messages typed by the person driving the run.
pub const HUMAN_AUTHOR: &str = "human";
/// Author id used for instructions injected by the orchestrator between turns.
pub const ORCHESTRATOR_AUTHOR: &str = "orchestrator";
/// Author id substituted when a deserialized record carries no protocol block.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Metadata key holding the message classification (`"query"`, `"instruction"`, ...).
pub const TYPE_KEY: &str = "type";

/// Bits of the last timestamp handed out, so clock readings never go backwards.
static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// A scalar metadata value.
///
/// Metadata stays an open extension point (any string key) while values are limited to a
/// closed set of JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value as f64)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Number(value as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Metadata bag attached to every message.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Generate a fresh message id of the form `msg_<10 hex chars>`.
pub fn generate_message_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("msg_{}", &hex[..10])
}

/// Current wall clock in fractional seconds, clamped so successive readings never decrease.
pub fn next_timestamp() -> f64 {
    let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    let mut last = LAST_TIMESTAMP.load(Ordering::Acquire);
    loop {
        let candidate = now.max(f64::from_bits(last));
        match LAST_TIMESTAMP.compare_exchange_weak(
            last,
            candidate.to_bits(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// One unit of dialogue with identity, authorship, content and reference links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MessageRecord", from = "MessageRecord")]
pub struct ProtocolMessage {
    id: String,
    role: Role,
    content: String,
    author_id: String,
    references: Vec<String>,
    metadata: Metadata,
    timestamp: f64,
}

impl ProtocolMessage {
    /// Build a message with a fresh id, no references and no metadata.
    pub fn new(role: Role, content: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            role,
            content: content.into(),
            author_id: author_id.into(),
            references: Vec::new(),
            metadata: Metadata::new(),
            timestamp: next_timestamp(),
        }
    }

    /// Use a caller supplied id instead of the generated one. An empty id is ignored.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !id.is_empty() {
            self.id = id;
        }
        self
    }

    /// Replace the reference list.
    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    /// Append a single reference.
    pub fn with_reference(mut self, id: impl Into<String>) -> Self {
        self.references.push(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// The `"type"` metadata entry, when it is a string.
    pub fn message_type(&self) -> Option<&str> {
        self.metadata.get(TYPE_KEY).and_then(MetadataValue::as_str)
    }

    /// Whether this message lists `id` among its references.
    pub fn responds_to(&self, id: &str) -> bool {
        self.references.iter().any(|r| r == id)
    }

    /// Structured record with the conversational fields and the nested protocol block.
    pub fn to_record(&self) -> MessageRecord {
        self.clone().into()
    }

    /// Inverse of [`to_record`](Self::to_record); absent protocol fields take their defaults.
    pub fn from_record(record: MessageRecord) -> Self {
        record.into()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Serialized shape of a [`ProtocolMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<ProtocolBlock>,
}

/// The protocol metadata block nested under `"mcp"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolBlock {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default = "unknown_author", deserialize_with = "author_or_unknown")]
    pub agent_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub references: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

fn unknown_author() -> String {
    UNKNOWN_AUTHOR.to_string()
}

// `null` reads the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn author_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown_author))
}

impl From<ProtocolMessage> for MessageRecord {
    fn from(msg: ProtocolMessage) -> Self {
        MessageRecord {
            role: msg.role,
            content: msg.content,
            mcp: Some(ProtocolBlock {
                message_id: Some(msg.id),
                agent_id: msg.author_id,
                references: msg.references,
                metadata: msg.metadata,
                timestamp: Some(msg.timestamp),
            }),
        }
    }
}

impl From<MessageRecord> for ProtocolMessage {
    fn from(record: MessageRecord) -> Self {
        let block = record.mcp.unwrap_or_else(|| ProtocolBlock {
            message_id: None,
            agent_id: unknown_author(),
            references: Vec::new(),
            metadata: Metadata::new(),
            timestamp: None,
        });
        ProtocolMessage {
            id: block
                .message_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_message_id),
            role: record.role,
            content: record.content,
            author_id: block.agent_id,
            references: block.references,
            metadata: block.metadata,
            timestamp: block.timestamp.unwrap_or_else(next_timestamp),
        }
    }
}
