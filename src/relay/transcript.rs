//! Transcript export.
//!
//! Flattens the orchestrator's global history into [`TranscriptEntry`] records and writes
//! them as a pretty-printed JSON array:
//!
//! ```json
//! [
//!   {
//!     "agent": "Human",
//!     "role": "user",
//!     "content": "What is quantum entanglement?",
//!     "message_id": "msg_5d41402abc",
//!     "references": [],
//!     "timestamp": 1745590320.5
//!   }
//! ]
//! ```

use crate::relay::agent::Agent;
use crate::relay::client_wrapper::Role;
use crate::relay::protocol::{ProtocolMessage, HUMAN_AUTHOR, ORCHESTRATOR_AUTHOR};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Display name used for messages authored by `"human"`.
pub const HUMAN_DISPLAY_NAME: &str = "Human";
/// Display name used for messages authored by `"orchestrator"`.
pub const ORCHESTRATOR_DISPLAY_NAME: &str = "Orchestrator";

/// One flattened history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Display name of the author.
    pub agent: String,
    pub role: Role,
    pub content: String,
    pub message_id: String,
    pub references: Vec<String>,
    pub timestamp: f64,
}

/// Failure to write or read a transcript file.
#[derive(Debug)]
pub enum TranscriptError {
    Io { path: PathBuf, source: io::Error },
    Serialization(serde_json::Error),
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptError::Io { path, source } => {
                write!(f, "Transcript I/O error at {}: {}", path.display(), source)
            }
            TranscriptError::Serialization(e) => write!(f, "Transcript serialization error: {}", e),
        }
    }
}

impl Error for TranscriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TranscriptError::Io { source, .. } => Some(source),
            TranscriptError::Serialization(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for TranscriptError {
    fn from(e: serde_json::Error) -> Self {
        TranscriptError::Serialization(e)
    }
}

/// Resolve the display name for `author_id`.
///
/// The human and orchestrator sentinels win over the registry, then registered agents,
/// then the raw id.
pub fn display_name(author_id: &str, agents: &HashMap<String, Agent>) -> String {
    match author_id {
        HUMAN_AUTHOR => HUMAN_DISPLAY_NAME.to_string(),
        ORCHESTRATOR_AUTHOR => ORCHESTRATOR_DISPLAY_NAME.to_string(),
        other => agents
            .get(other)
            .map(|agent| agent.name.clone())
            .unwrap_or_else(|| other.to_string()),
    }
}

/// Flatten `history` into transcript entries, preserving order.
pub fn flatten(history: &[ProtocolMessage], agents: &HashMap<String, Agent>) -> Vec<TranscriptEntry> {
    history
        .iter()
        .map(|msg| TranscriptEntry {
            agent: display_name(msg.author_id(), agents),
            role: msg.role(),
            content: msg.content().to_string(),
            message_id: msg.id().to_string(),
            references: msg.references().to_vec(),
            timestamp: msg.timestamp(),
        })
        .collect()
}

/// Write `entries` to `path` as a JSON array, truncating any existing file.
pub fn persist(entries: &[TranscriptEntry], path: &Path) -> Result<(), TranscriptError> {
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json).map_err(|source| TranscriptError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a transcript previously written by [`persist`].
pub fn load(path: &Path) -> Result<Vec<TranscriptEntry>, TranscriptError> {
    let contents = fs::read_to_string(path).map_err(|source| TranscriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Last entry attributed to `agent_name`, if any.
pub fn final_entry_by<'a>(entries: &'a [TranscriptEntry], agent_name: &str) -> Option<&'a TranscriptEntry> {
    entries.iter().rev().find(|entry| entry.agent == agent_name)
}
