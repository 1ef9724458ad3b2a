//! Event types for the session log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a planning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of event that occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// The user prompt a dispatch run started from.
    Prompt { content: String },
    /// A raw model reply, before directive extraction.
    ModelReply { content: String },
    /// The destination was resolved to coordinates.
    Geocoded { place: String, lat: f64, lng: f64 },
    /// A tool was invoked by the model.
    ToolCall {
        name: String,
        args: serde_json::Value,
    },
    /// A tool returned a result (tool failures are recorded the same way,
    /// as an error-shaped output).
    ToolResult {
        name: String,
        output: serde_json::Value,
    },
    /// The terminal outcome of a dispatch run.
    PlanOutcome { outcome: serde_json::Value },
    /// Session started.
    SessionStart,
    /// Session ended.
    SessionEnd,
}

/// An event in the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(session_id: SessionId, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            timestamp: Utc::now(),
            kind,
        }
    }
}
