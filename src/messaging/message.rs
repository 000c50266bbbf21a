//! # Message Envelope
//!
//! Minimal request/response envelope exchanged with the host's message hub.
//! Framing, protocol versioning and routing stay with the transport; the
//! orchestrator only needs the correlation id and the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound message delivered by the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMessage {
    /// Correlation id assigned by the sender
    pub id: String,
    #[serde(default)]
    pub body: Value,
}

impl FleetMessage {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// The `type` field of the body, if present
    pub fn message_type(&self) -> Option<&str> {
        self.body.get("type").and_then(Value::as_str)
    }
}

/// Response correlated to an inbound [`FleetMessage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetResponse {
    pub in_response_to: String,
    pub body: Value,
    pub created_at: DateTime<Utc>,
}

impl FleetResponse {
    pub fn in_response_to(message: &FleetMessage, body: Value) -> Self {
        Self {
            in_response_to: message.id.clone(),
            body,
            created_at: Utc::now(),
        }
    }
}
