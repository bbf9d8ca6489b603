/// Wire format for WebSocket frames: `{"event": "<name>", "data": <payload>}`
use super::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const AUTHENTICATE: &str = "authenticate";
pub const AUTHENTICATED: &str = "authenticated";

/// Event pushed from the server to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ServerEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        ServerEvent {
            event: event.into(),
            data,
        }
    }

    /// Acknowledgment sent once a connection is registered for `user_id`
    pub fn authenticated(user_id: &UserId) -> Self {
        ServerEvent::new(
            AUTHENTICATED,
            json!({ "success": true, "userId": user_id }),
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Events a client may send
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Authenticate(UserId),
}

/// Reasons an inbound frame is ignored
#[derive(Debug, Error)]
pub enum InboundError {
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    #[error("authenticate without a usable user id")]
    MissingUserId,

    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

#[derive(Deserialize)]
struct InboundFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ClientEvent {
    pub fn parse(text: &str) -> Result<Self, InboundError> {
        let frame: InboundFrame = serde_json::from_str(text)?;

        match frame.event.as_str() {
            AUTHENTICATE => frame
                .data
                .as_str()
                .and_then(UserId::parse)
                .map(ClientEvent::Authenticate)
                .ok_or(InboundError::MissingUserId),
            _ => Err(InboundError::UnknownEvent(frame.event)),
        }
    }
}
