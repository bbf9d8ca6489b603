/// Real-time notification system
///
/// Architecture:
/// 1. ConnectionRegistry: maps a user to the single live session it authenticated on
/// 2. NotificationHub: actor owning the registry and every live session's mailbox
/// 3. NotificationDispatcher: in-process handle used to push events to users
/// 4. WsSession: one actor per WebSocket connection (connect, authenticate, close)
pub mod dispatcher;
pub mod hub;
pub mod messages;
pub mod registry;
pub mod session;

pub use dispatcher::NotificationDispatcher;
pub use hub::NotificationHub;
pub use messages::ServerEvent;
pub use registry::ConnectionRegistry;
pub use session::{ConnectionState, SessionSettings, WsSession};

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to each accepted WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

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

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque user identity supplied by the client when it authenticates
///
/// Always non-empty; surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
