use crate::websocket::{NotificationDispatcher, NotificationHub, SessionSettings};
use actix::Addr;

/// Shared by every worker. The hub is started once per process and lives until the
/// actor system shuts down.
#[derive(Clone)]
pub struct AppState {
    pub hub: Addr<NotificationHub>,
    pub dispatcher: NotificationDispatcher,
    pub session_settings: SessionSettings,
}

impl AppState {
    pub fn new(hub: Addr<NotificationHub>, session_settings: SessionSettings) -> Self {
        Self {
            dispatcher: NotificationDispatcher::new(hub.clone()),
            hub,
            session_settings,
        }
    }
}
