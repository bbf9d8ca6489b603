/// Notification hub
///
/// Single owner of the connection registry and of the mailbox of every live session.
/// Connect, authenticate, disconnect, lookups and dispatches are all messages to this
/// actor, so the registry is only ever touched by one handler at a time.
use super::{ConnectionRegistry, ServerEvent, SessionId, UserId};
use crate::metrics;
use actix::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Push an event to one session
#[derive(Message)]
#[rtype(result = "()")]
pub struct Emit(pub ServerEvent);

/// New transport connection, not yet authenticated
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub session_id: SessionId,
    pub recipient: Recipient<Emit>,
}

/// Transport connection closed
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub session_id: SessionId,
}

/// Bind a live session to a user. Replies `false` when the session is no longer live.
#[derive(Message)]
#[rtype(result = "bool")]
pub struct Authenticate {
    pub session_id: SessionId,
    pub user_id: UserId,
}

#[derive(Message)]
#[rtype(result = "Option<SessionId>")]
pub struct Lookup {
    pub user_id: UserId,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct NotifyUser {
    pub user_id: UserId,
    pub event: ServerEvent,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Broadcast {
    pub event: ServerEvent,
}

#[derive(Message)]
#[rtype(result = "HubStats")]
pub struct Stats;

#[derive(Message)]
#[rtype(result = "Vec<UserId>")]
pub struct ConnectedUsers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub active_sessions: usize,
    pub authenticated_users: usize,
}

#[derive(Default)]
pub struct NotificationHub {
    registry: ConnectionRegistry,
    sessions: HashMap<SessionId, Recipient<Emit>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn stats(&self) -> HubStats {
        HubStats {
            active_sessions: self.sessions.len(),
            authenticated_users: self.registry.len(),
        }
    }

    fn update_gauges(&self) {
        let stats = self.stats();
        metrics::set_connection_gauges(stats.active_sessions, stats.authenticated_users);
    }
}

impl Actor for NotificationHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Notification hub started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            sessions = self.sessions.len(),
            "Notification hub stopped, dropping live sessions"
        );
    }
}

impl Handler<Connect> for NotificationHub {
    type Result = ();

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) {
        self.sessions.insert(msg.session_id, msg.recipient);
        tracing::debug!(
            session_id = %msg.session_id,
            active_sessions = self.sessions.len(),
            "Session connected"
        );
        self.update_gauges();
    }
}

impl Handler<Disconnect> for NotificationHub {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) {
        let was_live = self.sessions.remove(&msg.session_id).is_some();
        let released = self.registry.remove(msg.session_id);

        match released {
            Some(user_id) => tracing::debug!(
                session_id = %msg.session_id,
                user_id = %user_id,
                "Session disconnected, user released"
            ),
            None if was_live => tracing::debug!(
                session_id = %msg.session_id,
                "Session disconnected"
            ),
            None => tracing::debug!(
                session_id = %msg.session_id,
                "Ignoring disconnect for unknown session"
            ),
        }
        self.update_gauges();
    }
}

impl Handler<Authenticate> for NotificationHub {
    type Result = bool;

    fn handle(&mut self, msg: Authenticate, _ctx: &mut Self::Context) -> bool {
        if !self.sessions.contains_key(&msg.session_id) {
            return false;
        }

        if let Some(superseded) = self.registry.register(msg.user_id.clone(), msg.session_id) {
            tracing::debug!(
                user_id = %msg.user_id,
                superseded = %superseded,
                session_id = %msg.session_id,
                "User re-authenticated on a new session"
            );
        }
        self.update_gauges();
        true
    }
}

impl Handler<Lookup> for NotificationHub {
    type Result = Option<SessionId>;

    fn handle(&mut self, msg: Lookup, _ctx: &mut Self::Context) -> Self::Result {
        self.registry.lookup(&msg.user_id)
    }
}

impl Handler<NotifyUser> for NotificationHub {
    type Result = ();

    fn handle(&mut self, msg: NotifyUser, _ctx: &mut Self::Context) {
        let recipient = self
            .registry
            .lookup(&msg.user_id)
            .and_then(|session_id| self.sessions.get(&session_id));

        match recipient {
            Some(recipient) => {
                recipient.do_send(Emit(msg.event));
                metrics::record_delivered(1);
            }
            None => {
                tracing::debug!(
                    user_id = %msg.user_id,
                    event = %msg.event.event,
                    "User offline, dropping notification"
                );
                metrics::record_dropped();
            }
        }
    }
}

impl Handler<Broadcast> for NotificationHub {
    type Result = ();

    fn handle(&mut self, msg: Broadcast, _ctx: &mut Self::Context) {
        for recipient in self.sessions.values() {
            recipient.do_send(Emit(msg.event.clone()));
        }
        metrics::record_delivered(self.sessions.len());
    }
}

impl Handler<Stats> for NotificationHub {
    type Result = MessageResult<Stats>;

    fn handle(&mut self, _msg: Stats, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.stats())
    }
}

impl Handler<ConnectedUsers> for NotificationHub {
    type Result = MessageResult<ConnectedUsers>;

    fn handle(&mut self, _msg: ConnectedUsers, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.registry.user_ids().cloned().collect())
    }
}
