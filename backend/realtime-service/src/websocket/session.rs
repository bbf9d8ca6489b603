/// WebSocket session actor
///
/// One actor per accepted connection. The connection moves through
/// `Connected -> Authenticated -> Closed`; the hub is told about each step.
use super::hub::{Authenticate, Connect, Disconnect, Emit, NotificationHub};
use super::messages::{ClientEvent, ServerEvent};
use super::{SessionId, UserId};
use actix::prelude::*;
use actix_web_actors::ws;
use std::time::{Duration, Instant};

// ============================================================================
// Connection state machine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport is open, no user bound yet
    Connected,
    /// Registered for this user
    Authenticated(UserId),
    /// Terminal
    Closed,
}

impl ConnectionState {
    /// Bind the connection to `user_id`. Re-authentication replaces the user.
    /// Returns `false` once closed.
    pub fn authenticate(&mut self, user_id: UserId) -> bool {
        if self.is_closed() {
            return false;
        }
        *self = ConnectionState::Authenticated(user_id);
        true
    }

    /// Returns `true` when this call closed the connection.
    pub fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        *self = ConnectionState::Closed;
        true
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            ConnectionState::Authenticated(user_id) => Some(user_id),
            _ => None,
        }
    }
}

// ============================================================================
// Session actor
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// How often the server pings the client
    pub heartbeat_interval: Duration,
    /// Close the connection when no ping/pong arrived for this long
    pub client_timeout: Duration,
    /// Largest accepted frame, in bytes
    pub max_frame_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            client_timeout: Duration::from_secs(30),
            max_frame_size: 256 * 1024,
        }
    }
}

pub struct WsSession {
    id: SessionId,
    state: ConnectionState,
    hb: Instant,
    settings: SessionSettings,
    hub: Addr<NotificationHub>,
}

impl WsSession {
    pub fn new(hub: Addr<NotificationHub>, settings: SessionSettings) -> Self {
        Self {
            id: SessionId::new(),
            state: ConnectionState::Connected,
            hb: Instant::now(),
            settings,
            hub,
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let settings = self.settings;
        ctx.run_interval(settings.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > settings.client_timeout {
                tracing::warn!(
                    session_id = %act.id,
                    "WebSocket heartbeat failed, disconnecting"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match ClientEvent::parse(text) {
            Ok(ClientEvent::Authenticate(user_id)) => self.authenticate(user_id, ctx),
            Err(e) => {
                tracing::debug!(session_id = %self.id, reason = %e, "Ignoring client frame");
            }
        }
    }

    fn authenticate(&mut self, user_id: UserId, ctx: &mut ws::WebsocketContext<Self>) {
        if self.state.is_closed() {
            return;
        }

        // Hold other frames until the hub has applied the registration so the
        // acknowledgment is never sent ahead of it.
        self.hub
            .send(Authenticate {
                session_id: self.id,
                user_id: user_id.clone(),
            })
            .into_actor(self)
            .then(move |res, act, ctx| {
                match res {
                    Ok(true) => {
                        if act.state.authenticate(user_id.clone()) {
                            tracing::info!(
                                session_id = %act.id,
                                user_id = %user_id,
                                "WebSocket session authenticated"
                            );
                            send_event(ctx, &ServerEvent::authenticated(&user_id));
                        }
                    }
                    Ok(false) => {
                        tracing::debug!(session_id = %act.id, "Session already released by hub");
                    }
                    Err(e) => {
                        tracing::error!(
                            session_id = %act.id,
                            error = %e,
                            "Notification hub unavailable, authentication dropped"
                        );
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }
}

fn send_event(ctx: &mut ws::WebsocketContext<WsSession>, event: &ServerEvent) {
    match event.to_json() {
        Ok(json) => ctx.text(json),
        Err(e) => tracing::warn!(event = %event.event, error = %e, "Failed to serialize event"),
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!(session_id = %self.id, "WebSocket session started");

        self.hb(ctx);

        self.hub.do_send(Connect {
            session_id: self.id,
            recipient: ctx.address().recipient(),
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            session_id = %self.id,
            user_id = ?self.state.user_id(),
            "WebSocket session stopped"
        );

        if self.state.close() {
            self.hub.do_send(Disconnect {
                session_id: self.id,
            });
        }
    }
}

impl Handler<Emit> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Emit, ctx: &mut Self::Context) {
        send_event(ctx, &msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                // The connection stays up unless the transport itself ends the stream.
                tracing::warn!(session_id = %self.id, error = %e, "WebSocket protocol error");
                return;
            }
        };

        match msg {
            ws::Message::Ping(bytes) => {
                self.hb = Instant::now();
                ctx.pong(&bytes);
            }
            ws::Message::Pong(_) => {
                self.hb = Instant::now();
            }
            ws::Message::Text(text) => {
                self.hb = Instant::now();
                self.handle_text(&text, ctx);
            }
            ws::Message::Binary(_) => {
                tracing::warn!(session_id = %self.id, "Binary WebSocket messages not supported");
            }
            ws::Message::Continuation(_) => {
                tracing::warn!(session_id = %self.id, "Continuation frames not supported");
            }
            ws::Message::Close(reason) => {
                tracing::debug!(session_id = %self.id, ?reason, "WebSocket close received");
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Nop => {}
        }
    }
}
