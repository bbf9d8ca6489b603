/// Notification dispatcher
///
/// In-process entry point for the HTTP API layer. Delivery is best effort: events for
/// users without a live session are dropped, nothing is queued or retried, and callers
/// get no delivery signal.
use super::hub::{Broadcast, NotificationHub, NotifyUser};
use super::{ServerEvent, UserId};
use actix::Addr;
use serde::Serialize;

#[derive(Clone)]
pub struct NotificationDispatcher {
    hub: Addr<NotificationHub>,
}

impl NotificationDispatcher {
    pub fn new(hub: Addr<NotificationHub>) -> Self {
        Self { hub }
    }

    /// Push `event` to the session `user_id` last authenticated on, if any.
    pub fn notify_user<T>(&self, user_id: &UserId, event: &str, payload: &T)
    where
        T: Serialize + ?Sized,
    {
        let Some(event) = build_event(event, payload) else {
            return;
        };
        self.hub.do_send(NotifyUser {
            user_id: user_id.clone(),
            event,
        });
    }

    /// Push `event` to every live session, authenticated or not.
    pub fn broadcast<T>(&self, event: &str, payload: &T)
    where
        T: Serialize + ?Sized,
    {
        let Some(event) = build_event(event, payload) else {
            return;
        };
        self.hub.do_send(Broadcast { event });
    }
}

fn build_event<T>(name: &str, payload: &T) -> Option<ServerEvent>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(payload) {
        Ok(data) => Some(ServerEvent::new(name, data)),
        Err(e) => {
            tracing::warn!(
                event = name,
                error = %e,
                "Dropping notification with unserializable payload"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::hub::{Authenticate, Connect, Stats};
    use crate::websocket::test_support::{Collector, Received};
    use crate::websocket::SessionId;
    use actix::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;

    async fn connected_session(
        hub: &Addr<NotificationHub>,
        user: Option<&str>,
    ) -> Addr<Collector> {
        let session_id = SessionId::new();
        let collector = Collector::default().start();
        hub.send(Connect {
            session_id,
            recipient: collector.clone().recipient(),
        })
        .await
        .unwrap();
        if let Some(user) = user {
            hub.send(Authenticate {
                session_id,
                user_id: UserId::parse(user).unwrap(),
            })
            .await
            .unwrap();
        }
        collector
    }

    /// Dispatches are fire-and-forget; a round trip to the hub flushes them.
    async fn flush(hub: &Addr<NotificationHub>) {
        hub.send(Stats).await.unwrap();
    }

    #[actix_rt::test]
    async fn test_notify_user_delivers_payload() {
        let hub = NotificationHub::new().start();
        let dispatcher = NotificationDispatcher::new(hub.clone());
        let collector = connected_session(&hub, Some("u1")).await;

        dispatcher.notify_user(
            &UserId::parse("u1").unwrap(),
            "transactionCreated",
            &json!({ "id": "t-1", "amount": -20.0, "category": "Dining" }),
        );
        flush(&hub).await;

        let received = collector.send(Received).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].event, "transactionCreated");
        assert_eq!(received[0].data["category"], "Dining");
    }

    #[actix_rt::test]
    async fn test_notify_unregistered_user_emits_nothing() {
        let hub = NotificationHub::new().start();
        let dispatcher = NotificationDispatcher::new(hub.clone());
        let anonymous = connected_session(&hub, None).await;
        let other = connected_session(&hub, Some("u2")).await;

        dispatcher.notify_user(&UserId::parse("u1").unwrap(), "transactionCreated", &json!({}));
        flush(&hub).await;

        assert!(anonymous.send(Received).await.unwrap().is_empty());
        assert!(other.send(Received).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_broadcast_emits_once_per_session() {
        let hub = NotificationHub::new().start();
        let dispatcher = NotificationDispatcher::new(hub.clone());
        let sessions = vec![
            connected_session(&hub, Some("u1")).await,
            connected_session(&hub, None).await,
            connected_session(&hub, Some("u2")).await,
            connected_session(&hub, None).await,
        ];

        dispatcher.broadcast("categoriesUpdated", &json!({ "count": 12 }));
        flush(&hub).await;

        let mut total = 0;
        for session in sessions {
            let received = session.send(Received).await.unwrap();
            assert_eq!(received.len(), 1);
            total += received.len();
        }
        assert_eq!(total, 4);
    }

    #[actix_rt::test]
    async fn test_notifications_keep_call_order() {
        let hub = NotificationHub::new().start();
        let dispatcher = NotificationDispatcher::new(hub.clone());
        let collector = connected_session(&hub, Some("u1")).await;
        let user = UserId::parse("u1").unwrap();

        for seq in 0..5 {
            dispatcher.notify_user(&user, "balanceChanged", &json!({ "seq": seq }));
        }
        flush(&hub).await;

        let seqs: Vec<i64> = collector
            .send(Received)
            .await
            .unwrap()
            .iter()
            .map(|evt| evt.data["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[actix_rt::test]
    async fn test_unserializable_payload_is_dropped() {
        let hub = NotificationHub::new().start();
        let dispatcher = NotificationDispatcher::new(hub.clone());
        let collector = connected_session(&hub, Some("u1")).await;

        // JSON object keys must be strings
        let mut payload = HashMap::new();
        payload.insert((1, 2), "bad key");
        dispatcher.notify_user(&UserId::parse("u1").unwrap(), "broken", &payload);
        dispatcher.broadcast("broken", &payload);
        flush(&hub).await;

        assert!(collector.send(Received).await.unwrap().is_empty());
    }
}
