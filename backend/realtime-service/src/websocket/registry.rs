use super::{SessionId, UserId};
use std::collections::HashMap;

/// Connection registry: which live session belongs to which user
///
/// At most one session per user (the most recent authentication wins) and at most
/// one user per session. `by_user` and `by_session` are always inverses of each other.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_user: HashMap<UserId, SessionId>,
    by_session: HashMap<SessionId, UserId>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `user_id` to `session_id`, overwriting any earlier session for that user.
    ///
    /// Returns the session that was superseded, if any. A session that re-authenticates
    /// as a different user releases its previous user.
    pub fn register(&mut self, user_id: UserId, session_id: SessionId) -> Option<SessionId> {
        if let Some(previous_user) = self.by_session.remove(&session_id) {
            if previous_user != user_id {
                self.by_user.remove(&previous_user);
            }
        }

        let superseded = self
            .by_user
            .insert(user_id.clone(), session_id)
            .filter(|old| *old != session_id);
        if let Some(old) = superseded {
            self.by_session.remove(&old);
        }

        self.by_session.insert(session_id, user_id);
        superseded
    }

    pub fn lookup(&self, user_id: &UserId) -> Option<SessionId> {
        self.by_user.get(user_id).copied()
    }

    /// Remove the entry owned by `session_id`, returning the user it belonged to.
    ///
    /// A session that was already superseded owns nothing, so this never removes a newer
    /// session registered for the same user.
    pub fn remove(&mut self, session_id: SessionId) -> Option<UserId> {
        let user_id = self.by_session.remove(&session_id)?;
        if self.by_user.get(&user_id) == Some(&session_id) {
            self.by_user.remove(&user_id);
        }
        Some(user_id)
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &UserId> {
        self.by_user.keys()
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ConnectionRegistry::new();
        let (s1, s2) = (SessionId::new(), SessionId::new());

        assert_eq!(registry.register(user("u1"), s1), None);
        assert_eq!(registry.register(user("u1"), s2), Some(s1));

        assert_eq!(registry.lookup(&user("u1")), Some(s2));
        assert_eq!(registry.len(), 1);
        // The superseded session no longer owns anything
        assert_eq!(registry.remove(s1), None);
        assert_eq!(registry.lookup(&user("u1")), Some(s2));
    }

    #[test]
    fn test_remove_after_register() {
        let mut registry = ConnectionRegistry::new();
        let session = SessionId::new();

        registry.register(user("u1"), session);
        assert_eq!(registry.remove(session), Some(user("u1")));

        assert_eq!(registry.lookup(&user("u1")), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_session_is_noop() {
        let mut registry = ConnectionRegistry::new();
        let (s1, s2) = (SessionId::new(), SessionId::new());
        registry.register(user("u1"), s1);
        registry.register(user("u2"), s2);

        assert_eq!(registry.remove(SessionId::new()), None);

        assert_eq!(registry.lookup(&user("u1")), Some(s1));
        assert_eq!(registry.lookup(&user("u2")), Some(s2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_removing_superseded_session_keeps_newer_one() {
        let mut registry = ConnectionRegistry::new();
        let (old, new) = (SessionId::new(), SessionId::new());

        registry.register(user("u1"), old);
        registry.register(user("u1"), new);

        assert_eq!(registry.remove(old), None);
        assert_eq!(registry.lookup(&user("u1")), Some(new));
    }

    #[test]
    fn test_repeated_remove_is_noop() {
        let mut registry = ConnectionRegistry::new();
        let (a, b) = (SessionId::new(), SessionId::new());

        registry.register(user("u1"), a);
        registry.remove(a);
        registry.register(user("u1"), b);

        // Late duplicate close for the first connection
        assert_eq!(registry.remove(a), None);
        assert_eq!(registry.lookup(&user("u1")), Some(b));
    }

    #[test]
    fn test_reauthenticate_same_session_as_other_user() {
        let mut registry = ConnectionRegistry::new();
        let session = SessionId::new();

        registry.register(user("u1"), session);
        assert_eq!(registry.register(user("u2"), session), None);

        assert_eq!(registry.lookup(&user("u1")), None);
        assert_eq!(registry.lookup(&user("u2")), Some(session));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove(session), Some(user("u2")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reauthenticate_same_user_same_session() {
        let mut registry = ConnectionRegistry::new();
        let session = SessionId::new();

        registry.register(user("u1"), session);
        assert_eq!(registry.register(user("u1"), session), None);
        assert_eq!(registry.lookup(&user("u1")), Some(session));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_user_ids_lists_registered_users() {
        let mut registry = ConnectionRegistry::new();
        registry.register(user("u1"), SessionId::new());
        registry.register(user("u2"), SessionId::new());

        let mut ids: Vec<&str> = registry.user_ids().map(UserId::as_str).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["u1", "u2"]);
    }
}
