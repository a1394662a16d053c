//! In-memory session registry for the agent endpoint.
//!
//! Sessions key conversational continuity by `(user_id, session_id)`.
//! Entries idle past the TTL are dropped on access, and a least-recently-used
//! entry is evicted when the cap is exceeded, so the registry stays bounded
//! for the life of the process.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use super::agent::Conversation;

/// User identifier applied to every request.
pub const DEFAULT_USER_ID: &str = "user-1";

/// Session identifier used when the request omits one.
///
/// Callers that omit `sessionId` share this session; well-behaved clients
/// send their own generated id.
pub const DEFAULT_SESSION_ID: &str = "default-session";

/// Idle lifetime before a session is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    user_id: String,
    session_id: String,
}

impl SessionKey {
    fn new(user_id: &str, session_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    conversation: Conversation,
    last_used_ms: i64,
    use_seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<SessionKey, SessionEntry>,
    next_seq: u64,
}

/// Bounded in-memory session store.
#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<Inner>,
    ttl_ms: i64,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    /// Create a store with the given idle TTL and session cap.
    #[must_use]
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Resolve a session, creating it on first use.
    ///
    /// Defaults the id to [`DEFAULT_SESSION_ID`] when absent or empty, sweeps
    /// expired entries, bumps the entry's recency, and returns the resolved
    /// id together with a copy of the session's conversation.
    pub fn resolve(
        &self,
        user_id: &str,
        requested: Option<&str>,
        system: &str,
    ) -> (String, Conversation) {
        let session_id = requested
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_SESSION_ID)
            .to_string();
        let key = SessionKey::new(user_id, &session_id);
        let now = Utc::now().timestamp_millis();

        let mut inner = self.inner.lock();
        Self::sweep_expired(&mut inner, now, self.ttl_ms);

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| SessionEntry {
                conversation: Conversation::with_system(system),
                last_used_ms: now,
                use_seq: seq,
            });
        entry.last_used_ms = now;
        entry.use_seq = seq;
        let conversation = entry.conversation.clone();

        Self::evict_over_cap(&mut inner, &key, self.max_sessions);

        (session_id, conversation)
    }

    /// Write a session's conversation back after a completed reply.
    ///
    /// Reinserts the entry if it was evicted in the meantime; concurrent
    /// commits on the same key are last-write-wins.
    pub fn commit(&self, user_id: &str, session_id: &str, conversation: Conversation) {
        let key = SessionKey::new(user_id, session_id);
        let now = Utc::now().timestamp_millis();

        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;

        inner.entries.insert(
            key,
            SessionEntry {
                conversation,
                last_used_ms: now,
                use_seq: seq,
            },
        );
    }

    /// Remove a session.
    pub fn remove(&self, user_id: &str, session_id: &str) {
        self.inner
            .lock()
            .entries
            .remove(&SessionKey::new(user_id, session_id));
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    fn sweep_expired(inner: &mut Inner, now: i64, ttl_ms: i64) {
        inner
            .entries
            .retain(|_, entry| now - entry.last_used_ms < ttl_ms);
    }

    fn evict_over_cap(inner: &mut Inner, keep: &SessionKey, max_sessions: usize) {
        while inner.entries.len() > max_sessions {
            let oldest = inner
                .entries
                .iter()
                .filter(|(key, _)| *key != keep)
                .min_by_key(|(_, entry)| entry.use_seq)
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded() -> SessionStore {
        SessionStore::new(Duration::from_secs(3600), 16)
    }

    #[test]
    fn missing_id_defaults_to_fixed_session() {
        let store = unbounded();
        let (id, _) = store.resolve(DEFAULT_USER_ID, None, "sys");
        assert_eq!(id, DEFAULT_SESSION_ID);

        let (id, _) = store.resolve(DEFAULT_USER_ID, Some(""), "sys");
        assert_eq!(id, DEFAULT_SESSION_ID);
    }

    #[test]
    fn same_key_reuses_conversation() {
        let store = unbounded();
        let (id, mut conversation) = store.resolve(DEFAULT_USER_ID, Some("s1"), "sys");
        conversation.add_user_message("hello");
        conversation.add_assistant_message("hi");
        store.commit(DEFAULT_USER_ID, &id, conversation);

        let (_, restored) = store.resolve(DEFAULT_USER_ID, Some("s1"), "sys");
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.system(), Some("sys"));
    }

    #[test]
    fn distinct_keys_are_isolated() {
        let store = unbounded();
        let (id, mut conversation) = store.resolve("alice", Some("s1"), "sys");
        conversation.add_user_message("secret");
        store.commit("alice", &id, conversation);

        let (_, other) = store.resolve("bob", Some("s1"), "sys");
        assert!(other.is_empty());

        let (_, other) = store.resolve("alice", Some("s2"), "sys");
        assert!(other.is_empty());
    }

    #[test]
    fn expired_sessions_are_recreated_fresh() {
        let store = SessionStore::new(Duration::ZERO, 16);
        let (id, mut conversation) = store.resolve(DEFAULT_USER_ID, Some("s1"), "sys");
        conversation.add_user_message("hello");
        store.commit(DEFAULT_USER_ID, &id, conversation);

        // TTL of zero expires entries on the next access
        let (_, restored) = store.resolve(DEFAULT_USER_ID, Some("s1"), "sys");
        assert!(restored.is_empty());
    }

    #[test]
    fn least_recently_used_session_is_evicted_at_cap() {
        let store = SessionStore::new(Duration::from_secs(3600), 2);
        store.resolve(DEFAULT_USER_ID, Some("a"), "sys");
        store.resolve(DEFAULT_USER_ID, Some("b"), "sys");
        // Touch "a" so "b" becomes the oldest
        store.resolve(DEFAULT_USER_ID, Some("a"), "sys");
        store.resolve(DEFAULT_USER_ID, Some("c"), "sys");

        assert_eq!(store.len(), 2);
        let (_, a) = store.resolve(DEFAULT_USER_ID, Some("a"), "sys");
        // "a" survived; a re-resolve of "b" would start empty
        assert!(a.is_empty());
    }

    #[test]
    fn remove_drops_the_session() {
        let store = unbounded();
        store.resolve(DEFAULT_USER_ID, Some("s1"), "sys");
        assert_eq!(store.len(), 1);

        store.remove(DEFAULT_USER_ID, "s1");
        assert!(store.is_empty());
    }
}
