//! Session-keyed persistence of conversation state.
//!
//! Stores hold serialised JSON so a backend only has to move strings. The
//! free functions wrap a store and never fail: errors are logged and the
//! caller carries on without persistence.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::context::ServiceContext;
use crate::conversation::{Conversation, ConversationMessage};
use crate::error::{ChatError, Result};
use crate::language::Language;

pub const STATE_VERSION: u32 = 1;
pub const DEFAULT_STATE_TTL_SECS: u64 = 3600;

/// Pluggable backend for persisted conversations.
pub trait ConversationStore: Send + Sync {
    fn save(&self, session_id: &str, payload: String) -> Result<()>;

    fn load(&self, session_id: &str) -> Result<Option<String>>;

    fn remove(&self, session_id: &str) -> Result<()>;

    /// Drops entries saved before `cutoff` and returns how many went.
    /// Backends that expire entries on their own keep the default.
    fn purge_saved_before(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
        Ok(0)
    }
}

struct StoredEntry {
    payload: String,
    saved_at: DateTime<Utc>,
}

/// In-memory store, lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ConversationStore for InMemoryStore {
    fn save(&self, session_id: &str, payload: String) -> Result<()> {
        let entry = StoredEntry {
            payload,
            saved_at: Utc::now(),
        };
        self.entries.write().insert(session_id.to_string(), entry);
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(session_id).map(|e| e.payload.clone()))
    }

    fn remove(&self, session_id: &str) -> Result<()> {
        self.entries.write().remove(session_id);
        Ok(())
    }

    fn purge_saved_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.saved_at >= cutoff);
        Ok(before - entries.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub messages: Vec<ConversationMessage>,
    pub service_context: ServiceContext,
    pub active_service: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub language: Language,
    pub version: u32,
}

impl PersistedState {
    pub fn from_conversation(conversation: &Conversation) -> Self {
        Self {
            messages: conversation.messages.clone(),
            service_context: conversation.context.clone(),
            active_service: conversation.context.current_service.clone(),
            timestamp: Utc::now(),
            language: conversation.language,
            version: STATE_VERSION,
        }
    }

    pub fn into_conversation(self, id: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            language: self.language,
            messages: self.messages,
            context: self.service_context,
        }
    }

    fn check(&self, now: DateTime<Utc>, ttl: Duration) -> Result<()> {
        if self.version != STATE_VERSION {
            return Err(ChatError::Storage(format!("unknown state version {}", self.version)));
        }
        if now - self.timestamp > ttl {
            return Err(ChatError::Storage("state expired".to_string()));
        }
        if self.messages.len() <= 1 {
            return Err(ChatError::Storage("nothing beyond the welcome message".to_string()));
        }
        Ok(())
    }
}

pub fn save_conversation_state(store: &dyn ConversationStore, conversation: &Conversation) -> bool {
    let state = PersistedState::from_conversation(conversation);
    let result = serde_json::to_string(&state)
        .map_err(ChatError::from)
        .and_then(|payload| store.save(&conversation.id, payload));
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to save conversation {}: {}", conversation.id, e);
            false
        }
    }
}

pub fn restore_conversation_state(
    store: &dyn ConversationStore,
    session_id: &str,
    ttl: Duration,
) -> Option<PersistedState> {
    restore_conversation_state_at(store, session_id, ttl, Utc::now())
}

pub fn restore_conversation_state_at(
    store: &dyn ConversationStore,
    session_id: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Option<PersistedState> {
    let payload = match store.load(session_id) {
        Ok(Some(payload)) => payload,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to load conversation {}: {}", session_id, e);
            return None;
        }
    };

    let state: PersistedState = match serde_json::from_str(&payload) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Discarding unreadable state for {}: {}", session_id, e);
            return None;
        }
    };
    match state.check(now, ttl) {
        Ok(()) => Some(state),
        Err(e) => {
            log::debug!("Not restoring {}: {}", session_id, e);
            None
        }
    }
}

/// Removes persisted states older than `ttl`; they could never be restored.
pub fn purge_expired_states(store: &dyn ConversationStore, ttl: Duration) -> usize {
    match store.purge_saved_before(Utc::now() - ttl) {
        Ok(purged) => {
            if purged > 0 {
                log::info!("Purged {} expired conversation states", purged);
            }
            purged
        }
        Err(e) => {
            log::warn!("Failed to purge expired conversation states: {}", e);
            0
        }
    }
}

pub fn clear_conversation_state(store: &dyn ConversationStore, session_id: &str) -> bool {
    match store.remove(session_id) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to clear conversation {}: {}", session_id, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::DEFAULT_MAX_MESSAGES;

    struct BrokenStore;

    impl ConversationStore for BrokenStore {
        fn save(&self, _: &str, _: String) -> Result<()> {
            Err(ChatError::Storage("disk full".to_string()))
        }
        fn load(&self, _: &str) -> Result<Option<String>> {
            Err(ChatError::Storage("unavailable".to_string()))
        }
        fn remove(&self, _: &str) -> Result<()> {
            Err(ChatError::Storage("unavailable".to_string()))
        }
    }

    fn conversation() -> Conversation {
        let mut conversation = Conversation::new("s1", Language::En, "Welcome!");
        conversation.push(ConversationMessage::user("keynote", Language::En), DEFAULT_MAX_MESSAGES);
        conversation.context.update(Some("Keynote Speaking"), "keynote");
        conversation
    }

    #[test]
    fn test_save_then_restore() {
        let store = InMemoryStore::new();
        let conversation = conversation();
        assert!(save_conversation_state(&store, &conversation));

        let state = restore_conversation_state(&store, "s1", Duration::hours(1)).unwrap();
        assert_eq!(state.messages, conversation.messages);
        assert_eq!(state.active_service.as_deref(), Some("Keynote Speaking"));
        let restored = state.into_conversation("s1");
        assert_eq!(restored.context, conversation.context);
    }

    #[test]
    fn test_expired_state_is_rejected() {
        let store = InMemoryStore::new();
        assert!(save_conversation_state(&store, &conversation()));
        let later = Utc::now() + Duration::hours(2);
        assert!(restore_conversation_state_at(&store, "s1", Duration::hours(1), later).is_none());
    }

    #[test]
    fn test_welcome_only_state_is_rejected() {
        let store = InMemoryStore::new();
        let conversation = Conversation::new("s2", Language::En, "Welcome!");
        assert!(save_conversation_state(&store, &conversation));
        assert!(restore_conversation_state(&store, "s2", Duration::hours(1)).is_none());
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let store = InMemoryStore::new();
        let mut state = PersistedState::from_conversation(&conversation());
        state.version = 99;
        store.save("s1", serde_json::to_string(&state).unwrap()).unwrap();
        assert!(restore_conversation_state(&store, "s1", Duration::hours(1)).is_none());
    }

    #[test]
    fn test_garbage_payload_is_ignored() {
        let store = InMemoryStore::new();
        store.save("s1", "{not json".to_string()).unwrap();
        assert!(restore_conversation_state(&store, "s1", Duration::hours(1)).is_none());
    }

    #[test]
    fn test_failures_degrade_to_false() {
        assert!(!save_conversation_state(&BrokenStore, &conversation()));
        assert!(restore_conversation_state(&BrokenStore, "s1", Duration::hours(1)).is_none());
        assert!(!clear_conversation_state(&BrokenStore, "s1"));
    }

    #[test]
    fn test_purge_drops_only_expired_entries() {
        let store = InMemoryStore::new();
        assert!(save_conversation_state(&store, &conversation()));
        assert_eq!(purge_expired_states(&store, Duration::hours(1)), 0);
        assert_eq!(store.len(), 1);

        let purged = store.purge_saved_before(Utc::now() + Duration::seconds(1)).unwrap();
        assert_eq!(purged, 1);
        assert!(store.is_empty());
        assert_eq!(purge_expired_states(&BrokenStore, Duration::hours(1)), 0);
    }

    #[test]
    fn test_clear() {
        let store = InMemoryStore::new();
        assert!(save_conversation_state(&store, &conversation()));
        assert!(clear_conversation_state(&store, "s1"));
        assert!(store.is_empty());
    }
}
