//! Session management for the chat widget.
//!
//! Each session owns one conversation behind its own mutex. Replies wait for
//! a typing delay; every send takes a new ticket, and a newer ticket (a later
//! send, a clear, a language switch or closing the session) discards the
//! pending reply before it touches the conversation.
//!
//! Sessions idle for longer than the state TTL are evicted, and expired
//! persisted states are purged, whenever a session is opened.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::conversation::{Conversation, ConversationMessage, ConversationStats};
use crate::engine::ChatEngine;
use crate::error::{ChatError, Result};
use crate::export::{export_conversation, ConversationExport, ExportOptions};
use crate::language::Language;
use crate::response::BotResponse;
use crate::store::{
    clear_conversation_state, purge_expired_states, restore_conversation_state, save_conversation_state,
    ConversationStore, DEFAULT_STATE_TTL_SECS,
};

pub const DEFAULT_TYPING_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub typing_delay: Duration,
    pub state_ttl: Duration,
    pub default_language: Language,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            typing_delay: Duration::from_millis(DEFAULT_TYPING_DELAY_MS),
            state_ttl: Duration::from_secs(DEFAULT_STATE_TTL_SECS),
            default_language: Language::En,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub language: Language,
    pub restored: bool,
    pub messages: Vec<ConversationMessage>,
    pub current_service: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: BotResponse,
    pub suggestions: Vec<String>,
}

struct SessionHandle {
    conversation: Mutex<Conversation>,
    ticket: AtomicU64,
    latest: watch::Sender<u64>,
    last_activity: RwLock<Instant>,
}

impl SessionHandle {
    fn new(conversation: Conversation) -> Self {
        let (latest, _) = watch::channel(0);
        Self {
            conversation: Mutex::new(conversation),
            ticket: AtomicU64::new(0),
            latest,
            last_activity: RwLock::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    /// Takes a new ticket, superseding any pending reply.
    fn next_ticket(&self) -> u64 {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.send_replace(ticket);
        ticket
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.ticket.load(Ordering::SeqCst) == ticket
    }

    fn snapshot(&self, restored: bool) -> SessionSnapshot {
        let conversation = self.conversation.lock();
        SessionSnapshot {
            session_id: conversation.id.clone(),
            language: conversation.language,
            restored,
            messages: conversation.messages.clone(),
            current_service: conversation.context.current_service.clone(),
        }
    }
}

/// Resolves once `ticket` is no longer the latest one.
async fn superseded(mut latest: watch::Receiver<u64>, ticket: u64) {
    loop {
        if *latest.borrow_and_update() != ticket {
            return;
        }
        if latest.changed().await.is_err() {
            return;
        }
    }
}

pub struct ChatService {
    engine: Arc<ChatEngine>,
    store: Arc<dyn ConversationStore>,
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
    options: ServiceOptions,
}

impl ChatService {
    pub fn new(engine: Arc<ChatEngine>, store: Arc<dyn ConversationStore>, options: ServiceOptions) -> Self {
        Self {
            engine,
            store,
            sessions: RwLock::new(HashMap::new()),
            options,
        }
    }

    pub fn engine(&self) -> &ChatEngine {
        &self.engine
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn handle(&self, session_id: &str) -> Result<Arc<SessionHandle>> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::UnknownSession(session_id.to_string()))
    }

    fn state_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.options.state_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_STATE_TTL_SECS as i64))
    }

    /// Evicts sessions idle for longer than the state TTL and purges expired
    /// persisted states. Pending replies of evicted sessions are cancelled;
    /// a still-fresh persisted state can be restored by reopening.
    pub fn cleanup_expired(&self) -> usize {
        let timeout = self.options.state_ttl;
        let evicted: Vec<(String, Arc<SessionHandle>)> = {
            let mut sessions = self.sessions.write();
            let expired: Vec<String> = sessions
                .iter()
                .filter(|(_, handle)| handle.is_expired(timeout))
                .map(|(id, _)| id.clone())
                .collect();
            expired
                .into_iter()
                .filter_map(|id| sessions.remove(&id).map(|handle| (id, handle)))
                .collect()
        };
        for (id, handle) in &evicted {
            handle.next_ticket();
            log::info!("Evicted idle session {}", id);
        }
        purge_expired_states(self.store.as_ref(), self.state_ttl());
        evicted.len()
    }

    /// Returns the live session, or restores it from the store, or starts a
    /// new one. A fresh id is generated when none is given.
    pub fn open_session(&self, session_id: Option<&str>, language: Option<Language>) -> SessionSnapshot {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        self.cleanup_expired();
        if let Some(handle) = self.sessions.read().get(&session_id).cloned() {
            handle.touch();
            return handle.snapshot(false);
        }

        let restored = restore_conversation_state(self.store.as_ref(), &session_id, self.state_ttl())
            .filter(|state| language.map_or(true, |lang| lang == state.language))
            .map(|state| state.into_conversation(&session_id));
        let was_restored = restored.is_some();
        let conversation = restored.unwrap_or_else(|| {
            self.engine
                .new_conversation(&session_id, language.unwrap_or(self.options.default_language))
        });
        if was_restored {
            log::info!("Restored conversation {}", session_id);
        }

        let handle = Arc::new(SessionHandle::new(conversation));
        let handle = self
            .sessions
            .write()
            .entry(session_id)
            .or_insert(handle)
            .clone();
        handle.snapshot(was_restored)
    }

    /// Sends a user message. Returns `Ok(None)` when a newer action superseded
    /// this one during the typing delay.
    pub async fn send_message(&self, session_id: &str, message: &str) -> Result<Option<ChatReply>> {
        let handle = self.handle(session_id)?;
        handle.touch();
        let ticket = handle.next_ticket();
        let pending = {
            let mut conversation = handle.conversation.lock();
            self.engine.accept_user_message(&mut conversation, message)
        };

        if !self.options.typing_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.options.typing_delay) => {}
                _ = superseded(handle.latest.subscribe(), ticket) => {
                    log::debug!("reply for {} superseded", session_id);
                    return Ok(None);
                }
            }
        }

        let mut conversation = handle.conversation.lock();
        if !handle.is_current(ticket) {
            return Ok(None);
        }
        let outcome = self.engine.complete_turn(&mut conversation, pending);
        save_conversation_state(self.store.as_ref(), &conversation);
        handle.touch();
        Ok(Some(ChatReply {
            response: outcome.response,
            suggestions: outcome.suggestions,
        }))
    }

    /// Clears history and context, keeping the session and its language.
    pub fn clear_session(&self, session_id: &str) -> Result<SessionSnapshot> {
        let handle = self.handle(session_id)?;
        handle.touch();
        handle.next_ticket();
        {
            let mut conversation = handle.conversation.lock();
            let language = conversation.language;
            conversation.reset(language, self.engine.welcome(language));
            clear_conversation_state(self.store.as_ref(), session_id);
        }
        Ok(handle.snapshot(false))
    }

    /// Switches language; the conversation starts over in the new language.
    pub fn switch_language(&self, session_id: &str, language: Language) -> Result<SessionSnapshot> {
        let handle = self.handle(session_id)?;
        handle.touch();
        handle.next_ticket();
        {
            let mut conversation = handle.conversation.lock();
            conversation.reset(language, self.engine.welcome(language));
            clear_conversation_state(self.store.as_ref(), session_id);
        }
        log::info!("Session {} switched to {}", session_id, language);
        Ok(handle.snapshot(false))
    }

    /// Drops the session and its persisted state, cancelling any pending reply.
    pub fn close_session(&self, session_id: &str) -> Result<()> {
        let handle = self
            .sessions
            .write()
            .remove(session_id)
            .ok_or_else(|| ChatError::UnknownSession(session_id.to_string()))?;
        handle.next_ticket();
        // a reply already past its ticket check saves under this lock
        let _conversation = handle.conversation.lock();
        clear_conversation_state(self.store.as_ref(), session_id);
        Ok(())
    }

    pub fn stats(&self, session_id: &str) -> Result<ConversationStats> {
        let handle = self.handle(session_id)?;
        let conversation = handle.conversation.lock();
        Ok(conversation.stats())
    }

    pub fn export(&self, session_id: &str, options: ExportOptions) -> Result<ConversationExport> {
        let handle = self.handle(session_id)?;
        let conversation = handle.conversation.lock();
        Ok(export_conversation(&conversation, options))
    }

    pub fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot> {
        Ok(self.handle(session_id)?.snapshot(false))
    }
}
