//! Runtime for chat sessions
//!
//! Each session owns its state machine and transcript. A turn holds the
//! session lock from the user's message to the reply, so turns of one
//! session never interleave.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ChatSession, TurnError, TurnReply};
pub use traits::*;

use crate::classifier::LlmClassifier;
use crate::ledger::LedgerBackend;
use crate::state_machine::reply::GREETING;
use crate::state_machine::{SessionContext, Speaker};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Type alias for production sessions with concrete implementations
pub type ProductionSessions = SessionManager<LedgerBackend, LlmClassifier>;

/// One line of the conversation
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Append-only conversation log, for display only
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// A transcript opened by the assistant's greeting
    pub fn new() -> Self {
        let mut transcript = Self {
            entries: Vec::new(),
        };
        transcript.push(Speaker::Assistant, GREETING);
        transcript
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

type SharedSession<L, C> = Arc<Mutex<ChatSession<L, C>>>;

/// How long idle sessions live and how many are kept at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub idle_timeout: Duration,
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(12 * 60 * 60),
            max_sessions: 1000,
        }
    }
}

struct SessionSlot<L, C>
where
    L: LedgerStore + 'static,
    C: Classifier + 'static,
{
    session: SharedSession<L, C>,
    last_seen: Instant,
}

/// Live sessions keyed by session id
///
/// Sessions idle longer than the timeout are dropped when next looked up
/// and swept whenever a new session starts. At capacity the least recently
/// used session makes room for the new one.
pub struct SessionManager<L, C>
where
    L: LedgerStore + 'static,
    C: Classifier + 'static,
{
    ledger: Arc<L>,
    classifier: Arc<C>,
    currency: String,
    limits: SessionLimits,
    sessions: RwLock<HashMap<String, SessionSlot<L, C>>>,
}

impl<L, C> SessionManager<L, C>
where
    L: LedgerStore + 'static,
    C: Classifier + 'static,
{
    pub fn new(
        ledger: Arc<L>,
        classifier: Arc<C>,
        currency: impl Into<String>,
        limits: SessionLimits,
    ) -> Self {
        Self {
            ledger,
            classifier,
            currency: currency.into(),
            limits,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new session and return its id
    pub async fn create(&self) -> (String, SharedSession<L, C>) {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(ChatSession::new(
            SessionContext::new(session_id.clone(), self.currency.clone()),
            self.ledger.clone(),
            self.classifier.clone(),
        )));

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict(&mut sessions, now);
        sessions.insert(
            session_id.clone(),
            SessionSlot {
                session: session.clone(),
                last_seen: now,
            },
        );
        tracing::info!(session_id = %session_id, active = sessions.len(), "Session started");
        (session_id, session)
    }

    /// Look up a session and mark it as just used
    pub async fn get(&self, session_id: &str) -> Option<SharedSession<L, C>> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(session_id)?;
        if self.expired(slot, now) {
            sessions.remove(session_id);
            tracing::info!(session_id = %session_id, "Session expired");
            return None;
        }
        slot.last_seen = now;
        Some(slot.session.clone())
    }

    /// Drop a session; returns whether it existed
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Session ended");
        }
        removed
    }

    #[allow(dead_code)] // Used in tests
    pub async fn active(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn expired(&self, slot: &SessionSlot<L, C>, now: Instant) -> bool {
        now.saturating_duration_since(slot.last_seen) >= self.limits.idle_timeout
    }

    /// Sweep idle sessions, then make room for one more
    fn evict(&self, sessions: &mut HashMap<String, SessionSlot<L, C>>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, slot| !self.expired(slot, now));

        while sessions.len() >= self.limits.max_sessions.max(1) {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
    }

    #[cfg(test)]
    async fn backdate(&self, session_id: &str, by: Duration) {
        if let Some(slot) = self.sessions.write().await.get_mut(session_id) {
            slot.last_seen = slot.last_seen.checked_sub(by).unwrap();
        }
    }
}
