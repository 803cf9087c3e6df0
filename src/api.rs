//! HTTP API for the expense chat
//!
//! The presentation boundary: login, one chat message at a time, the
//! running transcript and the dashboard.

mod auth;
mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::classifier::LlmClassifier;
use crate::config::AppConfig;
use crate::ledger::LedgerBackend;
use crate::runtime::{ProductionSessions, SessionLimits};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ProductionSessions>,
    pub ledger: Arc<LedgerBackend>,
    pub currency: String,
    pub recent_count: usize,
    /// SHA-256 of the login password; `None` disables the gate
    password_digest: Option<[u8; 32]>,
}

impl AppState {
    pub fn new(ledger: LedgerBackend, classifier: LlmClassifier, config: &AppConfig) -> Self {
        let ledger = Arc::new(ledger);
        Self {
            sessions: Arc::new(ProductionSessions::new(
                ledger.clone(),
                Arc::new(classifier),
                config.currency.clone(),
                SessionLimits {
                    idle_timeout: config.session_idle,
                    max_sessions: config.max_sessions,
                },
            )),
            ledger,
            currency: config.currency.clone(),
            recent_count: config.recent_count,
            password_digest: config.password.as_deref().map(digest),
        }
    }

    pub fn requires_password(&self) -> bool {
        self.password_digest.is_some()
    }

    /// Check a login attempt. Always true when no password is configured.
    pub fn verify_password(&self, candidate: &str) -> bool {
        let Some(expected) = &self.password_digest else {
            return true;
        };
        let actual = digest(candidate);
        expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn digest(text: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(text.as_bytes()));
    out
}
