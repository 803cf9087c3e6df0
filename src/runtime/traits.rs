//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::classifier::{LlmClassifier, Verdict};
use crate::ledger::{ExpenseRecord, LedgerBackend, LedgerError};
use crate::llm::LlmError;
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;

/// Persistent storage for expense records
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Every record, in append order
    async fn read_all(&self) -> Result<Vec<ExpenseRecord>, LedgerError>;

    /// Persist one record
    async fn append(&self, record: &ExpenseRecord) -> Result<(), LedgerError>;
}

/// Decides what a user message means
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `text` against the ledger `snapshot`.
    ///
    /// Malformed model output is a `Verdict::Unparseable`; only transport
    /// failures are errors.
    async fn infer(&self, text: &str, snapshot: &[ExpenseRecord]) -> Result<Verdict, LlmError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    async fn read_all(&self) -> Result<Vec<ExpenseRecord>, LedgerError> {
        (**self).read_all().await
    }

    async fn append(&self, record: &ExpenseRecord) -> Result<(), LedgerError> {
        (**self).append(record).await
    }
}

#[async_trait]
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    async fn infer(&self, text: &str, snapshot: &[ExpenseRecord]) -> Result<Verdict, LlmError> {
        (**self).infer(text, snapshot).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl LedgerStore for LedgerBackend {
    async fn read_all(&self) -> Result<Vec<ExpenseRecord>, LedgerError> {
        LedgerBackend::read_all(self)
    }

    async fn append(&self, record: &ExpenseRecord) -> Result<(), LedgerError> {
        LedgerBackend::append(self, record)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn infer(&self, text: &str, snapshot: &[ExpenseRecord]) -> Result<Verdict, LlmError> {
        self.classify(text, snapshot, Local::now().date_naive())
            .await
    }
}
