//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::classifier::Verdict;
use crate::ledger::{ExpenseRecord, LedgerError};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, Usage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock Ledger
// ============================================================================

/// In-memory ledger with switchable failures
#[allow(dead_code)]
pub struct MockLedger {
    records: Mutex<Vec<ExpenseRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    append_attempts: AtomicUsize,
}

#[allow(dead_code)]
impl MockLedger {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<ExpenseRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            append_attempts: AtomicUsize::new(0),
        }
    }

    /// Make every read fail with a connectivity error
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every append fail with a connectivity error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Records currently stored
    pub fn records(&self) -> Vec<ExpenseRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Appends attempted, successful or not
    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MockLedger {
    async fn read_all(&self) -> Result<Vec<ExpenseRecord>, LedgerError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::Connectivity("sheet unreachable".to_string()));
        }
        Ok(self.records())
    }

    async fn append(&self, record: &ExpenseRecord) -> Result<(), LedgerError> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Connectivity("write rejected".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ============================================================================
// Mock Classifier
// ============================================================================

/// Classifier that returns queued verdicts
#[allow(dead_code)]
pub struct MockClassifier {
    verdicts: Mutex<VecDeque<Result<Verdict, LlmError>>>,
    /// Record of every call: message text and snapshot size
    pub calls: Mutex<Vec<(String, usize)>>,
}

#[allow(dead_code)]
impl MockClassifier {
    pub fn new() -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a verdict
    pub fn queue_verdict(&self, verdict: Verdict) {
        self.verdicts.lock().unwrap().push_back(Ok(verdict));
    }

    /// Queue a transport failure
    pub fn queue_error(&self, error: LlmError) {
        self.verdicts.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded calls
    pub fn recorded_calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn infer(&self, text: &str, snapshot: &[ExpenseRecord]) -> Result<Verdict, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), snapshot.len()));
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock verdict queued")))
    }
}

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Language model that replies with queued raw text
#[allow(dead_code)]
pub struct MockLlmService {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

#[allow(dead_code)]
impl MockLlmService {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue raw model output
    pub fn queue_text(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a transport failure
    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))?;
        Ok(LlmResponse {
            text,
            usage: Usage::default(),
        })
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}
