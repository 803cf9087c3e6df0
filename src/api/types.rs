//! API request and response types

use crate::dashboard::Dashboard;
use crate::ledger::ExpenseRecord;
use crate::runtime::TranscriptEntry;
use crate::state_machine::PendingClarification;
use serde::{Deserialize, Serialize};

/// Request to open a session
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

/// A new session and its opening transcript
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub transcript: Vec<TranscriptEntry>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// The assistant's answer to one message
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// `idle` or `awaiting_category`
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingClarification>,
    /// The turn failed and `reply` describes why
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub messages: Vec<TranscriptEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub recent: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub currency: String,
    /// Set when the ledger could not be read; the figures are then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<ExpenseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
