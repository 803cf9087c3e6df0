//! Effects produced by state transitions

use super::state::Speaker;
use crate::ledger::ExpenseRecord;

/// Why an append was requested; selects the reply once it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// The classifier resolved the category itself
    Direct,
    /// The user supplied the category in answer to a question
    Clarified,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a line to the session transcript
    RecordMessage { speaker: Speaker, text: String },

    /// Ask the classifier about `text` with the current ledger as context
    Classify { text: String },

    /// Persist one expense
    AppendExpense {
        record: ExpenseRecord,
        origin: WriteOrigin,
    },
}

impl Effect {
    pub fn record_user(text: impl Into<String>) -> Self {
        Effect::RecordMessage {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Effect::RecordMessage {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}
