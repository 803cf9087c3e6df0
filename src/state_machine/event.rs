//! Events that can occur in a conversation

use super::effect::WriteOrigin;
use crate::classifier::Verdict;
use crate::ledger::ExpenseRecord;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// One message typed by the user
    UserMessage { text: String },

    /// The classifier's decision about the last message
    Classified { verdict: Verdict },

    /// A requested ledger append finished
    AppendFinished {
        record: ExpenseRecord,
        origin: WriteOrigin,
        outcome: Result<(), String>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::Classified { .. } => "classified",
            Event::AppendFinished { .. } => "append_finished",
        }
    }
}
