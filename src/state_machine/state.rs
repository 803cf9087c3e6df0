//! Conversation state types

use crate::classifier::ExpenseDraft;
use crate::ledger::{title_case, Category, ExpenseRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An expense the classifier extracted but could not categorise.
///
/// Held until the very next user message, which supplies the category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingClarification {
    pub date: NaiveDate,
    pub item: String,
    pub amount: f64,
    pub notes: String,
}

impl PendingClarification {
    pub fn from_draft(draft: ExpenseDraft) -> Self {
        Self {
            date: draft.date,
            item: draft.item,
            amount: draft.amount,
            notes: draft.notes,
        }
    }

    /// Complete the expense with the user's answer as its category
    pub fn resolve(self, answer: &str) -> ExpenseRecord {
        ExpenseRecord {
            date: self.date,
            item: self.item,
            amount: self.amount,
            category: category_from_answer(answer),
            notes: self.notes,
        }
    }
}

/// Interpret a clarification answer: trimmed, title-cased, and mapped onto
/// the known vocabulary when it matches one.
pub fn category_from_answer(answer: &str) -> Category {
    Category::from_label(&title_case(answer.trim()))
}

/// Conversation state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// Ready for a new statement or question
    #[default]
    Idle,

    /// The next message is the category for `pending`
    AwaitingCategory { pending: PendingClarification },
}

impl ChatState {
    pub fn label(&self) -> &'static str {
        match self {
            ChatState::Idle => "idle",
            ChatState::AwaitingCategory { .. } => "awaiting_category",
        }
    }

    pub fn pending(&self) -> Option<&PendingClarification> {
        match self {
            ChatState::Idle => None,
            ChatState::AwaitingCategory { pending } => Some(pending),
        }
    }
}

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// Per-session settings the transition function reads
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Symbol prefixed to amounts in replies
    pub currency: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            currency: currency.into(),
        }
    }
}
