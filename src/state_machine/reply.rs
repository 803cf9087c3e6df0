//! Assistant wording for every outcome of a turn

use super::state::PendingClarification;
use crate::ledger::{format_amount, Category, ExpenseRecord};

pub const GREETING: &str = "Hello! I can track your expenses. Try 'Spent 200 rupees on auto' or 'How much did I spend on Food?'";

pub const NOT_UNDERSTOOD: &str = "I'm sorry, I didn't understand that. Please try again.";

pub fn saved(currency: &str, record: &ExpenseRecord) -> String {
    format!(
        "Saved: {currency}{} for {} ({}).",
        format_amount(record.amount),
        record.item,
        record.category
    )
}

pub fn save_failed(record: &ExpenseRecord, error: &str) -> String {
    format!("Failed to save {}: {error}", record.item)
}

pub fn ask_category(currency: &str, pending: &PendingClarification) -> String {
    format!(
        "I noticed you spent {currency}{} on {}, but I'm not sure about the category. Which one is it? ({})",
        format_amount(pending.amount),
        pending.item,
        Category::closed_list()
    )
}

pub fn clarified(record: &ExpenseRecord) -> String {
    format!("Got it! Categorized as {} and saved.", record.category)
}

pub fn clarified_failed(error: &str) -> String {
    format!("Something went wrong saving the data ({error}). The expense was not saved.")
}

/// Shown when the classifier could not be reached at all
pub fn unavailable(error: &str, transient: bool) -> String {
    if transient {
        format!("The assistant is unavailable right now ({error}). Please try again in a moment.")
    } else {
        format!("The assistant is unavailable ({error}).")
    }
}
