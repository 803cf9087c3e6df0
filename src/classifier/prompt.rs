//! Classifier prompt construction

use crate::ledger::{Category, DATE_FORMAT};
use chrono::NaiveDate;
use std::fmt::Write;

/// Auto-categorisation hints given to the model as worked examples
const CATEGORY_HINTS: &[(&str, &str)] = &[
    ("Starbucks", "Food"),
    ("Swiggy dinner", "Food"),
    ("Uber", "Travel"),
    ("Metro card recharge", "Travel"),
    ("Blinkit", "Groceries"),
    ("Electricity bill", "Utility Bills"),
    ("Netflix", "Entertainment"),
    ("Pharmacy", "Health"),
    ("Course fee", "Education"),
];

/// Build the system instruction for one classification.
///
/// `snapshot_csv` is the full ledger as CSV; an empty string means the
/// ledger has no rows yet.
pub fn system_prompt(today: NaiveDate, snapshot_csv: &str) -> String {
    let today = today.format(DATE_FORMAT);
    let mut prompt = format!(
        "You are an expense manager for a single user in India. Current date: {today}.

Classify the user's message into exactly one INTENT: \"LOG_EXPENSE\" or \"QUERY\".

1. INTENT: LOG_EXPENSE
The user describes spending money. Extract the details:
- Resolve relative dates (\"yesterday\", \"last friday\") to YYYY-MM-DD. Use {today} when no date is given.
- item: what the money was spent on, a few words.
- amount: a number only, no currency symbol.
- category: exactly one of [{categories}].
- notes: anything else worth keeping, or an empty string.
Only set category to \"UNCERTAIN\" when the message gives no way to tell.
Output: {{\"intent\": \"LOG_EXPENSE\", \"date\": \"YYYY-MM-DD\", \"item\": \"string\", \"amount\": number, \"category\": \"string\", \"notes\": \"string\"}}

2. INTENT: QUERY
The user asks about their spending. Answer from the data below.
Output: {{\"intent\": \"QUERY\", \"response_text\": \"Natural language answer.\"}}

Respond ONLY with the JSON object.
",
        categories = Category::closed_list(),
    );

    prompt.push_str("\nCategorisation examples:\n");
    for (text, category) in CATEGORY_HINTS {
        let _ = writeln!(prompt, "- \"{text}\" -> \"{category}\"");
    }

    prompt.push_str("\nExpense data (CSV):\n");
    if snapshot_csv.trim().is_empty() {
        prompt.push_str("(no expenses recorded yet)\n");
    } else {
        prompt.push_str(snapshot_csv);
        if !snapshot_csv.ends_with('\n') {
            prompt.push('\n');
        }
    }

    prompt
}
