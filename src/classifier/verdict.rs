//! Classifier verdicts and strict parsing of model output
//!
//! The model is asked for one JSON object. Anything that does not match the
//! expected shape exactly (missing fields, unknown intent, a category outside
//! the closed vocabulary, a negative or non-numeric amount, an impossible
//! date) becomes [`Verdict::Unparseable`] instead of an error.

use crate::ledger::{parse_date, Category};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

/// Category values the model uses to say it could not pick one
pub const UNRESOLVED_SENTINELS: [&str; 2] = ["UNCERTAIN", "UNRESOLVED"];

/// The classifier's decision about one user message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// The user described spending money
    Expense(ExpenseDraft),
    /// The user asked about their spending; `answer` is shown verbatim
    Query { answer: String },
    /// The model's output could not be interpreted
    Unparseable { reason: String },
}

/// Category as extracted by the model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftCategory {
    Resolved(Category),
    /// The model returned the sentinel; the user must be asked
    Unresolved,
}

/// An expense extracted from free text, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDraft {
    pub date: NaiveDate,
    pub item: String,
    pub amount: f64,
    pub category: DraftCategory,
    pub notes: String,
}

/// Interpret raw model output. Never fails.
pub fn parse_verdict(raw: &str) -> Verdict {
    match parse_strict(raw) {
        Ok(verdict) => verdict,
        Err(reason) => Verdict::Unparseable { reason },
    }
}

/// Models like to wrap JSON in Markdown fences even when told not to
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn parse_strict(raw: &str) -> Result<Verdict, String> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body).map_err(|e| format!("not JSON: {e}"))?;
    let obj = value
        .as_object()
        .ok_or_else(|| "response is not a JSON object".to_string())?;

    let intent = obj
        .get("intent")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing intent".to_string())?;

    match intent.trim().to_ascii_uppercase().as_str() {
        "QUERY" => {
            let answer = required_str(obj, "response_text")?;
            Ok(Verdict::Query {
                answer: answer.to_string(),
            })
        }
        "LOG_EXPENSE" => parse_expense(obj).map(Verdict::Expense),
        other => Err(format!("unknown intent {other:?}")),
    }
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str, String> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(format!("{field} is empty")),
        Some(_) => Err(format!("{field} is not text")),
        None => Err(format!("missing {field}")),
    }
}

fn parse_amount(value: Option<&Value>) -> Result<f64, String> {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        Some(_) => None,
        None => return Err("missing amount".to_string()),
    }
    .ok_or_else(|| "amount is not a number".to_string())?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount {amount} is not a non-negative number"));
    }
    Ok(amount)
}

fn parse_category(raw: &str) -> Result<DraftCategory, String> {
    let raw = raw.trim();
    if UNRESOLVED_SENTINELS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(raw))
    {
        return Ok(DraftCategory::Unresolved);
    }
    Category::from_closed_label(raw)
        .map(DraftCategory::Resolved)
        .ok_or_else(|| format!("category {raw:?} is not one of {}", Category::closed_list()))
}

fn parse_expense(obj: &Map<String, Value>) -> Result<ExpenseDraft, String> {
    let raw_date = required_str(obj, "date")?;
    let date = parse_date(raw_date).ok_or_else(|| format!("date {raw_date:?} is not a calendar date"))?;
    let item = required_str(obj, "item")?.trim().to_string();
    let amount = parse_amount(obj.get("amount"))?;
    let category = parse_category(required_str(obj, "category")?)?;
    let notes = match obj.get("notes") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err("notes is not text".to_string()),
    };

    Ok(ExpenseDraft {
        date,
        item,
        amount,
        category,
        notes,
    })
}
