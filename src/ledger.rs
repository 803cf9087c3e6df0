//! Expense ledger
//!
//! Expense records, the category vocabulary, and the two storage backends:
//! a SQLite table and a spreadsheet-style CSV file.

mod sheet;
mod sqlite;

pub use sheet::SheetLedger;
pub use sqlite::SqliteLedger;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Canonical on-disk and wire format for expense dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column headers of the spreadsheet and of classifier snapshots
pub const COLUMNS: [&str; 5] = ["Date", "Item", "Amount", "Category", "Notes"];

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Spreadsheet error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ledger unavailable: {0}")]
    Connectivity(String),
    #[error("Unusable spreadsheet: {0}")]
    Layout(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// ============================================================================
// Categories
// ============================================================================

/// Expense category
///
/// The first nine variants form the closed vocabulary the classifier may
/// choose from. `Uncategorized` marks rows stored without a category, and
/// `Custom` holds whatever the user typed when answering a clarification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Groceries,
    UtilityBills,
    Travel,
    Shopping,
    Entertainment,
    Health,
    Education,
    Other,
    Uncategorized,
    Custom(String),
}

impl Category {
    /// Categories the classifier is allowed to assign on its own
    pub const CLOSED: [Category; 9] = [
        Category::Food,
        Category::Groceries,
        Category::UtilityBills,
        Category::Travel,
        Category::Shopping,
        Category::Entertainment,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    pub fn label(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Groceries => "Groceries",
            Category::UtilityBills => "Utility Bills",
            Category::Travel => "Travel",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Other => "Other",
            Category::Uncategorized => "Uncategorized",
            Category::Custom(label) => label,
        }
    }

    /// Match a label against the closed vocabulary, ignoring case
    pub fn from_closed_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::CLOSED
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Interpret any label: closed vocabulary first, then `Uncategorized`
    /// for blanks, otherwise a custom category kept as written.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("uncategorized") {
            return Category::Uncategorized;
        }
        Self::from_closed_label(label).unwrap_or_else(|| Category::Custom(label.to_string()))
    }

    /// Comma-separated list of the closed vocabulary, for prompts and questions
    pub fn closed_list() -> String {
        Self::CLOSED
            .iter()
            .map(Category::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Category::from_label(&label))
    }
}

/// Title-case free text the way users expect category names to look:
/// the first letter of every alphabetic run is upper-cased, the rest lowered.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

// ============================================================================
// Records
// ============================================================================

/// A single persisted expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub item: String,
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub notes: String,
}

impl ExpenseRecord {
    fn to_row(&self) -> [String; 5] {
        [
            self.date.format(DATE_FORMAT).to_string(),
            self.item.clone(),
            self.amount.to_string(),
            self.category.label().to_string(),
            self.notes.clone(),
        ]
    }
}

/// A stored row whose date cannot be read. It has no place in monthly or
/// recent views but still counts toward all-time totals.
#[derive(Debug, Clone, PartialEq)]
pub struct UndatedRow {
    pub item: String,
    pub amount: f64,
    pub category: Category,
}

/// Everything a ledger holds, in store order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerContents {
    pub records: Vec<ExpenseRecord>,
    pub undated: Vec<UndatedRow>,
}

impl From<Vec<ExpenseRecord>> for LedgerContents {
    fn from(records: Vec<ExpenseRecord>) -> Self {
        Self {
            records,
            undated: Vec::new(),
        }
    }
}

/// Parse a stored or model-supplied date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD HH:MM:SS`
/// (the form spreadsheet exports use); timestamps are reduced to their date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Render an amount for chat replies: whole amounts without decimals,
/// everything else with two.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

/// Serialize records as CSV with the spreadsheet's headers.
///
/// An empty ledger yields an empty string rather than a lone header row.
pub fn to_csv(records: &[ExpenseRecord]) -> LedgerResult<String> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| LedgerError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ============================================================================
// Backend selection
// ============================================================================

/// The configured ledger backend
#[derive(Clone)]
pub enum LedgerBackend {
    Sqlite(SqliteLedger),
    Sheet(SheetLedger),
}

impl LedgerBackend {
    /// Open the ledger at `path`. A `.csv` extension selects the spreadsheet
    /// backend; anything else is treated as a SQLite database.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let is_sheet = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_sheet {
            Ok(LedgerBackend::Sheet(SheetLedger::open(path)))
        } else {
            Ok(LedgerBackend::Sqlite(SqliteLedger::open(path)?))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LedgerBackend::Sqlite(_) => "sqlite",
            LedgerBackend::Sheet(_) => "sheet",
        }
    }

    pub fn read_contents(&self) -> LedgerResult<LedgerContents> {
        match self {
            LedgerBackend::Sqlite(db) => db.read_contents(),
            LedgerBackend::Sheet(sheet) => sheet.read_contents(),
        }
    }

    /// Dated records only
    pub fn read_all(&self) -> LedgerResult<Vec<ExpenseRecord>> {
        Ok(self.read_contents()?.records)
    }

    pub fn append(&self, record: &ExpenseRecord) -> LedgerResult<()> {
        match self {
            LedgerBackend::Sqlite(db) => db.append(record),
            LedgerBackend::Sheet(sheet) => sheet.append(record),
        }
    }
}
