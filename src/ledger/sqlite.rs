//! SQLite ledger backend
//!
//! Appends are single `INSERT` statements, so concurrent writers sharing the
//! database file cannot lose each other's rows.

use super::{
    parse_date, Category, ExpenseRecord, LedgerContents, LedgerError, LedgerResult, UndatedRow,
    DATE_FORMAT,
};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    item TEXT NOT NULL,
    amount REAL NOT NULL,
    category TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date DESC);
";

/// Thread-safe ledger handle
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open or create the ledger database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory ledger (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Connectivity("ledger connection lock poisoned".to_string()))
    }

    /// All expenses in insertion order
    pub fn read_contents(&self) -> LedgerResult<LedgerContents> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT date, item, amount, category, notes FROM expenses ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut contents = LedgerContents::default();
        for row in rows {
            let (raw_date, item, amount, category, notes) = row?;
            let category = Category::from_label(&category);
            let Some(date) = parse_date(&raw_date) else {
                tracing::warn!(date = %raw_date, item = %item, "Expense has unreadable date");
                contents.undated.push(UndatedRow {
                    item,
                    amount,
                    category,
                });
                continue;
            };
            contents.records.push(ExpenseRecord {
                date,
                item,
                amount,
                category,
                notes,
            });
        }

        Ok(contents)
    }

    #[cfg(test)]
    pub fn read_all(&self) -> LedgerResult<Vec<ExpenseRecord>> {
        Ok(self.read_contents()?.records)
    }

    pub fn append(&self, record: &ExpenseRecord) -> LedgerResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO expenses (date, item, amount, category, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.date.format(DATE_FORMAT).to_string(),
                record.item,
                record.amount,
                record.category.label(),
                record.notes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
