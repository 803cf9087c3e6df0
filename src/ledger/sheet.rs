//! Spreadsheet ledger backend
//!
//! The ledger is a single CSV table. Its header must name `Date` and
//! `Amount` columns; `Item`, `Category` and `Notes` are optional. Header
//! names match regardless of case or surrounding spaces, and any other
//! columns are carried through untouched.
//!
//! Appending reads the whole table, adds one row, and writes the whole table
//! back through a temporary file and a rename. Writers in other processes
//! are not coordinated: two of them can race and one row is lost.

use super::{
    parse_date, Category, ExpenseRecord, LedgerContents, LedgerError, LedgerResult, UndatedRow,
    COLUMNS, DATE_FORMAT,
};
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Positions of the known columns within a sheet's header
#[derive(Debug, Clone, Copy)]
struct Layout {
    date: usize,
    item: Option<usize>,
    amount: usize,
    category: Option<usize>,
    notes: Option<usize>,
}

fn column(header: &StringRecord, name: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

impl Layout {
    fn of(header: &StringRecord) -> LedgerResult<Self> {
        let required = |name: &str| {
            column(header, name).ok_or_else(|| {
                LedgerError::Layout(format!(
                    "no {name} column in header {:?}",
                    header.iter().collect::<Vec<_>>()
                ))
            })
        };

        Ok(Self {
            date: required("Date")?,
            item: column(header, "Item"),
            amount: required("Amount")?,
            category: column(header, "Category"),
            notes: column(header, "Notes"),
        })
    }

    fn cell<'r>(row: &'r StringRecord, index: Option<usize>) -> &'r str {
        index.and_then(|i| row.get(i)).unwrap_or("").trim()
    }

    /// Interpret a row; `None` for rows with nothing in them
    fn read(&self, row: &StringRecord) -> Option<Result<ExpenseRecord, UndatedRow>> {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            return None;
        }

        // Non-numeric cells count as zero, matching how the dashboard treats them
        let amount = Self::cell(row, Some(self.amount))
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .unwrap_or(0.0);
        let item = Self::cell(row, self.item).to_string();
        let category = Category::from_label(Self::cell(row, self.category));

        Some(match parse_date(Self::cell(row, Some(self.date))) {
            Some(date) => Ok(ExpenseRecord {
                date,
                item,
                amount,
                category,
                notes: Self::cell(row, self.notes).to_string(),
            }),
            None => Err(UndatedRow {
                item,
                amount,
                category,
            }),
        })
    }

    /// A new row as wide as the header, with the record in its columns
    fn write(&self, width: usize, record: &ExpenseRecord) -> StringRecord {
        let mut cells = vec![String::new(); width];
        let mut put = |index: Option<usize>, value: String| {
            if let Some(cell) = index.and_then(|i| cells.get_mut(i)) {
                *cell = value;
            }
        };
        put(Some(self.date), record.date.format(DATE_FORMAT).to_string());
        put(self.item, record.item.clone());
        put(Some(self.amount), record.amount.to_string());
        put(self.category, record.category.label().to_string());
        put(self.notes, record.notes.clone());
        StringRecord::from(cells)
    }
}

/// The raw table: header and rows exactly as they were read
struct Table {
    header: StringRecord,
    rows: Vec<StringRecord>,
}

#[derive(Clone)]
pub struct SheetLedger {
    path: PathBuf,
    /// Serialises rewrites issued from this process
    write_lock: Arc<Mutex<()>>,
}

impl SheetLedger {
    /// Open the spreadsheet at `path`. The file is created on first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when there is no file yet or the file is empty
    fn load(&self) -> LedgerResult<Option<Table>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let header = reader.headers()?.clone();
        if header.iter().all(|h| h.trim().is_empty()) {
            return Ok(None);
        }

        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Table { header, rows }))
    }

    /// Every row in sheet order, split by whether its date can be read
    pub fn read_contents(&self) -> LedgerResult<LedgerContents> {
        let Some(table) = self.load()? else {
            return Ok(LedgerContents::default());
        };
        let layout = Layout::of(&table.header)?;

        let mut contents = LedgerContents::default();
        for (index, row) in table.rows.iter().enumerate() {
            match layout.read(row) {
                Some(Ok(record)) => contents.records.push(record),
                Some(Err(undated)) => {
                    tracing::warn!(
                        row = index + 2,
                        date = Layout::cell(row, Some(layout.date)),
                        path = %self.path.display(),
                        "Spreadsheet row has unreadable date"
                    );
                    contents.undated.push(undated);
                }
                None => {}
            }
        }
        Ok(contents)
    }

    #[cfg(test)]
    pub fn read_all(&self) -> LedgerResult<Vec<ExpenseRecord>> {
        Ok(self.read_contents()?.records)
    }

    pub fn append(&self, record: &ExpenseRecord) -> LedgerResult<()> {
        // A poisoned lock only means an earlier rewrite panicked; the file
        // itself is still whole because of the rename below.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut table = self.load()?.unwrap_or_else(|| Table {
            header: StringRecord::from(COLUMNS.to_vec()),
            rows: Vec::new(),
        });

        // Refuses sheets without Date or Amount before anything is written
        Layout::of(&table.header)?;
        for name in COLUMNS {
            if column(&table.header, name).is_none() {
                table.header.push_field(name);
            }
        }
        let layout = Layout::of(&table.header)?;
        table.rows.push(layout.write(table.header.len(), record));

        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp_path)?;
            writer.write_record(&table.header)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(rows = table.rows.len(), path = %self.path.display(), "Rewrote spreadsheet");
        Ok(())
    }
}
