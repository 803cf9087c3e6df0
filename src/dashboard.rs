//! Aggregate view of the ledger
//!
//! Recomputed from the current store contents on every request.

use crate::ledger::{ExpenseRecord, LedgerContents};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Spending in one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total: f64,
    /// Spending in the calendar month containing `today`
    pub month_total: f64,
    /// Largest first; equal amounts by category name
    pub by_category: Vec<CategoryTotal>,
    /// Newest first
    pub recent: Vec<ExpenseRecord>,
    /// Every stored row, dated or not
    pub record_count: usize,
    /// Rows whose date cannot be read; counted in `total` and
    /// `by_category` only
    pub undated_count: usize,
}

impl Dashboard {
    pub fn compute(contents: &LedgerContents, today: NaiveDate, recent_count: usize) -> Self {
        let records = &contents.records;
        let undated = &contents.undated;

        let total: f64 = records.iter().map(|r| r.amount).sum::<f64>()
            + undated.iter().map(|r| r.amount).sum::<f64>();
        let month_total: f64 = records
            .iter()
            .filter(|r| r.date.year() == today.year() && r.date.month() == today.month())
            .map(|r| r.amount)
            .sum();

        let mut per_category: BTreeMap<&str, f64> = BTreeMap::new();
        let amounts = records
            .iter()
            .map(|r| (&r.category, r.amount))
            .chain(undated.iter().map(|r| (&r.category, r.amount)));
        for (category, amount) in amounts {
            *per_category.entry(category.label()).or_default() += amount;
        }
        let mut by_category: Vec<CategoryTotal> = per_category
            .into_iter()
            .map(|(category, amount)| CategoryTotal {
                category: category.to_string(),
                amount,
            })
            .collect();
        // Stable sort keeps the map's name order for ties
        by_category.sort_by(|a, b| b.amount.total_cmp(&a.amount));

        let mut ordered: Vec<(usize, &ExpenseRecord)> = records.iter().enumerate().collect();
        ordered.sort_by(|(ia, a), (ib, b)| b.date.cmp(&a.date).then(ib.cmp(ia)));
        let recent = ordered
            .into_iter()
            .take(recent_count)
            .map(|(_, r)| r.clone())
            .collect();

        Self {
            total,
            month_total,
            by_category,
            recent,
            record_count: records.len() + undated.len(),
            undated_count: undated.len(),
        }
    }

    /// The dashboard shown when the ledger cannot be read
    pub fn empty() -> Self {
        Self {
            total: 0.0,
            month_total: 0.0,
            by_category: Vec::new(),
            recent: Vec::new(),
            record_count: 0,
            undated_count: 0,
        }
    }
}
