//! Data models for the deal dashboard.
//!
//! This module contains the core data structures used throughout
//! the application: raw deals, the derived summary tables and the
//! product breakdown matrices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stage value that marks a completed, paid deal.
pub const PAYMENT_DONE: &str = "Payment Done";

/// Product sentinel for rows whose product is unknown.
pub const UNKNOWN_PRODUCT: &str = "NoData";

/// Pipeline status of a deal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The deal was paid for.
    PaymentDone,
    /// Any other pipeline status, kept verbatim.
    Other(String),
}

impl Stage {
    /// Returns true if the deal reached the paid status.
    pub fn is_payment_done(&self) -> bool {
        matches!(self, Stage::PaymentDone)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::PaymentDone => write!(f, "{}", PAYMENT_DONE),
            Stage::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Stage {
    fn from(s: &str) -> Self {
        if s == PAYMENT_DONE {
            Stage::PaymentDone
        } else {
            Stage::Other(s.to_string())
        }
    }
}

/// A single sales-pipeline record.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    /// Name of the manager who owns the deal.
    pub owner: String,
    /// Advertising source the client came from.
    pub ad: String,
    /// Pipeline status.
    pub stage: Stage,
    /// Offer total amount; `None` when missing or not a number.
    pub amount: Option<f64>,
    /// Product name, possibly the `NoData` sentinel.
    pub product: String,
    /// Education type (e.g. online/offline).
    pub education_type: String,
}

impl Deal {
    /// Amount if it is strictly positive.
    pub fn positive_amount(&self) -> Option<f64> {
        self.amount.filter(|a| *a > 0.0)
    }

    /// Paid deal with a positive amount.
    pub fn is_paid_with_amount(&self) -> bool {
        self.stage.is_payment_done() && self.positive_amount().is_some()
    }
}

/// The full, immutable set of loaded deals.
///
/// Cloning is cheap; all clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct DealTable {
    rows: Arc<[Deal]>,
}

impl DealTable {
    pub fn new(rows: Vec<Deal>) -> Self {
        Self { rows: rows.into() }
    }

    pub fn rows(&self) -> &[Deal] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Deal> for DealTable {
    fn from_iter<I: IntoIterator<Item = Deal>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Per-group statistics used for both the owner and the ad summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Owner name or ad source.
    pub key: String,
    /// Number of deals in the group.
    pub total: u64,
    /// Number of deals with stage "Payment Done".
    pub payment_done: u64,
    /// Sum of all positive amounts in the group.
    pub deal_amount_sum: f64,
    /// `payment_done / total * 100`, rounded to two decimals.
    pub conversion_rate: f64,
}

/// One row per distinct deal owner.
pub type OwnerSummary = GroupSummary;

/// One row per distinct ad source.
pub type AdSummary = GroupSummary;

/// Two-dimensional table keyed by (row, column) labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    /// Row labels in ascending order.
    pub rows: Vec<String>,
    /// Column labels in ascending order.
    pub columns: Vec<String>,
    /// `cells[row][column]`; `None` where no deal matched.
    pub cells: Vec<Vec<Option<T>>>,
}

impl<T> Default for Matrix<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            columns: Vec::new(),
            cells: Vec::new(),
        }
    }
}

impl<T: Copy> Matrix<T> {
    /// Looks up a cell by its labels.
    #[cfg(test)]
    pub fn get(&self, row: &str, column: &str) -> Option<T> {
        let r = self.rows.iter().position(|r| r == row)?;
        let c = self.columns.iter().position(|c| c == column)?;
        self.cells[r][c]
    }

    /// All values of one column, in row order.
    pub fn column(&self, index: usize) -> Vec<Option<T>> {
        self.cells.iter().map(|row| row[index]).collect()
    }

    /// Convert every populated cell, keeping the row/column universe.
    pub fn map<U>(&self, f: impl Fn(T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            cells: self
                .cells
                .iter()
                .map(|row| row.iter().map(|cell| cell.map(&f)).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Paid deals pivoted by product and education type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductBreakdown {
    /// Sum of amounts per cell.
    pub sum: Matrix<f64>,
    /// Number of deals per cell.
    pub count: Matrix<u64>,
}

/// All derived tables feeding the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub owners: Vec<OwnerSummary>,
    pub ads: Vec<AdSummary>,
    pub products: ProductBreakdown,
}
