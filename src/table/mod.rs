// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The table model and its generalization algebra.
//!
//! A [`Table`] is a column-major dataset: an ordered header plus one
//! [`Column`] per header entry, every column holding the same number of
//! cells. Cells are plain strings; a cell is always one of the original
//! literal, a hierarchy ancestor name, a `[lo-hi]` range rendering, or the
//! suppression symbol `*`.
//!
//! The original table is loaded once and never mutated. Searchers work on
//! clones, rewriting quasi-identifier cells through the per-column
//! [`Column::mutations`] enumerator and restoring them on backtrack.

pub mod column;
pub mod load;
pub mod range;
pub mod rows;

use std::cmp::Ordering;

use rand::rngs::StdRng;

pub use column::{Column, ColumnType, Sensitivity};
pub use load::LoadOptions;
pub use range::Range;
pub use rows::RowViews;

use crate::error::{Error, Result};

/// The suppression symbol: replaces a cell entirely and matches anything.
pub const SUPPRESSED: &str = "*";

/// Sentinel for state counts too large to represent. Used solely to label
/// output; never as a termination bound.
pub const UNBOUNDED: u64 = u64::MAX;

/// A column-major dataset with per-column anonymization metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(crate) header: Vec<String>,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: usize,
}

impl Table {
    /// Number of data rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.header.len()
    }

    /// Column names in header order.
    #[inline]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// The column at a header position.
    #[inline]
    pub fn column(&self, col: usize) -> &Column {
        &self.columns[col]
    }

    #[inline]
    pub fn column_mut(&mut self, col: usize) -> &mut Column {
        &mut self.columns[col]
    }

    /// One raw cell.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.columns[col].data[row]
    }

    /// Overwrite one cell. Widths are not maintained here; call
    /// [`Table::update_widths`] before rendering.
    #[inline]
    pub fn set_cell(&mut self, row: usize, col: usize, value: String) {
        self.columns[col].data[row] = value;
    }

    /// Zero-copy view of one row. Out-of-range rows are an error.
    pub fn view(&self, row: usize) -> Result<Vec<&str>> {
        if row >= self.rows {
            return Err(Error::OutOfBounds {
                row,
                rows: self.rows,
            });
        }
        Ok(self
            .columns
            .iter()
            .map(|column| column.data[row].as_str())
            .collect())
    }

    /// Iterate over all rows as zero-copy views.
    pub fn row_views(&self) -> RowViews<'_> {
        RowViews::new(self)
    }

    /// An independent clone with every quasi cell replaced by one uniformly
    /// chosen element of its mutation set.
    pub fn random(&self, rng: &mut StdRng) -> Table {
        let mut copy = self.clone();
        for column in &mut copy.columns {
            if column.sensitivity != Sensitivity::Quasi {
                continue;
            }
            for row in 0..column.data.len() {
                let mut options = column.mutations(&column.data[row], Some(&mut *rng));
                column.data[row] = options.swap_remove(0);
            }
        }
        copy
    }

    /// The number of distinct tables reachable through cell mutations: the
    /// product over quasi cells of their mutation-set cardinalities.
    ///
    /// Saturates to [`UNBOUNDED`] once the table has more than 64 quasi
    /// cells, or on multiplication overflow.
    pub fn distinct_states(&self) -> u64 {
        let quasi_columns = self
            .columns
            .iter()
            .filter(|c| c.sensitivity == Sensitivity::Quasi)
            .count();
        if quasi_columns * self.rows > 64 {
            return UNBOUNDED;
        }

        let mut total: u64 = 1;
        for column in &self.columns {
            if column.sensitivity != Sensitivity::Quasi {
                continue;
            }
            for cell in &column.data {
                let count = column.mutations(cell, None).len() as u64;
                total = match total.checked_mul(count) {
                    Some(product) => product,
                    None => return UNBOUNDED,
                };
            }
        }
        total
    }

    /// Refresh every column's rendering width from its current cells.
    ///
    /// Widths go stale while a search mutates cells; intermediary tables are
    /// never printed, so they are only refreshed on demand.
    pub fn update_widths(&mut self) {
        for (name, column) in self.header.iter().zip(&mut self.columns) {
            let mut width = name.len();
            for cell in &column.data {
                width = width.max(cell.len());
            }
            column.width = width;
        }
    }

    /// Stable total order over tables: lexicographic over cells in
    /// row-major order. Used to rank tied-best result sets.
    pub fn cmp_cells(&self, other: &Table) -> Ordering {
        for row in 0..self.rows.min(other.rows) {
            for col in 0..self.columns().min(other.columns()) {
                match self.cell(row, col).cmp(other.cell(row, col)) {
                    Ordering::Equal => {}
                    unequal => return unequal,
                }
            }
        }
        (self.rows, self.columns()).cmp(&(other.rows, other.columns()))
    }
}
