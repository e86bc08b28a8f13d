// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Columns and their generalization space.
//!
//! A column owns its cell data plus everything the engine needs to reason
//! about how a cell may change: the type decides whether ranges apply, the
//! sensitivity decides whether the column participates at all, the unique
//! set and minimal range are the certainty-score denominators, and the
//! hierarchy supplies categorical generalizations.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use strum_macros::{Display, EnumString};

use crate::hierarchy::Hierarchy;
use crate::table::range::Range;
use crate::table::SUPPRESSED;

/// What kind of data a column holds. Integer columns additionally
/// generalize into ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum ColumnType {
    #[strum(serialize = "s")]
    String,
    #[strum(serialize = "i")]
    Integer,
}

/// How a column participates in anonymization. Only quasi-identifier
/// columns are ever mutated or consulted for k-matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Sensitivity {
    #[strum(serialize = "i")]
    Ignore,
    #[strum(serialize = "q")]
    Quasi,
    #[strum(serialize = "s")]
    Sensitive,
}

/// One column of a table: cell data in row order plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub ty: ColumnType,
    pub weight: f64,
    pub sensitivity: Sensitivity,
    /// Maximal textual width of any cell, maintained lazily; only refreshed
    /// before rendering.
    pub width: usize,
    /// Distinct original cell values; the certainty denominator for
    /// non-integer columns.
    pub unique: BTreeSet<String>,
    /// Every distinct range obtainable by pairing two non-suppressed
    /// integer cells, excluding the all-spanning minimal range.
    pub ranges: BTreeSet<Range>,
    /// The minimal range covering all observed integers; the certainty
    /// denominator for integer columns.
    pub range: Range,
    pub hierarchy: Option<Hierarchy>,
    pub data: Vec<String>,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            ty: ColumnType::String,
            weight: 1.0,
            sensitivity: Sensitivity::Quasi,
            width: 0,
            unique: BTreeSet::new(),
            ranges: BTreeSet::new(),
            range: Range::default(),
            hierarchy: None,
            data: Vec::new(),
        }
    }
}

impl Column {
    /// Enumerate the candidate replacements for one cell value.
    ///
    /// The set always contains the suppression symbol exactly once. With a
    /// hierarchy it contains the cell's whole ancestor chain (the cell
    /// itself included, the root excluded); a cell the hierarchy does not
    /// know gets no chain at all. Without a hierarchy the cell itself is
    /// kept as a no-op option, unless it is empty or already suppressed.
    /// Integer columns additionally offer every enumerated range containing
    /// the cell.
    ///
    /// The order is deterministic unless an RNG is supplied, in which case
    /// the candidates are shuffled so non-exhaustive searches sample the
    /// space instead of exhausting a prefix of it.
    pub fn mutations(&self, value: &str, rng: Option<&mut StdRng>) -> Vec<String> {
        let mut options = vec![SUPPRESSED.to_string()];

        if let Some(hierarchy) = &self.hierarchy {
            for ancestor in hierarchy.find(value) {
                options.push(ancestor.to_string());
            }
        } else if !value.is_empty() && value != SUPPRESSED {
            options.push(value.to_string());
        }

        if self.ty == ColumnType::Integer {
            if value.starts_with('[') {
                if let Ok(cell_range) = Range::parse(value) {
                    for range in &self.ranges {
                        if range.contains_range(&cell_range) {
                            options.push(range.as_str().to_string());
                        }
                    }
                }
            } else if let Ok(number) = value.parse::<u64>() {
                for range in &self.ranges {
                    if range.contains(number) {
                        options.push(range.as_str().to_string());
                    }
                }
            }
        }

        if let Some(rng) = rng {
            options.shuffle(rng);
        }
        options
    }
}
