// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The two anonymization searchers and their shared plumbing.
//!
//! Both searchers explore the space of cell mutations over the original
//! table: [`mingen::MinGen`] exhaustively with pruning, [`genetic::Genetic`]
//! generationally with a two-stage fitness. Either returns a
//! [`SearchReport`] carrying every table tied at the best score, the
//! exploration counters, and the caches (whose hit rates feed the final
//! statistics block).

pub mod genetic;
pub mod mingen;
pub mod progress;

use std::time::Duration;

use strum_macros::{Display, EnumString};

pub use genetic::Genetic;
pub use mingen::MinGen;
pub use progress::{Progress, Snapshot};

use crate::cache::MetricCaches;
use crate::table::Table;

/// Which searcher to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Mode {
    #[strum(serialize = "mg")]
    MinGen,
    #[strum(serialize = "ga")]
    Genetic,
}

/// Everything a finished search hands back to the caller.
#[derive(Debug)]
pub struct SearchReport {
    /// Every table tied at the best score, in a stable order.
    pub tables: Vec<Table>,
    /// The best distortion score reached (∞ when nothing was found).
    pub best: f64,
    /// States explored.
    pub states: u64,
    /// Size of the full mutation space, [`crate::table::UNBOUNDED`] when
    /// uncountable.
    pub total: u64,
    /// Wall-clock duration of the search.
    pub elapsed: Duration,
    /// The input already satisfied the k requirement; no search ran.
    pub already_anonymous: bool,
    /// Whether the returned best actually meets the k requirement.
    /// Callers should re-check before releasing a result.
    pub k_satisfied: bool,
    /// The metric caches, returned for statistics and for reuse by a
    /// subsequent search in the same process.
    pub caches: MetricCaches,
}
