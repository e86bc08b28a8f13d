// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Exhaustive depth-first search with pruning.
//!
//! The brute-force formulation is simple: generate every permutation of
//! cell generalizations and keep the k-anonymous one with the lowest
//! score. This implementation keeps the exhaustiveness but prunes the
//! space aggressively, the way game-tree searches do.
//!
//! The recursion walks one column at a time, row by row. Once the last row
//! of a column is assigned, the prefix formed by this column and every
//! column before it is tested:
//!
//! - **Score pruning**: both metrics only ever grow as cells change, so if
//!   the prefix already scores worse than the best complete table, no
//!   completion can catch up and the branch dies.
//! - **k pruning**: if a row is identifiable from the prefix columns
//!   alone, later columns cannot fix it, and the branch dies.
//!
//! The score test runs before the k test: scoring is the cheaper of the
//! two and short-circuits far more often, which makes a measurable
//! difference over millions of states.
//!
//! Rather than cloning a table per recursion frame, a single working copy
//! is mutated in place and every cell is restored on the way back out,
//! which keeps the memory footprint at two tables regardless of depth.

use std::time::Instant;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::cache::MetricCaches;
use crate::error::Result;
use crate::metrics::{k_anonymity, Metric};
use crate::search::progress::{Progress, Snapshot};
use crate::search::SearchReport;
use crate::table::{Sensitivity, Table, UNBOUNDED};

/// The exhaustive searcher. Construct, then call [`MinGen::run`].
#[derive(Debug)]
pub struct MinGen {
    original: Table,
    working: Table,
    k: usize,
    metric: Metric,
    /// State budget; `UNBOUNDED` means exhaustive.
    max: u64,
    caches: MetricCaches,
    rng: StdRng,
    progress: Option<Progress>,
    states: u64,
    total: u64,
    best: f64,
    tables: Vec<Table>,
}

impl MinGen {
    pub fn new(
        original: Table,
        k: usize,
        metric: Metric,
        max_states: Option<u64>,
        caches: MetricCaches,
        rng: StdRng,
    ) -> Self {
        let working = original.clone();
        Self {
            original,
            working,
            k,
            metric,
            max: max_states.unwrap_or(UNBOUNDED),
            caches,
            rng,
            progress: None,
            states: 0,
            total: 0,
            best: f64::INFINITY,
            tables: Vec::new(),
        }
    }

    /// Attach a progress handle; snapshots are only published when one is
    /// attached.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run the search to completion and return the tied-best set.
    pub fn run(mut self) -> Result<SearchReport> {
        let start = Instant::now();
        self.total = self.original.distinct_states();

        if k_anonymity(&self.working, &self.original, self.k, None, &mut self.caches)? {
            info!(k = self.k, "input already meets the k-anonymity threshold");
            return Ok(self.report(start, true));
        }

        if self.total == UNBOUNDED {
            debug!("more states than this machine can count");
        } else {
            debug!(total = self.total, "possible configurations");
        }
        if self.max != UNBOUNDED {
            debug!("non-exhaustive search: results may not be optimal");
        }

        self.search(0, 0)?;

        if self.tables.is_empty() {
            warn!(
                k = self.k,
                "no table satisfying the requested k was found within the state budget"
            );
        }
        Ok(self.report(start, false))
    }

    /// Recursive enumeration over (row, column) cell assignments.
    fn search(&mut self, row: usize, col: usize) -> Result<()> {
        if self.states == self.max {
            return Ok(());
        }
        if col == self.working.columns() {
            return self.score_candidate();
        }
        if self.working.column(col).sensitivity != Sensitivity::Quasi {
            return self.search(row, col + 1);
        }

        let previous = self.working.cell(row, col).to_string();

        // A capped search samples candidates in random order so it does not
        // spend its whole budget exhausting one corner of the space.
        let options = if self.max != UNBOUNDED {
            self.working
                .column(col)
                .mutations(&previous, Some(&mut self.rng))
        } else {
            self.working.column(col).mutations(&previous, None)
        };

        let last_row = self.working.rows() - 1;
        let last_col = self.working.columns() - 1;

        for candidate in options {
            self.bump_state();
            if self.states >= self.max {
                return Ok(());
            }
            self.working.set_cell(row, col, candidate);

            if row < last_row {
                self.search(row + 1, col)?;
            } else {
                // Prefix pruning: the score bound first, then the k test;
                // both must hold for the branch to continue.
                let score = self
                    .metric
                    .score(&self.working, &self.original, &mut self.caches)?;
                if score <= self.best
                    && k_anonymity(
                        &self.working,
                        &self.original,
                        self.k,
                        Some(col),
                        &mut self.caches,
                    )?
                {
                    if col == last_col {
                        self.score_candidate()?;
                    } else {
                        self.search(0, col + 1)?;
                    }
                }
            }

            self.working.set_cell(row, col, previous.clone());
        }
        Ok(())
    }

    /// Score a complete table and fold it into the tied-best set.
    fn score_candidate(&mut self) -> Result<()> {
        self.bump_state();

        let score = self
            .metric
            .score(&self.working, &self.original, &mut self.caches)?;
        if score < self.best {
            self.best = score;
            self.tables.clear();
            self.publish();
        }
        if score == self.best {
            self.tables.push(self.working.clone());
        }
        Ok(())
    }

    fn bump_state(&mut self) {
        self.states += 1;
        if let Some(progress) = &self.progress {
            progress.bump_states();
        }
    }

    fn publish(&self) {
        if let Some(progress) = &self.progress {
            progress.publish(Snapshot {
                best: self.best,
                iteration: self.states,
                total: self.total,
                table: self.working.clone(),
            });
        }
    }

    fn report(mut self, start: Instant, already_anonymous: bool) -> SearchReport {
        self.tables.sort_by(|a, b| a.cmp_cells(b));
        let k_satisfied = already_anonymous || !self.tables.is_empty();
        SearchReport {
            tables: self.tables,
            best: self.best,
            states: self.states,
            total: self.total,
            elapsed: start.elapsed(),
            already_anonymous,
            k_satisfied,
            caches: self.caches,
        }
    }
}
