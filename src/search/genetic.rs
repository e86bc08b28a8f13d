// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Generational evolutionary search.
//!
//! The exhaustive search cannot touch tables whose mutation space runs into
//! the billions, so this searcher evolves a population instead: random
//! tables are bred, scored, and culled for a fixed number of generations.
//!
//! # Fitness
//!
//! Two regimes, because k-anonymity is a hard constraint while distortion
//! is merely minimized. A table that is not yet k-anonymous is scored by
//! its average per-row anonymity divided by k, which stays below 1 and
//! gives evolution a gradient toward feasibility. A k-anonymous table is
//! scored by `k · cells / distortion`, which is always above 1, so any
//! feasible table dominates every infeasible one. Capping the numerator at
//! the requested k stops the population from chasing ever-higher anonymity
//! the user never asked for.
//!
//! # Recombination and escalation
//!
//! Children inherit each quasi cell from one of two parents, with a roll
//! above 100 (out of `100 + mutation_rate`) replacing the cell by a random
//! generalization of the ORIGINAL cell, sampled from the full mutation
//! set rather than the narrower space of an already-generalized value.
//! Every tenth of the run the mutation rate doubles: the elites survive
//! each generation untouched, so late-stage mutation can go wild re-rolling
//! whole tables to jump out of local optima without ever losing the best
//! candidate found.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::cache::MetricCaches;
use crate::error::Result;
use crate::metrics::{av_k_anonymity, k_anonymity, Metric};
use crate::search::progress::{Progress, Snapshot};
use crate::search::SearchReport;
use crate::table::{Sensitivity, Table, UNBOUNDED};

/// How many of the top scorers survive into the next generation and breed.
const DEFAULT_CUTOFF: usize = 10;

/// A population member: a candidate table and its fitness.
#[derive(Debug, Clone)]
struct Instance {
    fitness: f64,
    table: Table,
}

/// The evolutionary searcher. Construct, then call [`Genetic::run`].
#[derive(Debug)]
pub struct Genetic {
    original: Table,
    k: usize,
    metric: Metric,
    generations: u64,
    population: usize,
    mutation_rate: u64,
    cutoff: usize,
    caches: MetricCaches,
    rng: StdRng,
    progress: Option<Progress>,
    states: u64,
    total: u64,
    /// Total cell count, the fixed numerator boost in the feasible regime.
    cells: f64,
}

impl Genetic {
    pub fn new(
        original: Table,
        k: usize,
        metric: Metric,
        generations: u64,
        population: usize,
        mutation_rate: u64,
        caches: MetricCaches,
        rng: StdRng,
    ) -> Self {
        let population = population.max(1);
        let cells = (original.columns() * original.rows()) as f64;
        Self {
            original,
            k,
            metric,
            generations,
            population,
            mutation_rate,
            cutoff: DEFAULT_CUTOFF.min(population),
            caches,
            rng,
            progress: None,
            states: 0,
            total: 0,
            cells,
        }
    }

    /// Attach a progress handle; snapshots are only published when one is
    /// attached.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Evolve for the configured number of generations and return every
    /// table tied at the top fitness.
    pub fn run(mut self) -> Result<SearchReport> {
        let start = Instant::now();
        self.total = self.original.distinct_states();
        if self.total == UNBOUNDED {
            debug!("more states than this machine can count");
        } else {
            debug!(total = self.total, "possible configurations");
        }

        info!(population = self.population, "generating random tables");
        let mut generation: Vec<Instance> = Vec::with_capacity(self.population);
        for _ in 0..self.population {
            let table = self.original.random(&mut self.rng);
            let fitness = self.fitness(&table)?;
            generation.push(Instance { fitness, table });
        }
        sort_by_fitness(&mut generation);
        self.publish(&generation[0], 0);

        let tenth = (self.generations / 10).max(1);
        let mut mutation_rate = self.mutation_rate;
        let offspring = (self.population - self.cutoff) / self.cutoff;

        for iter in 0..self.generations {
            if (iter + 1) % tenth == 0 {
                mutation_rate *= 2;
                self.publish(&generation[0], iter + 1);
            }

            let mut children: Vec<Instance> = Vec::with_capacity(self.population);
            for x in 0..self.cutoff {
                // The elite survives unchanged; its brood accumulates
                // recombination on a working copy.
                children.push(generation[x].clone());
                self.bump_state();

                let mut current = generation[x].clone();
                for _ in 0..offspring {
                    self.bump_state();
                    let partner = self.rng.gen_range(0..self.cutoff);
                    self.combine(&mut current.table, &generation[partner].table, mutation_rate);
                    current.fitness = self.fitness(&current.table)?;
                    children.push(current.clone());
                }
            }

            sort_by_fitness(&mut children);
            generation = children;
        }

        self.report(start, generation)
    }

    /// Two-stage fitness; see the module documentation.
    fn fitness(&mut self, table: &Table) -> Result<f64> {
        if k_anonymity(table, &self.original, self.k, None, &mut self.caches)? {
            let score = self
                .metric
                .score(table, &self.original, &mut self.caches)?;
            Ok((self.k as f64 * self.cells) / score)
        } else {
            Ok(av_k_anonymity(table, &self.original, None, &mut self.caches)? / self.k as f64)
        }
    }

    /// Recombine `second` into `first` cell by cell.
    fn combine(&mut self, first: &mut Table, second: &Table, mutation_rate: u64) {
        for col in 0..self.original.columns() {
            if self.original.column(col).sensitivity != Sensitivity::Quasi {
                continue;
            }
            for row in 0..self.original.rows() {
                let roll = self.rng.gen_range(0..=(100 + mutation_rate));
                if roll > 100 {
                    let source = self.original.cell(row, col).to_string();
                    let mut options = self
                        .original
                        .column(col)
                        .mutations(&source, Some(&mut self.rng));
                    first.set_cell(row, col, options.swap_remove(0));
                } else if roll < 50 {
                    first.set_cell(row, col, second.cell(row, col).to_string());
                }
            }
        }
    }

    fn bump_state(&mut self) {
        self.states += 1;
        if let Some(progress) = &self.progress {
            progress.bump_states();
        }
    }

    fn publish(&self, top: &Instance, iteration: u64) {
        if let Some(progress) = &self.progress {
            progress.publish(Snapshot {
                best: top.fitness,
                iteration,
                total: self.total,
                table: top.table.clone(),
            });
        }
    }

    fn report(mut self, start: Instant, generation: Vec<Instance>) -> Result<SearchReport> {
        let top_fitness = generation[0].fitness;
        let mut tables: Vec<Table> = generation
            .into_iter()
            .take_while(|instance| instance.fitness == top_fitness)
            .map(|instance| instance.table)
            .collect();
        tables.sort_by(|a, b| a.cmp_cells(b));

        let best_table = &tables[0];
        let k_satisfied =
            k_anonymity(best_table, &self.original, self.k, None, &mut self.caches)?;
        if !k_satisfied {
            warn!(
                k = self.k,
                "result is not k-anonymous; increase iterations or population size"
            );
        }
        let best = self
            .metric
            .score(best_table, &self.original, &mut self.caches)?;

        Ok(SearchReport {
            tables,
            best,
            states: self.states,
            total: self.total,
            elapsed: start.elapsed(),
            already_anonymous: false,
            k_satisfied,
            caches: self.caches,
        })
    }
}

/// Descending by fitness: the fittest first, duplicates allowed.
fn sort_by_fitness(generation: &mut [Instance]) {
    generation.sort_by(|a, b| {
        b.fitness
            .partial_cmp(&a.fitness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
