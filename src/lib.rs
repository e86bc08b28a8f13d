// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! A k-anonymity table anonymizer.
//!
//! Given a tabular dataset whose columns are classified as
//! quasi-identifier, sensitive, or ignored, the engine produces
//! transformed tables in which every row is indistinguishable from at
//! least k−1 others on the quasi-identifier projection, while minimizing
//! information loss under a configurable distortion metric.
//!
//! # Architecture
//!
//! Cells generalize three ways: suppression (`*`), climbing a per-column
//! [`hierarchy::Hierarchy`], or widening integers into
//! [`table::Range`] intervals. The [`table::Table`] model owns the cell
//! data and enumerates the legal mutations per cell.
//!
//! Two searchers explore the mutation space:
//!
//! 1. **[`search::MinGen`]**: exhaustive depth-first enumeration with
//!    score pruning and k pruning on column prefixes.
//! 2. **[`search::Genetic`]**: a generational population with a two-stage
//!    fitness, elite recombination, and escalating mutation.
//!
//! Both rank candidates through the [`metrics`] module, whose scoring and
//! row-matching kernels are memoized through the prefix-tree caches in
//! [`cache`]. A running search publishes its current best through
//! [`search::Progress`], which a renderer may poll at any cadence.
//!
//! # Caching
//!
//! Searches revisit the same generalized rows constantly, so both the
//! scorers and the k-verifier key their work by row content in a
//! [`cache::PrefixTree`]. Cache keys encode the full row content rather
//! than any table identity, which is what makes the caches safe to share
//! across searches within one process.

pub mod cache;
pub mod error;
pub mod hierarchy;
pub mod metrics;
pub mod render;
pub mod search;
pub mod table;

// Re-export commonly used types
pub use cache::MetricCaches;
pub use error::{Error, Result};
pub use hierarchy::Hierarchy;
pub use metrics::Metric;
pub use search::{Genetic, MinGen, Mode, Progress, SearchReport, Snapshot};
pub use table::Table;
