// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Shared progress state between a searcher and its renderer.
//!
//! The searcher runs on a dedicated worker thread while the caller polls at
//! its own cadence, so the two sides share a handle: a lock-free state
//! counter bumped on every explored state, and a mutex-guarded snapshot of
//! the current best. Writers replace the whole snapshot, readers clone it,
//! and missed updates are fine; within one search the published snapshots
//! are monotone in both iteration and score.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::table::Table;

/// One published view of a running search.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Best score so far: a distortion for the exhaustive search (smaller
    /// is better), a fitness for the evolutionary one (larger is better).
    pub best: f64,
    /// States explored or generations completed when this was published.
    pub iteration: u64,
    /// Upper bound on the search space, [`crate::table::UNBOUNDED`] when
    /// uncountable.
    pub total: u64,
    /// A clone of the current best table.
    pub table: Table,
}

/// Cloneable handle to the shared progress state.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    states: AtomicU64,
    snapshot: Mutex<Option<Snapshot>>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one explored state.
    #[inline]
    pub fn bump_states(&self) {
        self.inner.states.fetch_add(1, Ordering::Relaxed);
    }

    /// States explored so far.
    #[inline]
    pub fn states(&self) -> u64 {
        self.inner.states.load(Ordering::Relaxed)
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        if let Ok(mut guard) = self.inner.snapshot.lock() {
            *guard = Some(snapshot);
        }
    }

    /// Clone the most recent snapshot, if any was published yet.
    pub fn read(&self) -> Option<Snapshot> {
        match self.inner.snapshot.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }
}
