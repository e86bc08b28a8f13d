// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Prefix-tree caches for row-keyed memoization.
//!
//! Both scoring and k-matching are memoized per row. The key is a row view
//! (the sequence of cell strings), optionally truncated to a column prefix,
//! and rows that share leading cells share trie nodes. Compare the storage
//! to a flat map keyed by joined rows:
//!
//! ```text
//! {1}       = 1          1 = 1
//! {1,2}     = 2         /     \
//! {1,2,3}   = 6    2 = 2       3 = 3
//! {1,3}     = 3   /     \           \
//! {1,2,4}   = 8  3 = 6   4 = 8      4 = 12
//! ```
//!
//! The trie stores each shared prefix once, and a lookup costs at most one
//! comparison per column. Hit and miss counts are kept for the statistics
//! block at the end of a run.
//!
//! The caches never overwrite: a terminal that already holds a different
//! value rejects the insert, because two computations of the same row prefix
//! must agree. Edge labels are owned copies of the cell strings; callers
//! keep ownership of the row views they pass in.

use crate::error::{Error, Result};

/// One node of the prefix tree. The root carries no label.
#[derive(Debug, Clone)]
struct Node<V> {
    key: String,
    value: Option<V>,
    children: Vec<Node<V>>,
}

impl<V> Node<V> {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
            children: Vec::new(),
        }
    }
}

/// A trie keyed by a prefix of a row view, holding one value per terminal.
#[derive(Debug, Clone)]
pub struct PrefixTree<V> {
    root: Node<V>,
    hits: u64,
    misses: u64,
}

impl<V> Default for PrefixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PrefixTree<V> {
    pub fn new() -> Self {
        Self {
            root: Node::new(""),
            hits: 0,
            misses: 0,
        }
    }

    /// Store a value for the first `prefix_len + 1` cells of `row`.
    ///
    /// Storing the same prefix twice with different values is a
    /// [`Error::CacheCollision`]; re-storing an equal value is a no-op.
    pub fn insert(&mut self, row: &[&str], prefix_len: usize, value: V) -> Result<()>
    where
        V: PartialEq,
    {
        let mut node = &mut self.root;
        for cell in &row[..=prefix_len] {
            let position = node.children.iter().position(|c| c.key == *cell);
            let index = match position {
                Some(index) => index,
                None => {
                    node.children.push(Node::new(cell));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }

        match &node.value {
            Some(existing) if *existing != value => Err(Error::CacheCollision {
                key: row[..=prefix_len].join(","),
            }),
            _ => {
                node.value = Some(value);
                Ok(())
            }
        }
    }

    /// Whether a value is stored for this row prefix. Counts a hit or miss.
    pub fn contains(&mut self, row: &[&str], prefix_len: usize) -> bool {
        let found = self.walk(row, prefix_len).is_some();
        if found {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// The value stored for this row prefix, if any. Does not count.
    pub fn get(&self, row: &[&str], prefix_len: usize) -> Option<&V> {
        self.walk(row, prefix_len)
    }

    fn walk(&self, row: &[&str], prefix_len: usize) -> Option<&V> {
        let mut node = &self.root;
        for cell in &row[..=prefix_len] {
            node = node.children.iter().find(|c| c.key == *cell)?;
        }
        node.value.as_ref()
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Total lookups, hits and misses combined.
    #[inline]
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups served from the tree. 0 when never consulted.
    pub fn hit_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.hits as f64 / self.total() as f64
        }
    }
}

/// The memoization layer shared by the metrics: one score cache keyed by
/// full row views, one match cache additionally keyed by a column-prefix
/// length, and the trim counter for k-verifier short-circuits.
///
/// The handle is threaded explicitly through every metric call; disabling
/// it (`--no-cache`) turns all lookups and stores into no-ops and must not
/// change any result.
#[derive(Debug, Clone)]
pub struct MetricCaches {
    score: PrefixTree<f64>,
    matches: PrefixTree<Vec<usize>>,
    enabled: bool,
    trims: u64,
}

impl MetricCaches {
    pub fn new(enabled: bool) -> Self {
        Self {
            score: PrefixTree::new(),
            matches: PrefixTree::new(),
            enabled,
            trims: 0,
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Cached row score for a full row view, if memoized.
    pub fn score_lookup(&mut self, row: &[&str]) -> Option<f64> {
        if !self.enabled || row.is_empty() {
            return None;
        }
        let prefix = row.len() - 1;
        if self.score.contains(row, prefix) {
            self.score.get(row, prefix).copied()
        } else {
            None
        }
    }

    /// Memoize a row score keyed by the full row view.
    pub fn score_store(&mut self, row: &[&str], value: f64) -> Result<()> {
        if !self.enabled || row.is_empty() {
            return Ok(());
        }
        self.score.insert(row, row.len() - 1, value)
    }

    /// Cached match set for a row prefix, if memoized.
    pub fn match_lookup(&mut self, row: &[&str], prefix_len: usize) -> Option<Vec<usize>> {
        if !self.enabled {
            return None;
        }
        if self.matches.contains(row, prefix_len) {
            self.matches.get(row, prefix_len).cloned()
        } else {
            None
        }
    }

    /// Memoize a match set keyed by a row prefix.
    pub fn match_store(&mut self, row: &[&str], prefix_len: usize, value: Vec<usize>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.matches.insert(row, prefix_len, value)
    }

    /// Record one k-verifier short-circuit on an under-matched row.
    pub fn record_trim(&mut self) {
        self.trims += 1;
    }

    #[inline]
    pub fn trims(&self) -> u64 {
        self.trims
    }

    #[inline]
    pub fn score_cache(&self) -> &PrefixTree<f64> {
        &self.score
    }

    #[inline]
    pub fn match_cache(&self) -> &PrefixTree<Vec<usize>> {
        &self.matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&'static str]) -> Vec<&'static str> {
        cells.to_vec()
    }

    #[test]
    fn test_insert_and_get() {
        let mut tree: PrefixTree<f64> = PrefixTree::new();
        let key = row(&["Ann", "25"]);
        tree.insert(&key, 1, 2.0).unwrap();

        assert_eq!(tree.get(&key, 1), Some(&2.0));
        assert_eq!(tree.get(&row(&["Bob", "25"]), 1), None);
    }

    #[test]
    fn test_prefix_lengths_are_distinct_keys() {
        let mut tree: PrefixTree<f64> = PrefixTree::new();
        let key = row(&["Ann", "25"]);
        tree.insert(&key, 0, 1.0).unwrap();
        tree.insert(&key, 1, 2.0).unwrap();

        assert_eq!(tree.get(&key, 0), Some(&1.0));
        assert_eq!(tree.get(&key, 1), Some(&2.0));
    }

    #[test]
    fn test_contains_counts_hits_and_misses() {
        let mut tree: PrefixTree<f64> = PrefixTree::new();
        let key = row(&["Ann", "25"]);

        assert!(!tree.contains(&key, 1));
        tree.insert(&key, 1, 2.0).unwrap();
        assert!(tree.contains(&key, 1));
        assert!(tree.contains(&key, 1));

        assert_eq!(tree.hits(), 2);
        assert_eq!(tree.misses(), 1);
        assert!((tree.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_collision_rejected() {
        let mut tree: PrefixTree<f64> = PrefixTree::new();
        let key = row(&["Ann", "25"]);
        tree.insert(&key, 1, 2.0).unwrap();

        // Same value is a no-op, a different value is a collision.
        assert!(tree.insert(&key, 1, 2.0).is_ok());
        assert!(tree.insert(&key, 1, 3.0).is_err());
    }

    #[test]
    fn test_shared_prefixes_share_nodes() {
        let mut tree: PrefixTree<u64> = PrefixTree::new();
        tree.insert(&row(&["a", "b", "c"]), 2, 1).unwrap();
        tree.insert(&row(&["a", "b", "d"]), 2, 2).unwrap();

        assert_eq!(tree.get(&row(&["a", "b", "c"]), 2), Some(&1));
        assert_eq!(tree.get(&row(&["a", "b", "d"]), 2), Some(&2));
    }

    #[test]
    fn test_disabled_caches_are_inert() {
        let mut caches = MetricCaches::new(false);
        let key = row(&["Ann", "25"]);

        caches.score_store(&key, 2.0).unwrap();
        assert_eq!(caches.score_lookup(&key), None);
        caches.match_store(&key, 1, vec![0]).unwrap();
        assert_eq!(caches.match_lookup(&key, 1), None);
        assert_eq!(caches.score_cache().hits(), 0);
    }

    #[test]
    fn test_metric_caches_round_trip() {
        let mut caches = MetricCaches::new(true);
        let key = row(&["Ann", "25"]);

        assert_eq!(caches.score_lookup(&key), None);
        caches.score_store(&key, 2.0).unwrap();
        assert_eq!(caches.score_lookup(&key), Some(2.0));

        assert_eq!(caches.match_lookup(&key, 0), None);
        caches.match_store(&key, 0, vec![0, 1]).unwrap();
        assert_eq!(caches.match_lookup(&key, 0), Some(vec![0, 1]));
    }
}
