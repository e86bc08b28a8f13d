// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The k-anonymity verifier and its helpers.
//!
//! Verifying k-anonymity takes more than counting per-row matches. The
//! intuitive check matches every generalized row against the original table
//! and requires at least k candidates each, but that admits tables an
//! attacker can still unravel. Consider two men and two women where one
//! man's row is fully suppressed: per row, the suppressed row matches all
//! four originals and every other row matches two, yet anyone reading the
//! released table sees one bare `M`, two bare `F`s and a hole, and fills
//! the hole by elimination.
//!
//! The verifier therefore layers three requirements:
//!
//! 1. Every row has at least k per-row candidates (cheap, short-circuits).
//! 2. Released rows come in groups of at least k with identical
//!    quasi-identifier projections, so every row hides in a crowd of
//!    look-alikes.
//! 3. A backtracking search enumerates every injective assignment of
//!    released rows to original rows; each row must keep at least k
//!    distinct originals across the valid assignments. Rows whose
//!    candidates evaporate once the other rows are bound fail here even
//!    when their per-row count looked fine.

use std::collections::{BTreeSet, HashMap};

use crate::cache::MetricCaches;
use crate::error::Result;
use crate::table::{ColumnType, Range, Sensitivity, Table, SUPPRESSED};

/// Indices of rows in `original` consistent with `row` restricted to
/// columns `0..=prefix_len`.
///
/// Consistency per cell: equal strings match; suppression matches
/// anything; ignored and sensitive columns are skipped; with a hierarchy,
/// cells match when either is an ancestor of the other; a bracketed range
/// in an integer column must contain the original integer. Results are
/// cached per (row prefix, prefix length).
pub fn match_row(
    original: &Table,
    row: &[&str],
    prefix_len: usize,
    caches: &mut MetricCaches,
) -> Result<Vec<usize>> {
    if let Some(cached) = caches.match_lookup(row, prefix_len) {
        return Ok(cached);
    }

    let mut matches = Vec::new();
    for (index, candidate) in original.row_views().enumerate() {
        let mut matched = true;
        for c in 0..=prefix_len {
            let ours = row[c];
            let theirs = candidate[c];

            if ours == theirs || ours == SUPPRESSED {
                continue;
            }

            let column = original.column(c);
            if column.sensitivity != Sensitivity::Quasi {
                continue;
            }

            if let Some(hierarchy) = &column.hierarchy {
                if hierarchy.find(ours).contains(&theirs)
                    || hierarchy.find(theirs).contains(&ours)
                {
                    continue;
                }
            } else if column.ty == ColumnType::Integer && ours.starts_with('[') {
                let range = Range::parse(ours)?;
                if theirs.parse::<u64>().map(|v| range.contains(v)).unwrap_or(false) {
                    continue;
                }
            }

            matched = false;
            break;
        }
        if matched {
            matches.push(index);
        }
    }

    caches.match_store(row, prefix_len, matches.clone())?;
    Ok(matches)
}

/// Whether `working` is k-anonymous against `original` on columns
/// `0..=prefix_len` (the whole table when `prefix_len` is `None`).
///
/// Checking a column prefix is what makes search pruning possible: a row
/// that is identifiable from a subset of the columns stays identifiable no
/// matter how the remaining columns are generalized, so the prefix verdict
/// can only get worse as columns are added.
pub fn k_anonymity(
    working: &Table,
    original: &Table,
    k: usize,
    prefix_len: Option<usize>,
    caches: &mut MetricCaches,
) -> Result<bool> {
    let prefix = prefix_len.unwrap_or(working.columns() - 1);

    let mut matches = Vec::with_capacity(working.rows());
    for row in working.row_views() {
        let row_matches = match_row(original, &row, prefix, caches)?;
        if row_matches.len() < k {
            caches.record_trim();
            return Ok(false);
        }
        matches.push(row_matches);
    }

    if !projection_groups_hold(working, prefix, k) {
        return Ok(false);
    }

    let candidates = assignment_candidates(&matches);
    Ok(candidates.iter().all(|set| set.len() >= k))
}

/// Average per-row candidate count under valid global assignments.
///
/// The continuous sibling of [`k_anonymity`]: instead of a verdict it
/// reports how close the table is, which gives an evolutionary search a
/// gradient to climb while strict k-anonymity is still out of reach.
pub fn av_k_anonymity(
    working: &Table,
    original: &Table,
    prefix_len: Option<usize>,
    caches: &mut MetricCaches,
) -> Result<f64> {
    let prefix = prefix_len.unwrap_or(working.columns() - 1);

    let mut matches = Vec::with_capacity(working.rows());
    for row in working.row_views() {
        matches.push(match_row(original, &row, prefix, caches)?);
    }

    let candidates = assignment_candidates(&matches);
    let total: usize = candidates.iter().map(|set| set.len()).sum();
    Ok(total as f64 / candidates.len() as f64)
}

/// Group rows by their quasi-identifier projection on columns
/// `0..=prefix_len`; every group must reach size k.
fn projection_groups_hold(working: &Table, prefix_len: usize, k: usize) -> bool {
    let mut groups: HashMap<Vec<&str>, usize> = HashMap::new();
    for row in working.row_views() {
        let key: Vec<&str> = (0..=prefix_len)
            .filter(|&c| working.column(c).sensitivity == Sensitivity::Quasi)
            .map(|c| row[c])
            .collect();
        *groups.entry(key).or_insert(0) += 1;
    }
    groups.values().all(|&count| count >= k)
}

/// Enumerate every injective assignment of working rows to original rows
/// and collect, per working row, the set of originals it can take.
fn assignment_candidates(matches: &[Vec<usize>]) -> Vec<BTreeSet<usize>> {
    let mut candidates = vec![BTreeSet::new(); matches.len()];
    let mut chosen = Vec::with_capacity(matches.len());
    assign(matches, &mut chosen, &mut candidates);
    candidates
}

fn assign(matches: &[Vec<usize>], chosen: &mut Vec<usize>, candidates: &mut [BTreeSet<usize>]) {
    if chosen.len() == matches.len() {
        for (row, &pick) in chosen.iter().enumerate() {
            candidates[row].insert(pick);
        }
        return;
    }

    let row = chosen.len();
    for index in 0..matches[row].len() {
        let option = matches[row][index];
        if !chosen.contains(&option) {
            chosen.push(option);
            assign(matches, chosen, candidates);
            chosen.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Hierarchy;
    use crate::table::LoadOptions;

    fn genders() -> Table {
        Table::parse("gender\nM\nM\nF\nF\n", Vec::new(), &LoadOptions::default()).unwrap()
    }

    fn jobs() -> Table {
        let hierarchies = Hierarchy::parse_rules(
            "Job/Blue Collar: Mechanic, Plumber\nJob/White Collar: Doctor, Lawyer\n",
        )
        .unwrap();
        Table::parse(
            "Job\nMechanic\nPlumber\nDoctor\nLawyer\n",
            hierarchies,
            &LoadOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_match_row_equality_and_suppression() {
        let original = genders();
        let mut caches = MetricCaches::new(false);

        assert_eq!(match_row(&original, &["M"], 0, &mut caches).unwrap(), vec![0, 1]);
        assert_eq!(match_row(&original, &["F"], 0, &mut caches).unwrap(), vec![2, 3]);
        assert_eq!(
            match_row(&original, &["*"], 0, &mut caches).unwrap(),
            vec![0, 1, 2, 3]
        );
        assert!(match_row(&original, &["X"], 0, &mut caches).unwrap().is_empty());
    }

    #[test]
    fn test_match_row_hierarchy_ancestors() {
        let original = jobs();
        let mut caches = MetricCaches::new(false);

        // An ancestor matches every trade below it.
        assert_eq!(
            match_row(&original, &["Blue Collar"], 0, &mut caches).unwrap(),
            vec![0, 1]
        );
        assert_eq!(
            match_row(&original, &["White Collar"], 0, &mut caches).unwrap(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_match_row_ranges() {
        let original = Table::parse(
            "age\n25\n27\n30\n",
            Vec::new(),
            &LoadOptions {
                types: Some("i".to_string()),
                ..LoadOptions::default()
            },
        )
        .unwrap();
        let mut caches = MetricCaches::new(false);

        assert_eq!(
            match_row(&original, &["[25-27]"], 0, &mut caches).unwrap(),
            vec![0, 1]
        );
        assert_eq!(
            match_row(&original, &["[25-30]"], 0, &mut caches).unwrap(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_match_row_skips_non_quasi_columns() {
        let original = Table::parse(
            "name,age\nAnn,25\nBob,27\n",
            Vec::new(),
            &LoadOptions {
                sensitivities: Some("i,q".to_string()),
                ..LoadOptions::default()
            },
        )
        .unwrap();
        let mut caches = MetricCaches::new(false);

        // The mismatching ignored name never disqualifies a row.
        assert_eq!(
            match_row(&original, &["Zoe", "25"], 1, &mut caches).unwrap(),
            vec![0]
        );
    }

    #[test]
    fn test_unchanged_duplicates_are_anonymous() {
        let original = genders();
        let working = original.clone();
        let mut caches = MetricCaches::new(false);

        assert!(k_anonymity(&working, &original, 2, None, &mut caches).unwrap());
        assert!(!k_anonymity(&working, &original, 3, None, &mut caches).unwrap());
    }

    #[test]
    fn test_suppressed_male_trap_fails() {
        let original = genders();
        let mut working = original.clone();
        working.set_cell(0, 0, SUPPRESSED.to_string());
        let mut caches = MetricCaches::new(false);

        // Per-row counting alone would pass: the hole matches all four
        // originals and every other row matches two. The released table
        // still exposes the suppressed man by elimination.
        assert!(!k_anonymity(&working, &original, 2, None, &mut caches).unwrap());
    }

    #[test]
    fn test_fully_suppressed_column_is_anonymous() {
        let original = genders();
        let mut working = original.clone();
        for row in 0..4 {
            working.set_cell(row, 0, SUPPRESSED.to_string());
        }
        let mut caches = MetricCaches::new(false);

        assert!(k_anonymity(&working, &original, 2, None, &mut caches).unwrap());
        assert!(k_anonymity(&working, &original, 4, None, &mut caches).unwrap());
    }

    #[test]
    fn test_undermatched_row_trims() {
        let original = genders();
        let mut working = original.clone();
        working.set_cell(0, 0, "X".to_string());
        let mut caches = MetricCaches::new(false);

        assert!(!k_anonymity(&working, &original, 2, None, &mut caches).unwrap());
        assert_eq!(caches.trims(), 1);
    }

    #[test]
    fn test_forced_assignment_fails() {
        // Three ages released as ([25-27], [25-27], [25-30]): the last row
        // looks like it matches all three originals, but rows 0 and 1
        // always consume 25 and 27, leaving 30 pinned to the wide range.
        let original = Table::parse(
            "age\n25\n27\n30\n",
            Vec::new(),
            &LoadOptions {
                types: Some("i".to_string()),
                ..LoadOptions::default()
            },
        )
        .unwrap();
        let mut working = original.clone();
        working.set_cell(0, 0, "[25-27]".to_string());
        working.set_cell(1, 0, "[25-27]".to_string());
        working.set_cell(2, 0, "[25-30]".to_string());
        let mut caches = MetricCaches::new(false);

        assert!(!k_anonymity(&working, &original, 2, None, &mut caches).unwrap());
    }

    #[test]
    fn test_generalized_jobs_are_anonymous() {
        let original = jobs();
        let mut working = original.clone();
        working.set_cell(0, 0, "Blue Collar".to_string());
        working.set_cell(1, 0, "Blue Collar".to_string());
        working.set_cell(2, 0, "White Collar".to_string());
        working.set_cell(3, 0, "White Collar".to_string());
        let mut caches = MetricCaches::new(false);

        assert!(k_anonymity(&working, &original, 2, None, &mut caches).unwrap());
    }

    #[test]
    fn test_average_k() {
        let original = genders();
        let working = original.clone();
        let mut caches = MetricCaches::new(false);

        let average = av_k_anonymity(&working, &original, None, &mut caches).unwrap();
        assert!((average - 2.0).abs() < 1e-9);

        let mut suppressed = original.clone();
        for row in 0..4 {
            suppressed.set_cell(row, 0, SUPPRESSED.to_string());
        }
        let average = av_k_anonymity(&suppressed, &original, None, &mut caches).unwrap();
        assert!((average - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_cache_transparency_for_k() {
        let original = jobs();
        let mut working = original.clone();
        working.set_cell(0, 0, "Blue Collar".to_string());
        working.set_cell(1, 0, "Blue Collar".to_string());
        working.set_cell(2, 0, "White Collar".to_string());
        working.set_cell(3, 0, "White Collar".to_string());

        let mut cold = MetricCaches::new(false);
        let mut warm = MetricCaches::new(true);

        let without = k_anonymity(&working, &original, 2, None, &mut cold).unwrap();
        let first = k_anonymity(&working, &original, 2, None, &mut warm).unwrap();
        let second = k_anonymity(&working, &original, 2, None, &mut warm).unwrap();
        assert_eq!(without, first);
        assert_eq!(without, second);
    }
}
