// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The two distortion metrics.
//!
//! Both scores strictly increase with every change, so an unchanged table
//! scores 0 and lower is always better. Row scores are memoized through the
//! score cache: rows are keyed by their full cell content, so a row that
//! reappears anywhere (the common case once a search revisits a column) is
//! served without rescoring.

use crate::cache::MetricCaches;
use crate::error::{Error, Result};
use crate::table::{ColumnType, Range, Table, SUPPRESSED};

/// Sum over changed cells of the column weight.
pub fn minimal_distortion(
    working: &Table,
    original: &Table,
    caches: &mut MetricCaches,
) -> Result<f64> {
    let mut score = 0.0;

    for (r, row) in working.row_views().enumerate() {
        if let Some(cached) = caches.score_lookup(&row) {
            score += cached;
            continue;
        }

        let mut row_score = 0.0;
        for (c, cell) in row.iter().enumerate() {
            if *cell != original.cell(r, c) {
                row_score += working.column(c).weight;
            }
        }

        caches.score_store(&row, row_score)?;
        score += row_score;
    }
    Ok(score)
}

/// Weighted fractional information loss per generalized cell.
///
/// An unchanged cell costs nothing; a suppressed cell costs its full
/// weight; a hierarchy generalization costs the branching factor at the
/// ancestor over the column's unique-value count; a range costs its width
/// over the width of the column's minimal covering range. Any other cell
/// content is unclassifiable and fatal, because it means the working table
/// or a cache has been corrupted.
pub fn certainty_score(
    working: &Table,
    original: &Table,
    caches: &mut MetricCaches,
) -> Result<f64> {
    let mut score = 0.0;

    for (r, row) in working.row_views().enumerate() {
        if let Some(cached) = caches.score_lookup(&row) {
            score += cached;
            continue;
        }

        let mut row_score = 0.0;
        for (c, cell) in row.iter().enumerate() {
            if *cell == original.cell(r, c) {
                continue;
            }
            let column = working.column(c);

            let generalized = column.hierarchy.as_ref().and_then(|hierarchy| {
                let breadth = hierarchy.breadth(cell);
                (breadth != 0).then(|| breadth as f64 / column.unique.len() as f64)
            });

            let cell_score = if *cell == SUPPRESSED {
                1.0
            } else if let Some(ratio) = generalized {
                ratio
            } else if column.ty == ColumnType::Integer && cell.starts_with('[') {
                Range::parse(cell)?.width() as f64 / column.range.width() as f64
            } else {
                return Err(Error::InvalidMutation {
                    cell: cell.to_string(),
                    column: working.header()[c].clone(),
                });
            };

            row_score += cell_score * original.column(c).weight;
        }

        caches.score_store(&row, row_score)?;
        score += row_score;
    }
    Ok(score)
}
