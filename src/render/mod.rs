// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Plain-text rendering of tables, progress frames, and run statistics.
//!
//! Tables print Markdown-style with right-aligned cells padded to each
//! column's width; callers refresh widths first, since searches let them go
//! stale. The statistics block summarizes a finished run: states explored,
//! pruning factor for exhaustive runs, timing, cache telemetry, and the
//! size of the tied-best set.

use std::fmt::Write;

use crate::search::{Snapshot, SearchReport};
use crate::table::{Table, UNBOUNDED};

/// Render a table Markdown-style. Widths must be current.
pub fn table_markdown(table: &Table) -> String {
    let mut out = String::new();

    let mut header = String::new();
    for (name, width) in table
        .header()
        .iter()
        .zip((0..table.columns()).map(|c| table.column(c).width))
    {
        let _ = write!(header, "| {:>width$} ", name, width = width);
    }
    header.push_str(" |");

    out.push_str(&header);
    out.push('\n');
    out.push_str(&"#".repeat(header.len()));
    out.push('\n');

    for row in table.row_views() {
        for (c, cell) in row.iter().enumerate() {
            let _ = write!(out, "| {:>width$} ", cell, width = table.column(c).width);
        }
        out.push_str(" |\n");
    }
    out
}

/// One live progress frame for the background-worker poll loop.
pub fn progress_frame(snapshot: &Snapshot, states: u64, larger_is_better: bool) -> String {
    let mut out = String::new();

    if snapshot.total == UNBOUNDED {
        let _ = writeln!(out, "States: {}", states);
    } else {
        let _ = writeln!(out, "States: {}/{}", states, snapshot.total);
        let _ = writeln!(out, "Note: the upper bound does not account for pruning!");
    }
    let _ = writeln!(
        out,
        "Score ({} is better): {}",
        if larger_is_better { "larger" } else { "smaller" },
        snapshot.best
    );

    let mut table = snapshot.table.clone();
    table.update_widths();
    out.push_str(&table_markdown(&table));
    out
}

/// The final results: every tied-best table followed by the statistics.
pub fn results(report: &SearchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "===RESULTS===");

    for table in &report.tables {
        let mut table = table.clone();
        table.update_widths();
        out.push_str(&table_markdown(&table));
        out.push('\n');
    }

    out.push_str(&stats_block(report));
    out
}

/// The statistics block printed after the tables.
pub fn stats_block(report: &SearchReport) -> String {
    let mut out = String::new();

    if report.total != UNBOUNDED && report.states > 0 && report.states < report.total {
        let _ = writeln!(
            out,
            "Pruning reduced searched nodes to {}, reducing total search by a factor of {}",
            report.states,
            report.total / report.states
        );
    } else {
        let _ = writeln!(out, "Nodes reached: {}", report.states);
    }

    let _ = writeln!(out, "Execution time: {:?}", report.elapsed);
    if report.states > 0 {
        let per_state = report.elapsed.as_nanos() as f64 / report.states as f64;
        let _ = writeln!(out, "Speed: {:.0}ns per state", per_state);
    }

    let matches = report.caches.match_cache();
    let _ = writeln!(
        out,
        "Hits to the k-anonymity cache: {} with rate of {:.2} ({} trims)",
        matches.hits(),
        matches.hit_rate(),
        report.caches.trims()
    );
    let score = report.caches.score_cache();
    let _ = writeln!(
        out,
        "Hits to the score cache: {} with rate of {:.2}",
        score.hits(),
        score.hit_rate()
    );

    let _ = writeln!(
        out,
        "Instances with best score of {}: {}",
        report.best,
        report.tables.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::LoadOptions;

    #[test]
    fn test_table_markdown_alignment() {
        let mut table = Table::parse(
            "name,age\nAnn,25\nBob,27\n",
            Vec::new(),
            &LoadOptions {
                delimiter: Some(",".to_string()),
                ..LoadOptions::default()
            },
        )
        .unwrap();
        table.update_widths();

        let rendered = table_markdown(&table);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "| name | age  |");
        assert!(lines[1].chars().all(|c| c == '#'));
        assert_eq!(lines[1].len(), lines[0].len());
        assert_eq!(lines[2], "|  Ann |  25  |");
        assert_eq!(lines[3], "|  Bob |  27  |");
    }
}
