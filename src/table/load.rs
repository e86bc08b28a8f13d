// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Building tables from delimited text.
//!
//! The first line is the header; every following non-empty line is one
//! record. The delimiter is taken from the options or guessed from the
//! header line (tab, then space, then comma). Column configuration comes
//! as comma-separated code lists; short lists are padded with defaults and
//! surplus entries are ignored.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::hierarchy::Hierarchy;
use crate::table::column::{Column, ColumnType, Sensitivity};
use crate::table::range::Range;
use crate::table::{Table, SUPPRESSED};

/// Column configuration accompanying a table file.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Field separator. `None` guesses from the header line.
    pub delimiter: Option<String>,
    /// Per-column type codes (`s`/`i`), comma separated. Missing entries
    /// default to `s`.
    pub types: Option<String>,
    /// Per-column weights. Missing entries default to `1.0`.
    pub weights: Option<String>,
    /// Per-column sensitivity codes (`q`/`i`/`s`). Missing entries default
    /// to `q`.
    pub sensitivities: Option<String>,
}

impl Table {
    /// Load a table from a file.
    pub fn load(path: &Path, hierarchies: Vec<Hierarchy>, options: &LoadOptions) -> Result<Table> {
        let input = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&input, hierarchies, options)
    }

    /// Parse a table from delimited text.
    pub fn parse(input: &str, hierarchies: Vec<Hierarchy>, options: &LoadOptions) -> Result<Table> {
        let mut lines = input.lines();
        let header_line = lines
            .next()
            .ok_or_else(|| Error::Parse("table input is empty".to_string()))?;

        let delimiter = match &options.delimiter {
            Some(delimiter) => delimiter.clone(),
            None => guess_delimiter(header_line),
        };

        let header: Vec<String> = header_line
            .split(delimiter.as_str())
            .map(str::to_string)
            .collect();

        // One column per header entry; embed a hierarchy when its root name
        // matches the column.
        let mut remaining = hierarchies;
        let mut columns: Vec<Column> = Vec::with_capacity(header.len());
        for name in &header {
            let mut column = Column {
                width: name.len(),
                ..Column::default()
            };
            if let Some(index) = remaining.iter().position(|h| h.name() == name) {
                column.hierarchy = Some(remaining.swap_remove(index));
                debug!(column = %name, "embedded generalization hierarchy");
            }
            columns.push(column);
        }

        let types = padded_codes(options.types.as_deref(), header.len(), "s", "types");
        for (column, code) in columns.iter_mut().zip(&types) {
            column.ty = code
                .parse::<ColumnType>()
                .map_err(|_| Error::Parse(format!("unrecognized type: {}", code)))?;
        }

        let weights = padded_codes(options.weights.as_deref(), header.len(), "1.0", "weights");
        for (column, code) in columns.iter_mut().zip(&weights) {
            column.weight = code
                .parse::<f64>()
                .map_err(|_| Error::Parse(format!("unrecognized weight: {}", code)))?;
        }

        let sensitivities = padded_codes(
            options.sensitivities.as_deref(),
            header.len(),
            "q",
            "sensitivities",
        );
        for (column, code) in columns.iter_mut().zip(&sensitivities) {
            column.sensitivity = code
                .parse::<Sensitivity>()
                .map_err(|_| Error::Parse(format!("unrecognized sensitivity: {}", code)))?;
        }

        // Populate the cells.
        let mut rows = 0;
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(delimiter.as_str()).collect();
            if fields.len() < header.len() {
                return Err(Error::Parse(format!(
                    "record {:?} has {} fields, expected {}",
                    line,
                    fields.len(),
                    header.len()
                )));
            }
            for (x, column) in columns.iter_mut().enumerate() {
                let cell = fields[x];

                // A cell the hierarchy does not know stays in the table; it
                // just cannot be generalized, only suppressed.
                if let Some(hierarchy) = &column.hierarchy {
                    if hierarchy.find(cell).is_empty() {
                        warn!(
                            cell = %cell,
                            hierarchy = %hierarchy.name(),
                            "cell does not exist in the column's hierarchy"
                        );
                    }
                }

                column.data.push(cell.to_string());
                column.unique.insert(cell.to_string());
                column.width = column.width.max(cell.len());
            }
            rows += 1;
        }

        for column in &mut columns {
            generate_ranges(column)?;
        }

        Ok(Table {
            header,
            columns,
            rows,
        })
    }
}

/// Guess the field separator from the header line: tab, then space, then
/// comma; comma when nothing matches (a single-column table).
fn guess_delimiter(header_line: &str) -> String {
    debug!("guessing delimiter; use --delim to provide one explicitly");
    for candidate in ["\t", " ", ","] {
        if header_line.contains(candidate) {
            debug!(
                delimiter = if candidate == "\t" { "tab" } else { candidate },
                "assuming delimiter"
            );
            return candidate.to_string();
        }
    }
    ",".to_string()
}

/// Split a code list and normalize its length to the column count.
fn padded_codes(list: Option<&str>, columns: usize, default: &str, what: &str) -> Vec<String> {
    let mut codes: Vec<String> = match list {
        Some(list) if !list.is_empty() => list.split(',').map(|c| c.trim().to_string()).collect(),
        _ => Vec::new(),
    };
    if codes.len() < columns {
        debug!(
            "missing {} are assumed to be {}; pass them explicitly to override",
            what, default
        );
        while codes.len() < columns {
            codes.push(default.to_string());
        }
    } else if codes.len() > columns {
        debug!("redundant {} are ignored", what);
        codes.truncate(columns);
    }
    codes
}

/// Compute the enumerated range set and the minimal covering range for one
/// column.
///
/// Integer columns pair every two distinct non-suppressed cells; the
/// all-spanning minimal range is kept separately and excluded from the
/// enumerated set. Other columns only record a denominator range sized by
/// their unique-value count.
fn generate_ranges(column: &mut Column) -> Result<()> {
    if column.ty != ColumnType::Integer {
        column.range = Range::new(0, column.unique.len() as u64);
        return Ok(());
    }

    let mut minimal: Option<Range> = None;
    for x in 0..column.data.len() {
        for y in 0..column.data.len() {
            let a = &column.data[x];
            let b = &column.data[y];
            if a == b || a == SUPPRESSED || b == SUPPRESSED {
                continue;
            }

            let range = if a.starts_with('[') {
                Range::parse(a)?
            } else if b.starts_with('[') {
                Range::parse(b)?
            } else {
                Range::new(parse_integer(a)?, parse_integer(b)?)
            };

            match &mut minimal {
                Some(covering) => covering.expand(&range),
                None => minimal = Some(range.clone()),
            }
            column.ranges.insert(range);
        }
    }

    if let Some(minimal) = minimal {
        column.ranges.remove(&minimal);
        column.range = minimal;
    }
    Ok(())
}

fn parse_integer(cell: &str) -> Result<u64> {
    cell.parse::<u64>()
        .map_err(|_| Error::Parse(format!("cell {:?} in an integer column is not an integer", cell)))
}
