// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for the anonymization engine.
//!
//! A single enum covers every failure the engine can surface. Metric and
//! search functions never catch; errors propagate with `?` to the driver,
//! which reports to stderr and exits non-zero.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the anonymization engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening or reading an input file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed hierarchy line, malformed range literal, bad numeric cell,
    /// or an unknown sensitivity/type/metric code.
    #[error("parse error: {0}")]
    Parse(String),

    /// Missing required argument or an unknown mode.
    #[error("configuration error: {0}")]
    Config(String),

    /// A cache slot already holds a different value for the same row prefix.
    #[error("cache collision on row prefix {key:?}")]
    CacheCollision { key: String },

    /// Certainty scoring encountered a cell that is neither unchanged,
    /// suppressed, a hierarchy ancestor, nor a range. Fatal: the working
    /// table or a cache is corrupt.
    #[error("invalid mutation {cell:?} in column {column:?}")]
    InvalidMutation { cell: String, column: String },

    /// Row access past the end of a table.
    #[error("row {row} out of bounds for table with {rows} rows")]
    OutOfBounds { row: usize, rows: usize },
}
