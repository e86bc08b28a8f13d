// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Distortion metrics and the k-anonymity verifier.
//!
//! Everything here is a pure function of (working table, original table),
//! memoized through the [`MetricCaches`] handle threaded into every call.
//! The caches pay for themselves spectacularly: searches revisit the same
//! generalized rows constantly, and once the caches warm up almost every
//! scoring and matching request is served without recomputation. The
//! `--no-cache` switch exists to watch the difference; results must be
//! identical either way.

pub mod anonymity;
pub mod score;

use strum_macros::{Display, EnumString};

pub use anonymity::{av_k_anonymity, k_anonymity, match_row};
pub use score::{certainty_score, minimal_distortion};

use crate::cache::MetricCaches;
use crate::error::Result;
use crate::table::Table;

/// Which distortion metric ranks candidate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Metric {
    /// Sum of column weights over changed cells.
    #[strum(serialize = "md")]
    MinimalDistortion,
    /// Weighted fractional information loss per generalized cell.
    #[strum(serialize = "c")]
    Certainty,
}

impl Metric {
    /// Score a working table against its original with this metric.
    pub fn score(
        &self,
        working: &Table,
        original: &Table,
        caches: &mut MetricCaches,
    ) -> Result<f64> {
        match self {
            Metric::MinimalDistortion => minimal_distortion(working, original, caches),
            Metric::Certainty => certainty_score(working, original, caches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_codes() {
        assert_eq!("md".parse::<Metric>().unwrap(), Metric::MinimalDistortion);
        assert_eq!("c".parse::<Metric>().unwrap(), Metric::Certainty);
        assert!("x".parse::<Metric>().is_err());
        assert_eq!(Metric::MinimalDistortion.to_string(), "md");
    }
}
