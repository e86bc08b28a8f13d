// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test fixtures shared across integration tests.

#![allow(dead_code)]

use kanon_search::hierarchy::Hierarchy;
use kanon_search::table::{LoadOptions, Table};

/// The job hierarchy used throughout the end-to-end scenarios.
pub const JOB_RULES: &str =
    "Job/Blue Collar: Mechanic, Plumber\nJob/White Collar: Doctor, Lawyer\n";

/// Two people with an ignored name and a quasi integer age.
pub fn ages_table() -> Table {
    Table::parse(
        "name,age\nAnn,25\nBob,27\n",
        Vec::new(),
        &LoadOptions {
            types: Some("s,i".to_string()),
            sensitivities: Some("i,q".to_string()),
            ..LoadOptions::default()
        },
    )
    .expect("fixture table parses")
}

/// Four jobs with the collar hierarchy embedded.
pub fn jobs_table() -> Table {
    let hierarchies = Hierarchy::parse_rules(JOB_RULES).expect("fixture rules parse");
    Table::parse(
        "Job\nMechanic\nPlumber\nDoctor\nLawyer\n",
        hierarchies,
        &LoadOptions::default(),
    )
    .expect("fixture table parses")
}

/// The same four jobs with no hierarchy: only suppression applies.
pub fn jobs_table_plain() -> Table {
    Table::parse(
        "Job\nMechanic\nPlumber\nDoctor\nLawyer\n",
        Vec::new(),
        &LoadOptions::default(),
    )
    .expect("fixture table parses")
}

/// Two men and two women in a single quasi column.
pub fn genders_table() -> Table {
    Table::parse("gender\nM\nM\nF\nF\n", Vec::new(), &LoadOptions::default())
        .expect("fixture table parses")
}
