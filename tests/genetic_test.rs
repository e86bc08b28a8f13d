// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! End-to-end scenarios for the evolutionary searcher.

mod common;

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use kanon_search::cache::MetricCaches;
use kanon_search::metrics::{k_anonymity, Metric};
use kanon_search::search::{Genetic, Progress};

#[test]
fn test_reaches_k_on_the_job_table() {
    // No assertion on optimality, only on feasibility: the result must be
    // 2-anonymous against the original.
    let original = common::jobs_table();
    let report = Genetic::new(
        original.clone(),
        2,
        Metric::Certainty,
        200,
        50,
        10,
        MetricCaches::new(true),
        StdRng::seed_from_u64(42),
    )
    .run()
    .expect("search completes");

    assert!(report.k_satisfied);
    let mut caches = MetricCaches::new(false);
    assert!(k_anonymity(&report.tables[0], &original, 2, None, &mut caches)
        .expect("verifier runs"));
}

#[test]
fn test_population_size_is_preserved() {
    let report = Genetic::new(
        common::genders_table(),
        2,
        Metric::MinimalDistortion,
        10,
        40,
        10,
        MetricCaches::new(true),
        StdRng::seed_from_u64(9),
    )
    .run()
    .expect("search completes");

    // Ten elites each contribute themselves plus three offspring per
    // generation: states count one touch per member.
    assert_eq!(report.states, 10 * 40);
}

#[test]
fn test_published_fitness_never_worsens() {
    let progress = Progress::new();
    let observer = progress.clone();

    let searcher = Genetic::new(
        common::jobs_table(),
        2,
        Metric::Certainty,
        300,
        50,
        10,
        MetricCaches::new(true),
        StdRng::seed_from_u64(7),
    )
    .with_progress(progress);

    let handle = thread::spawn(move || searcher.run());
    let mut observed = Vec::new();
    while !handle.is_finished() {
        if let Some(snapshot) = observer.read() {
            observed.push(snapshot.best);
        }
        thread::sleep(Duration::from_millis(1));
    }
    handle
        .join()
        .expect("worker does not panic")
        .expect("search completes");

    // Elites survive every generation, so the top fitness is monotone.
    for pair in observed.windows(2) {
        assert!(pair[1] >= pair[0], "fitness worsened: {pair:?}");
    }
}
