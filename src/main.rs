// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Command-line driver for the anonymization engine.
//!
//! Loads the table and optional hierarchies, dispatches to the chosen
//! searcher, and prints the ranked results followed by a statistics block.
//! By default the searcher runs on a worker thread while this thread polls
//! its progress snapshot; `--single-thread` keeps everything on the
//! calling thread and drops the live view.

use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use kanon_search::cache::MetricCaches;
use kanon_search::error::{Error, Result};
use kanon_search::hierarchy::Hierarchy;
use kanon_search::metrics::Metric;
use kanon_search::render;
use kanon_search::search::{Genetic, MinGen, Mode, Progress, SearchReport};
use kanon_search::table::{LoadOptions, Table};

/// Poll cadence for the live progress view.
const FRAME: Duration = Duration::from_millis(17);

/// Anonymize a table to k-anonymity with minimal information loss.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Search mode: mg (exhaustive with pruning) or ga (evolutionary).
    #[arg(long, short = 'e')]
    mode: Option<String>,

    /// The table file.
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Per-column sensitivity codes (q=quasi, i=ignored, s=sensitive);
    /// trailing columns default to q.
    #[arg(long, short = 's')]
    sensitivities: Option<String>,

    /// Hierarchy rules file.
    #[arg(long)]
    domains: Option<PathBuf>,

    /// Field delimiter; guessed from the header line when omitted.
    #[arg(long, short = 'd')]
    delim: Option<String>,

    /// Per-column type codes (s=string, i=integer); default s.
    #[arg(long, short = 't')]
    types: Option<String>,

    /// Per-column weights; default 1.0. Higher weights dissuade the search
    /// from changing the column.
    #[arg(long, short = 'w')]
    weights: Option<String>,

    /// Scoring metric: md (minimal distortion) or c (certainty).
    #[arg(long, short = 'm', default_value = "md")]
    metric: String,

    /// The k value for k-anonymity.
    #[arg(long, short = 'k', default_value_t = 2)]
    k: usize,

    /// State budget (mg) or generation count (ga). Negative or omitted
    /// means exhaustive for mg and 1000 for ga.
    #[arg(long, short = 'r', allow_hyphen_values = true)]
    iterations: Option<i64>,

    /// Size of each generation (ga only).
    #[arg(long, short = 'p', default_value_t = 100)]
    population: usize,

    /// Base mutation rate, added on top of a 0-100 roll (ga only).
    #[arg(long, default_value_t = 10)]
    mutation_rate: u64,

    /// Run on the calling thread; disables the live progress view.
    #[arg(long)]
    single_thread: bool,

    /// Disable the metric caches.
    #[arg(long, short = 'c')]
    no_cache: bool,

    /// Verbose logging.
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(cli) {
        eprintln!("{error}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mode = cli
        .mode
        .as_deref()
        .ok_or_else(|| Error::Config("--mode is required".to_string()))?
        .parse::<Mode>()
        .map_err(|_| Error::Config("unknown mode; use mg or ga".to_string()))?;
    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| Error::Config("--input is required".to_string()))?;
    let sensitivities = cli
        .sensitivities
        .clone()
        .ok_or_else(|| Error::Config("--sensitivities is required".to_string()))?;
    let metric = cli
        .metric
        .parse::<Metric>()
        .map_err(|_| Error::Parse(format!("unrecognized metric: {}", cli.metric)))?;

    let hierarchies = match &cli.domains {
        Some(path) => Hierarchy::load(path)?,
        None => Vec::new(),
    };
    let options = LoadOptions {
        delimiter: cli.delim.clone(),
        types: cli.types.clone(),
        weights: cli.weights.clone(),
        sensitivities: Some(sensitivities),
    };
    let table = Table::load(input, hierarchies, &options)?;

    // One wall-clock seed per process; every random draw flows from it.
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0);
    let rng = StdRng::seed_from_u64(seed);
    let caches = MetricCaches::new(!cli.no_cache);

    let progress = Progress::new();
    let report = match mode {
        Mode::MinGen => {
            let max = cli.iterations.and_then(|n| u64::try_from(n).ok());
            let mut searcher = MinGen::new(table, cli.k, metric, max, caches, rng);
            if !cli.single_thread {
                searcher = searcher.with_progress(progress.clone());
            }
            drive(cli.single_thread, progress, false, move || searcher.run())?
        }
        Mode::Genetic => {
            let generations = cli
                .iterations
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(1000);
            let mut searcher = Genetic::new(
                table,
                cli.k,
                metric,
                generations,
                cli.population,
                cli.mutation_rate,
                caches,
                rng,
            );
            if !cli.single_thread {
                searcher = searcher.with_progress(progress.clone());
            }
            drive(cli.single_thread, progress, true, move || searcher.run())?
        }
    };

    print!("{}", render::results(&report));
    if !report.k_satisfied {
        println!(
            "WARNING: result does not meet {}-anonymity; increase iterations or population size",
            cli.k
        );
    }
    Ok(())
}

/// Run the worker inline or on a background thread with a polling view.
fn drive<F>(
    single_thread: bool,
    progress: Progress,
    larger_is_better: bool,
    worker: F,
) -> Result<SearchReport>
where
    F: FnOnce() -> Result<SearchReport> + Send + 'static,
{
    if single_thread {
        return worker();
    }

    let handle = thread::spawn(worker);

    // Re-render only when the best score moves; missed snapshots are fine.
    let mut last_best: Option<f64> = None;
    while !handle.is_finished() {
        thread::sleep(FRAME);
        if let Some(snapshot) = progress.read() {
            if last_best != Some(snapshot.best) {
                last_best = Some(snapshot.best);
                println!(
                    "{}",
                    render::progress_frame(&snapshot, progress.states(), larger_is_better)
                );
            }
        }
    }

    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
