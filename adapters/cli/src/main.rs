#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that levels every grid in a batch of test cases.
//!
//! Input is read from a file or stdin, each case is leveled independently, and
//! one `Case #i: total` line is printed per case in input order.

mod case_input;
mod report;

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;

use crate::{
    case_input::CaseInput,
    report::{CaseReport, SolveOptions},
};

/// Environment variable holding the `env_logger` filter directives.
const LOG_ENV: &str = "RABBIT_HOUSE_LOG";
/// Environment variable controlling coloured log output.
const LOG_STYLE_ENV: &str = "RABBIT_HOUSE_LOG_STYLE";

/// Levels terrain grids so no two neighbouring cells differ by more than one.
#[derive(Debug, Parser)]
#[command(name = "rabbit-house", version, about)]
struct Cli {
    /// Read test cases from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// Number of worker threads used to level independent cases.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    jobs: u16,
    /// Output format for the results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Re-check every leveled grid before reporting it.
    #[arg(long)]
    verify: bool,
    /// Print the leveled grid under each text result line.
    #[arg(long)]
    show_grids: bool,
}

/// Presentation of the batch results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One `Case #i: total` line per case.
    Text,
    /// A single JSON document with per-case details.
    Json,
}

/// Entry point for the Rabbit House command-line interface.
fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    log::debug!("options: {cli:?}");

    let text = read_input(cli.input.as_deref())?;
    let cases = case_input::parse_cases(&text).context("failed to parse test cases")?;
    log::info!("parsed {} cases", cases.len());

    let options = SolveOptions { verify: cli.verify };
    let reports = solve_all(&cases, options, cli.jobs)?;

    let rendered = match cli.format {
        OutputFormat::Text => report::render_text(&reports, cli.show_grids),
        OutputFormat::Json => report::render_json(&reports).context("failed to encode report")?,
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write results")
}

fn init_logging() {
    let env = env_logger::Env::new()
        .filter(LOG_ENV)
        .write_style(LOG_STYLE_ENV);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input from {}", path.display())),
        None => {
            let mut text = String::new();
            let _ = io::stdin()
                .lock()
                .read_to_string(&mut text)
                .context("failed to read input from stdin")?;
            Ok(text)
        }
    }
}

fn solve_all(cases: &[CaseInput], options: SolveOptions, jobs: u16) -> Result<Vec<CaseReport>> {
    let solve = |case: &CaseInput| report::solve_case(case, options);

    if jobs <= 1 {
        return cases
            .iter()
            .map(solve)
            .collect::<Result<Vec<_>, _>>()
            .context("leveled grid failed verification");
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(jobs))
        .build()
        .context("failed to start worker pool")?;
    log::info!("leveling {} cases on {jobs} threads", cases.len());

    pool.install(|| cases.par_iter().map(solve).collect::<Result<Vec<_>, _>>())
        .context("leveled grid failed verification")
}
