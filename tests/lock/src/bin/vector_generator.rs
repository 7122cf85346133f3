//! Writes a conformance vector directory.
//!
//! Usage: `vector_generator --out <dir> [--seed N] [--items N] [--scenario NAME]...`
//!        `vector_generator --list`
//!
//! Stdout carries one `file=digest` line per artifact and a final
//! `manifest=digest` line, nothing path-dependent, so runs from different
//! working directories can be compared verbatim. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use jser_vectors::config::{GeneratorConfig, DEFAULT_SEED};
use jser_vectors::fixture_dir::write_fixture_dir;
use jser_vectors::scenarios::Scenario;
use jser_vectors::VectorError;

#[derive(Parser, Debug)]
#[command(
    name = "vector_generator",
    about = "Generate object serialization stream conformance vectors"
)]
struct Args {
    /// Output directory, created if missing
    #[arg(long, required_unless_present = "list")]
    out: Option<PathBuf>,

    /// Seed for the random scenario
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Item count for the random scenario
    #[arg(long)]
    items: Option<usize>,

    /// Scenario to generate; repeat for several, omit for all
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,

    /// Print the scenario catalog and exit
    #[arg(long)]
    list: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_catalog() {
    for scenario in Scenario::ALL {
        let kind = if scenario.has_oracle() { "oracle" } else { "binary" };
        println!("{:<18} {kind:<6} {}", scenario.name(), scenario.description());
    }
}

fn config_from(args: Args) -> Result<GeneratorConfig, VectorError> {
    let out = args.out.ok_or_else(|| VectorError::InvalidParams {
        detail: "--out is required".into(),
    })?;
    let mut config = GeneratorConfig::new(out);
    config.seed = args.seed;
    if let Some(items) = args.items {
        config.params.random_items = items;
    }
    config.scenarios = args
        .scenarios
        .iter()
        .map(|name| Scenario::from_name(name))
        .collect::<Result<_, _>>()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), VectorError> {
    let config = config_from(args)?;
    let report = write_fixture_dir(&config)?;
    for scenario in &report.scenarios {
        println!("{}={}", scenario.stream.file, scenario.stream.digest);
        if let Some(oracle) = &scenario.oracle {
            println!("{}={}", oracle.file, oracle.digest);
        }
    }
    println!("manifest={}", report.manifest_digest);
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    if args.list {
        print_catalog();
        return ExitCode::SUCCESS;
    }
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "generation failed");
            ExitCode::FAILURE
        }
    }
}
