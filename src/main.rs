use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use simdupes::config::{parse_tolerance, Config, Tolerance, Verbosity};
use simdupes::{output, pipeline};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "simdupes", version, about = "Find groups of visually similar images")]
struct Cli {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Max difference in images (in percents: 0-50)
    #[arg(
        short = 'd',
        value_name = "PERCENT",
        default_value = "7",
        env = "SIMDUPES_TOLERANCE",
        allow_negative_numbers = true,
        value_parser = parse_tolerance
    )]
    tolerance: Tolerance,

    /// Verbose messages, repeat for debug output
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_occurrences(cli.verbose);
    init_tracing(verbosity);

    let config = Config::new(cli.path)
        .with_tolerance(cli.tolerance)
        .with_verbosity(verbosity);
    debug!("Running with tolerance {}", config.tolerance);

    let report = benchmark("grouping images", || pipeline::run(&config))
        .with_context(|| format!("Failed to group images in {}", config.root.display()))?;

    if !report.clusters.is_empty() {
        info!("Found image groups:");
        let mut out = BufWriter::new(io::stdout().lock());
        output::write_groups(&mut out, &report.registry, &report.clusters)
            .context("Failed to print image groups")?;
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the level picked by `-v`.
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    debug!("{} took {:.2?}", label, start.elapsed());
    result
}
