//! quadsplit: split every 2x2 composite in a directory into four panels.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use quadsplit_io::{BatchOptions, load_config, run_batch};
use quadsplit_pipeline::Pipeline;
use rayon::ThreadPoolBuilder;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "quadsplit",
    version,
    about = "Split 2x2 composite images into their four panels",
    after_help = "Each input <name>.<ext> produces <name>_1_top_left.<ext>, \
                  <name>_2_top_right.<ext>, <name>_3_bottom_left.<ext> and \
                  <name>_4_bottom_right.<ext>.\n\
                  Log verbosity can be overridden with RUST_LOG."
)]
struct Cli {
    /// Directory containing the composite images
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Directory receiving the split panels
    #[arg(short, long)]
    output_dir: PathBuf,

    /// YAML configuration file; a missing or invalid file aborts the run
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Verbose logging and debug overlays
    #[arg(short, long)]
    debug: bool,

    /// Directory for debug overlays [default: <OUTPUT_DIR>/debug]
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Print the batch summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The configuration decides the log level, so it is loaded before the
    // subscriber exists and any failure is reported once it does.
    let config = load_config(&cli.config);
    let debug_enabled = cli.debug || config.as_ref().is_ok_and(|c| c.debug_mode);
    init_tracing(debug_enabled);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "cannot start");
            return ExitCode::FAILURE;
        }
    };
    info!(path = %cli.config.display(), debug = debug_enabled, "configuration ready");

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Some(jobs) = cli.jobs
        && let Err(e) = ThreadPoolBuilder::new().num_threads(jobs).build_global()
    {
        warn!(error = %e, jobs, "could not size worker pool; using default");
    }

    let options = BatchOptions {
        debug_dir: debug_enabled.then(|| {
            cli.debug_dir
                .clone()
                .unwrap_or_else(|| cli.output_dir.join("debug"))
        }),
        output_dir: cli.output_dir,
    };

    let summary = match run_batch(&pipeline, &cli.input_dir, &options) {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "cannot start");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match summary.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(error = %e, "could not print summary");
                return ExitCode::FAILURE;
            }
        }
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "done"
    );
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["quadsplit", "-i", "in", "-o", "out"]);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(!cli.debug && !cli.json);
        assert!(cli.debug_dir.is_none() && cli.jobs.is_none());
    }
}
