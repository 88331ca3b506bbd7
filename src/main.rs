//! redis-benchmark - throughput benchmark for Redis-protocol servers

use anyhow::Result;
use clap::error::ErrorKind;
use clap::CommandFactory;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use redis_benchmark::config::{BenchmarkConfig, CliArgs};
use redis_benchmark::metrics::{format_count, MetricsReporter};
use redis_benchmark::Orchestrator;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet || args.csv);

    // Build configuration; invalid input prints usage and exits non-zero
    let config = match BenchmarkConfig::from_cli(&args) {
        Ok(config) => config,
        Err(e) => CliArgs::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    if !config.is_quiet() {
        println!("{}", config.summary());
    }

    let reporter = MetricsReporter::new(config.output_format);
    let orchestrator = Orchestrator::new(config.clone());

    let results = orchestrator.run_all(|result| reporter.report(result));

    // Export to JSON if requested
    if let Some(ref output_path) = config.output_path {
        info!("Writing results to: {:?}", output_path);
        reporter
            .write_json_file(output_path, &config, &results)
            .map_err(|e| anyhow::anyhow!("Failed to write JSON: {}", e))?;
    }

    if !config.is_quiet() {
        let completed: u64 = results.iter().map(|r| r.completed).sum();
        let failed: u32 = results.iter().map(|r| r.failed_clients).sum();
        println!(
            "Tests run: {}, requests completed: {}, failed clients: {}",
            results.len(),
            format_count(completed),
            failed
        );
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
