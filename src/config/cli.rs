//! Command-line argument parsing
//!
//! Flags follow the classic redis-benchmark layout: `-h` is help, `-H` is
//! the host.

use clap::Parser;
use std::path::PathBuf;

/// Throughput benchmark for Redis-protocol servers
#[derive(Parser, Debug, Clone)]
#[command(name = "redis-benchmark")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct CliArgs {
    /// Print help information
    #[arg(short = 'h', long = "help", action = clap::ArgAction::Help)]
    help: (),

    // ===== Connection Options =====
    /// Server hostname
    #[arg(short = 'H', long = "host", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(short = 'p', long = "port", default_value_t = 6379)]
    pub port: u16,

    /// Password to use when connecting to the server
    #[arg(short = 'a', long = "password")]
    pub password: Option<String>,

    /// Connection timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    /// Socket read/write timeout in milliseconds (0 = none)
    #[arg(long = "request-timeout", default_value_t = 30000)]
    pub request_timeout_ms: u64,

    // ===== Benchmark Parameters =====
    /// Pipeline <numreq> requests (1 = no pipelining)
    #[arg(short = 'P', long = "numreq", visible_alias = "pipeline", default_value_t = 1)]
    pub pipeline: u32,

    /// Total number of requests
    #[arg(short = 'n', long = "requests", default_value_t = 100000)]
    pub requests: u64,

    /// Number of parallel connections
    #[arg(short = 'c', long = "clients", default_value_t = 50)]
    pub clients: u32,

    /// Comma separated list of tests (PING, SET, GET, GEOADD, GEORADIUS)
    #[arg(short = 't', long = "tests", value_delimiter = ',')]
    pub tests: Option<Vec<String>>,

    /// Seed for argument randomization (0 = random seed)
    #[arg(long = "seed", default_value_t = 0)]
    pub seed: u64,

    // ===== Output Options =====
    /// Quiet: just show the requests per second of each test
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Output results in CSV format
    #[arg(long = "csv")]
    pub csv: bool,

    /// Write results as JSON to this file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.pipeline == 0 {
            return Err("--numreq must be at least 1".to_string());
        }

        if self.clients == 0 {
            return Err("--clients must be at least 1".to_string());
        }

        if self.host.is_empty() {
            return Err("--host must not be empty".to_string());
        }

        if self.quiet && self.csv {
            return Err("--quiet and --csv are mutually exclusive".to_string());
        }

        if let Some(ref tests) = self.tests {
            if tests.iter().all(|t| t.trim().is_empty()) {
                return Err("--tests requires at least one test name".to_string());
            }
        }

        Ok(())
    }
}
