//! Benchmark configuration derived from CLI arguments

use super::cli::CliArgs;
use crate::metrics::OutputFormat;
use crate::utils::{BenchmarkError, Result};
use crate::workload::WorkloadType;
use std::path::PathBuf;

/// Complete benchmark configuration
///
/// Shared read-only by every worker of a run.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    // Connection
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,

    // Load shape
    pub requests: u64,
    pub clients: u32,
    pub pipeline: u32,
    pub tests: Vec<WorkloadType>,
    pub seed: u64,

    // Output
    pub output_format: OutputFormat,
    pub output_path: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            connect_timeout_ms: 5000,
            request_timeout_ms: 30000,
            requests: 100000,
            clients: 50,
            pipeline: 1,
            tests: vec![WorkloadType::Ping],
            seed: 0,
            output_format: OutputFormat::Text,
            output_path: None,
            verbose: false,
        }
    }
}

impl BenchmarkConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        // Validate first
        args.validate().map_err(BenchmarkError::Config)?;

        // Determine tests to run
        let tests = match args.tests {
            Some(ref names) => names
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    WorkloadType::parse(s)
                        .ok_or_else(|| BenchmarkError::Config(format!("Unknown test: {}", s)))
                })
                .collect::<Result<Vec<_>>>()?,
            None => vec![WorkloadType::Ping],
        };

        let output_format = if args.csv {
            OutputFormat::Csv
        } else if args.quiet {
            OutputFormat::Quiet
        } else {
            OutputFormat::Text
        };

        Ok(Self {
            host: args.host.clone(),
            port: args.port,
            password: args.password.clone(),
            connect_timeout_ms: args.connect_timeout_ms,
            request_timeout_ms: args.request_timeout_ms,

            requests: args.requests,
            clients: args.clients,
            pipeline: args.pipeline,
            tests,
            seed: args.seed,

            output_format,
            output_path: args.output.clone(),
            verbose: args.verbose,
        })
    }

    /// Whether human-oriented progress text should be printed
    pub fn is_quiet(&self) -> bool {
        self.output_format != OutputFormat::Text
    }

    /// One-line summary of the run parameters
    pub fn summary(&self) -> String {
        format!(
            "Host: {}, Port: {}, PipelinedRequests: {}, Requests: {}, Connections: {}, Tests: [{}]",
            self.host,
            self.port,
            self.pipeline,
            self.requests,
            self.clients,
            self.tests
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let from_cli = BenchmarkConfig::from_cli(&CliArgs::parse_from(["test"])).unwrap();
        let default = BenchmarkConfig::default();
        assert_eq!(from_cli.host, default.host);
        assert_eq!(from_cli.port, default.port);
        assert_eq!(from_cli.requests, default.requests);
        assert_eq!(from_cli.clients, default.clients);
        assert_eq!(from_cli.pipeline, default.pipeline);
        assert_eq!(from_cli.tests, default.tests);
        assert_eq!(from_cli.connect_timeout_ms, default.connect_timeout_ms);
        assert_eq!(from_cli.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_tests_are_case_insensitive() {
        let args = CliArgs::parse_from(["test", "-t", "ping,Set,geoadd,GEORADIUS,get"]);
        let config = BenchmarkConfig::from_cli(&args).unwrap();
        assert_eq!(
            config.tests,
            vec![
                WorkloadType::Ping,
                WorkloadType::Set,
                WorkloadType::GeoAdd,
                WorkloadType::GeoRadius,
                WorkloadType::Get,
            ]
        );
    }

    #[test]
    fn test_unknown_test_rejected() {
        let args = CliArgs::parse_from(["test", "-t", "ping,lpush"]);
        let err = BenchmarkConfig::from_cli(&args).unwrap_err();
        assert!(matches!(err, BenchmarkError::Config(ref msg) if msg == "Unknown test: lpush"));
        assert_eq!(err.to_string(), "Configuration error: Unknown test: lpush");
    }

    #[test]
    fn test_validation_failure_is_config_error() {
        let args = CliArgs::parse_from(["test", "-q", "--csv"]);
        let err = BenchmarkConfig::from_cli(&args).unwrap_err();
        assert!(matches!(err, BenchmarkError::Config(_)));
    }

    #[test]
    fn test_output_format_selection() {
        let quiet = BenchmarkConfig::from_cli(&CliArgs::parse_from(["test", "-q"])).unwrap();
        assert_eq!(quiet.output_format, OutputFormat::Quiet);
        assert!(quiet.is_quiet());

        let csv = BenchmarkConfig::from_cli(&CliArgs::parse_from(["test", "--csv"])).unwrap();
        assert_eq!(csv.output_format, OutputFormat::Csv);
    }

    #[test]
    fn test_summary() {
        let config = BenchmarkConfig {
            tests: vec![WorkloadType::Ping, WorkloadType::Set],
            ..Default::default()
        };
        assert_eq!(
            config.summary(),
            "Host: 127.0.0.1, Port: 6379, PipelinedRequests: 1, Requests: 100000, Connections: 50, Tests: [PING SET]"
        );
    }
}
