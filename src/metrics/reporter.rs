//! Metrics reporter - output formatting and export
//!
//! Supports multiple output formats:
//! - Text (human-readable block per test)
//! - Quiet (one line per test)
//! - CSV
//! - JSON file export

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::benchmark::BenchmarkResult;
use crate::config::BenchmarkConfig;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Quiet,
    Csv,
}

/// Metrics reporter
pub struct MetricsReporter {
    format: OutputFormat,
}

impl MetricsReporter {
    /// Create new reporter with specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print one test result to stdout
    pub fn report(&self, result: &BenchmarkResult) {
        println!("{}", self.format_result(result));
    }

    /// Render one test result in the configured format
    pub fn format_result(&self, result: &BenchmarkResult) -> String {
        match self.format {
            OutputFormat::Text => format_text(result),
            OutputFormat::Quiet => format!(
                "{}: {:.2} requests per second",
                result.test_name, result.throughput
            ),
            OutputFormat::Csv => format!("\"{}\",\"{:.2}\"", result.test_name, result.throughput),
        }
    }

    /// Write all results to a JSON file
    pub fn write_json_file(
        &self,
        path: &Path,
        config: &BenchmarkConfig,
        results: &[BenchmarkResult],
    ) -> io::Result<()> {
        let json = results_to_json(config, results);
        let mut file = File::create(path)?;
        let text = serde_json::to_string_pretty(&json).map_err(io::Error::other)?;
        writeln!(file, "{}", text)?;
        Ok(())
    }
}

fn format_text(result: &BenchmarkResult) -> String {
    let mut out = format!(
        "====== {} ======\n  {} requests completed in {:.2} seconds\n  {} parallel clients\n  {} requests per pipeline\n",
        result.test_name,
        result.completed,
        result.duration.as_secs_f64(),
        result.clients,
        result.pipeline
    );
    if result.failed_clients > 0 {
        out.push_str(&format!(
            "  {} clients failed ({})\n",
            result.failed_clients,
            result.errors.describe()
        ));
    }
    out.push_str(&format!("\n{:.2} requests per second\n", result.throughput));
    out
}

/// Build the JSON document for a run
pub fn results_to_json(config: &BenchmarkConfig, results: &[BenchmarkResult]) -> serde_json::Value {
    serde_json::json!({
        "config": {
            "host": config.host,
            "port": config.port,
            "requests": config.requests,
            "clients": config.clients,
            "pipeline": config.pipeline,
        },
        "results": results.iter().map(|r| {
            serde_json::json!({
                "test": r.test_name,
                "completed": r.completed,
                "failed_clients": r.failed_clients,
                "errors": r.errors,
                "batches": r.batches,
                "duration_secs": r.duration.as_secs_f64(),
                "requests_per_second": r.throughput,
            })
        }).collect::<Vec<_>>()
    })
}

/// Format large numbers with thousands separators
/// Examples: 1,234,567 or 987,654
pub fn format_count(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::ErrorTally;
    use std::time::Duration;

    fn sample(failed_clients: u32) -> BenchmarkResult {
        let mut errors = ErrorTally::default();
        for _ in 0..failed_clients {
            errors.record(crate::utils::FailureKind::Auth);
        }
        BenchmarkResult {
            test_name: "PING".to_string(),
            completed: 1000,
            failed_clients,
            errors,
            batches: 100,
            clients: 10,
            pipeline: 10,
            duration: Duration::from_millis(250),
            throughput: 4000.0,
        }
    }

    #[test]
    fn test_quiet_format() {
        let reporter = MetricsReporter::new(OutputFormat::Quiet);
        assert_eq!(
            reporter.format_result(&sample(0)),
            "PING: 4000.00 requests per second"
        );
    }

    #[test]
    fn test_csv_format() {
        let reporter = MetricsReporter::new(OutputFormat::Csv);
        assert_eq!(reporter.format_result(&sample(0)), "\"PING\",\"4000.00\"");
    }

    #[test]
    fn test_text_format() {
        let reporter = MetricsReporter::new(OutputFormat::Text);
        let text = reporter.format_result(&sample(0));
        assert!(text.starts_with("====== PING ======\n"));
        assert!(text.contains("1000 requests completed in 0.25 seconds"));
        assert!(text.contains("10 parallel clients"));
        assert!(text.contains("4000.00 requests per second"));
        assert!(!text.contains("failed"));

        let text = reporter.format_result(&sample(2));
        assert!(text.contains("2 clients failed (auth: 2)"));
    }

    #[test]
    fn test_json_document() {
        let config = BenchmarkConfig::default();
        let json = results_to_json(&config, &[sample(1)]);
        assert_eq!(json["config"]["port"], 6379);
        assert_eq!(json["results"][0]["test"], "PING");
        assert_eq!(json["results"][0]["completed"], 1000);
        assert_eq!(json["results"][0]["batches"], 100);
        assert_eq!(json["results"][0]["errors"]["auth"], 1);
    }

    #[test]
    fn test_write_json_file() {
        let path = std::env::temp_dir().join(format!(
            "redis-benchmark-report-{}.json",
            std::process::id()
        ));
        let reporter = MetricsReporter::new(OutputFormat::Text);
        reporter
            .write_json_file(&path, &BenchmarkConfig::default(), &[sample(0)])
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["results"][0]["requests_per_second"], 4000.0);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(123), "123");
        assert_eq!(format_count(1234), "1,234");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(1000000), "1,000,000");
    }
}
