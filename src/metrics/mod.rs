//! Result reporting
//!
//! Text, quiet and CSV rendering of per-test results, plus JSON export.

pub mod reporter;

pub use reporter::{format_count, results_to_json, MetricsReporter, OutputFormat};
