//! redis-benchmark library
//!
//! Throughput benchmark engine for Redis-protocol servers: a shared request
//! budget drained by one pipelining worker thread per connection.

pub mod benchmark;
pub mod client;
pub mod config;
pub mod metrics;
pub mod utils;
pub mod workload;

pub use benchmark::{run_test, BenchmarkResult, Orchestrator};
pub use config::BenchmarkConfig;
pub use workload::WorkloadType;
