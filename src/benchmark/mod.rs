//! Benchmark orchestration and workers
//!
//! This module provides the multi-threaded benchmark execution system:
//! - RequestBudget: the shared counter workers claim batches from
//! - BenchmarkWorker: one thread, one connection, pipelined batches
//! - Orchestrator: runs tests one after another and aggregates results

pub mod budget;
pub mod orchestrator;
pub mod worker;

pub use budget::RequestBudget;
pub use orchestrator::{aggregate, run_test, BenchmarkResult, ErrorTally, Orchestrator};
pub use worker::{BenchmarkWorker, WorkerFailure, WorkerResult, WorkerState};
