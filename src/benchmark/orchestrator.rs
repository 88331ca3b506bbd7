//! Benchmark orchestrator
//!
//! Starts one worker thread per client for each test, times the run, joins
//! the workers and aggregates their counts. Tests run strictly one after
//! another.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use super::budget::RequestBudget;
use super::worker::{BenchmarkWorker, WorkerResult};
use crate::config::BenchmarkConfig;
use crate::utils::{BenchmarkError, FailureKind};
use crate::workload::WorkloadType;

/// Worker threads only hold a few small buffers
const WORKER_STACK_SIZE: usize = 256 * 1024;

/// Fatal worker errors by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErrorTally {
    pub connection: u32,
    pub auth: u32,
    pub protocol: u32,
    pub io: u32,
    pub worker: u32,
}

impl ErrorTally {
    pub fn record(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::Connection => self.connection += 1,
            FailureKind::Auth => self.auth += 1,
            FailureKind::Protocol => self.protocol += 1,
            FailureKind::Io => self.io += 1,
            FailureKind::Worker => self.worker += 1,
        }
    }

    pub fn get(&self, kind: FailureKind) -> u32 {
        match kind {
            FailureKind::Connection => self.connection,
            FailureKind::Auth => self.auth,
            FailureKind::Protocol => self.protocol,
            FailureKind::Io => self.io,
            FailureKind::Worker => self.worker,
        }
    }

    pub fn total(&self) -> u32 {
        self.connection + self.auth + self.protocol + self.io + self.worker
    }

    /// Non-zero entries, e.g. `auth: 2, io: 1`
    pub fn describe(&self) -> String {
        [
            FailureKind::Connection,
            FailureKind::Auth,
            FailureKind::Protocol,
            FailureKind::Io,
            FailureKind::Worker,
        ]
        .iter()
        .filter(|k| self.get(**k) > 0)
        .map(|k| format!("{}: {}", k, self.get(*k)))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Benchmark result summary
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Test name
    pub test_name: String,
    /// Requests whose replies were read back successfully
    pub completed: u64,
    /// Workers that stopped on a fatal error
    pub failed_clients: u32,
    pub errors: ErrorTally,
    /// Write/read round trips across all workers
    pub batches: u64,
    pub clients: u32,
    pub pipeline: u32,
    /// Total duration
    pub duration: Duration,
    /// Throughput (requests per second)
    pub throughput: f64,
}

/// Sum worker results into one per-test result
pub fn aggregate(
    test_name: &str,
    clients: u32,
    pipeline: u32,
    results: &[WorkerResult],
    duration: Duration,
) -> BenchmarkResult {
    let mut completed = 0u64;
    let mut batches = 0u64;
    let mut failed_clients = 0u32;
    let mut errors = ErrorTally::default();

    for result in results {
        completed += result.completed;
        batches += result.batches;
        if result.is_failed() {
            failed_clients += 1;
        }
        if let Some(ref failure) = result.failure {
            errors.record(failure.kind);
        }
    }

    let secs = duration.as_secs_f64();
    let throughput = if secs > 0.0 {
        completed as f64 / secs
    } else {
        0.0
    };

    BenchmarkResult {
        test_name: test_name.to_string(),
        completed,
        failed_clients,
        errors,
        batches,
        clients,
        pipeline,
        duration,
        throughput,
    }
}

/// Benchmark orchestrator
pub struct Orchestrator {
    config: Arc<BenchmarkConfig>,
}

impl Orchestrator {
    /// Create new orchestrator
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Run a single benchmark test
    ///
    /// Always returns a result; if every worker fails it reports zero
    /// completed requests.
    pub fn run_test(&self, workload: WorkloadType) -> BenchmarkResult {
        let clients = self.config.clients;
        let budget = Arc::new(RequestBudget::new(self.config.requests));

        info!(
            "{}: {} requests over {} clients, pipeline {}",
            workload, self.config.requests, clients, self.config.pipeline
        );

        let mut handles: Vec<(usize, thread::JoinHandle<WorkerResult>)> =
            Vec::with_capacity(clients as usize);
        let mut results: Vec<WorkerResult> = Vec::with_capacity(clients as usize);

        let start_time = Instant::now();

        for worker_id in 0..clients as usize {
            let worker = BenchmarkWorker::new(worker_id, Arc::clone(&self.config), workload);
            let budget = Arc::clone(&budget);

            let spawned = thread::Builder::new()
                .name(format!("bench-client-{}", worker_id))
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || worker.run(&budget));

            match spawned {
                Ok(handle) => handles.push((worker_id, handle)),
                Err(e) => {
                    warn!("client {}: failed to spawn thread: {}", worker_id, e);
                    let error = BenchmarkError::Worker(format!("failed to spawn thread: {}", e));
                    results.push(WorkerResult::failed(worker_id, &error));
                }
            }
        }

        // Wait for workers to complete
        for (worker_id, handle) in handles {
            match handle.join() {
                Ok(result) => results.push(result),
                Err(_) => {
                    warn!("client {}: worker thread panicked", worker_id);
                    let error = BenchmarkError::Worker("worker thread panicked".to_string());
                    results.push(WorkerResult::failed(worker_id, &error));
                }
            }
        }

        let duration = start_time.elapsed();

        let result = aggregate(
            workload.as_str(),
            clients,
            self.config.pipeline,
            &results,
            duration,
        );

        if result.failed_clients > 0 {
            warn!(
                "{}: {} of {} clients failed ({})",
                workload,
                result.failed_clients,
                clients,
                result.errors.describe()
            );
        }
        info!(
            "{}: {} completed in {:.3}s",
            workload,
            result.completed,
            duration.as_secs_f64()
        );

        result
    }

    /// Run all configured tests in order, handing each result to `on_result`
    /// as soon as it is available
    pub fn run_all<F>(&self, mut on_result: F) -> Vec<BenchmarkResult>
    where
        F: FnMut(&BenchmarkResult),
    {
        let mut results = Vec::with_capacity(self.config.tests.len());

        for &workload in &self.config.tests {
            let result = self.run_test(workload);
            on_result(&result);
            results.push(result);
        }

        results
    }
}

/// Run one test with the given configuration
pub fn run_test(config: &BenchmarkConfig, workload: WorkloadType) -> BenchmarkResult {
    Orchestrator::new(config.clone()).run_test(workload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::worker::{WorkerFailure, WorkerState};

    fn done(id: usize, completed: u64, batches: u64) -> WorkerResult {
        WorkerResult {
            worker_id: id,
            completed,
            batches,
            state: WorkerState::Done,
            failure: None,
        }
    }

    fn failed(id: usize, completed: u64, kind: FailureKind) -> WorkerResult {
        WorkerResult {
            worker_id: id,
            completed,
            batches: completed,
            state: WorkerState::Failed,
            failure: Some(WorkerFailure {
                kind,
                message: String::new(),
            }),
        }
    }

    #[test]
    fn test_aggregate_sums_workers() {
        let results = vec![
            done(0, 400, 40),
            done(1, 590, 59),
            failed(2, 10, FailureKind::Io),
            failed(3, 0, FailureKind::Auth),
        ];
        let result = aggregate("SET", 4, 10, &results, Duration::from_millis(500));

        assert_eq!(result.test_name, "SET");
        assert_eq!(result.completed, 1000);
        assert_eq!(result.batches, 109);
        assert_eq!(result.failed_clients, 2);
        assert_eq!(result.errors.io, 1);
        assert_eq!(result.errors.auth, 1);
        assert_eq!(result.errors.total(), 2);
        assert!((result.throughput - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn test_aggregate_degenerate() {
        let results = vec![
            failed(0, 0, FailureKind::Connection),
            failed(1, 0, FailureKind::Connection),
        ];
        let result = aggregate("PING", 2, 1, &results, Duration::ZERO);
        assert_eq!(result.completed, 0);
        assert_eq!(result.failed_clients, 2);
        assert_eq!(result.throughput, 0.0);
        assert_eq!(result.errors.describe(), "connection: 2");
    }

    #[test]
    fn test_error_tally_describe() {
        let mut tally = ErrorTally::default();
        assert_eq!(tally.describe(), "");
        tally.record(FailureKind::Auth);
        tally.record(FailureKind::Auth);
        tally.record(FailureKind::Protocol);
        assert_eq!(tally.describe(), "auth: 2, protocol: 1");
        assert_eq!(tally.get(FailureKind::Auth), 2);
    }

    #[test]
    fn test_deeply_nested_replies_on_worker_threads() {
        use crate::utils::resp::MAX_DEPTH;
        use crate::utils::RespDecoder;
        use std::io::{BufReader, Write};

        let mut reply = "*1\r\n".repeat(MAX_DEPTH - 1).into_bytes();
        reply.extend_from_slice(b":1\r\n");

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut decoder = RespDecoder::new(BufReader::new(stream.try_clone().unwrap()));
            while decoder.read_one().is_ok() {
                stream.write_all(&reply).unwrap();
            }
        });

        let config = BenchmarkConfig {
            port,
            requests: 6,
            clients: 1,
            pipeline: 3,
            ..Default::default()
        };
        let result = run_test(&config, WorkloadType::Ping);
        assert_eq!(result.completed, 6);
        assert_eq!(result.batches, 2);
        assert_eq!(result.failed_clients, 0);
        server.join().unwrap();
    }

    #[test]
    fn test_zero_requests_against_unreachable_server() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = BenchmarkConfig {
            port,
            requests: 0,
            clients: 3,
            ..Default::default()
        };
        let result = run_test(&config, WorkloadType::Ping);
        assert_eq!(result.completed, 0);
        assert_eq!(result.failed_clients, 3);
        assert_eq!(result.errors.connection, 3);
    }
}
