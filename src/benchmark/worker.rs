//! Benchmark worker implementation
//!
//! Each worker owns exactly one connection for its whole life. The only
//! synchronization point with other workers is the request budget.
//!
//! Lifecycle: connecting -> authenticating (only with a password) ->
//! running -> draining -> done, or failed from any step. A failure ends
//! this worker only; the in-flight batch is not credited and its requests
//! are not returned to the budget.

use std::sync::Arc;

use tracing::{debug, warn};

use super::budget::RequestBudget;
use crate::client::{ConnectionFactory, RawConnection};
use crate::config::BenchmarkConfig;
use crate::utils::{BenchmarkError, FailureKind, RespEncoder, Result};
use crate::workload::{CommandGenerator, WorkloadType};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Connecting,
    Authenticating,
    Running,
    Draining,
    Done,
    Failed,
}

/// Why a worker stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl WorkerFailure {
    pub fn from_error(error: &BenchmarkError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result from a worker thread
#[derive(Debug, Clone)]
pub struct WorkerResult {
    /// Worker ID
    pub worker_id: usize,
    /// Requests whose replies were fully read
    pub completed: u64,
    /// Write/read round trips that completed
    pub batches: u64,
    /// Final state (`Done` or `Failed`)
    pub state: WorkerState,
    pub failure: Option<WorkerFailure>,
}

impl WorkerResult {
    /// Result for a worker that never got to run
    pub fn failed(worker_id: usize, error: &BenchmarkError) -> Self {
        Self {
            worker_id,
            completed: 0,
            batches: 0,
            state: WorkerState::Failed,
            failure: Some(WorkerFailure::from_error(error)),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == WorkerState::Failed
    }
}

/// Batch buffer preallocation is capped at this many commands; the buffer
/// grows on demand past it
const MAX_PREALLOC_BATCH: u64 = 1024;

/// Per-worker generator seed: `None` seeds from entropy.
///
/// Multiplying by an odd constant is a bijection on u64, so distinct worker
/// ids never share a seed.
fn worker_seed(seed: u64, id: usize) -> Option<u64> {
    (seed != 0).then(|| seed ^ (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Benchmark worker (runs in dedicated OS thread)
pub struct BenchmarkWorker {
    /// Worker ID
    id: usize,

    config: Arc<BenchmarkConfig>,
    factory: ConnectionFactory,

    /// Thread-local command source
    generator: CommandGenerator,

    /// Outbound batch buffer, reused across batches
    encoder: RespEncoder,

    state: WorkerState,
    completed: u64,
    batches: u64,
}

impl BenchmarkWorker {
    /// Create new worker
    pub fn new(id: usize, config: Arc<BenchmarkConfig>, workload: WorkloadType) -> Self {
        let seed = worker_seed(config.seed, id);

        // A batch never exceeds the whole budget
        let batch_hint = u64::from(config.pipeline)
            .min(config.requests)
            .clamp(1, MAX_PREALLOC_BATCH);
        let factory = ConnectionFactory::from_config(&config);
        let encoder = RespEncoder::with_capacity(64 * batch_hint as usize);

        Self {
            id,
            factory,
            generator: CommandGenerator::new(workload, seed),
            encoder,
            config,
            state: WorkerState::Connecting,
            completed: 0,
            batches: 0,
        }
    }

    /// Run to completion against the shared budget
    pub fn run(mut self, budget: &RequestBudget) -> WorkerResult {
        let failure = match self.execute(budget) {
            Ok(()) => {
                self.transition(WorkerState::Done);
                None
            }
            Err(e) => {
                warn!(
                    "client {}: {} error after {} requests: {}",
                    self.id,
                    e.kind(),
                    self.completed,
                    e
                );
                self.transition(WorkerState::Failed);
                Some(WorkerFailure::from_error(&e))
            }
        };

        WorkerResult {
            worker_id: self.id,
            completed: self.completed,
            batches: self.batches,
            state: self.state,
            failure,
        }
    }

    fn execute(&mut self, budget: &RequestBudget) -> Result<()> {
        let config = Arc::clone(&self.config);

        self.transition(WorkerState::Connecting);
        let mut conn = self.factory.connect(&config.host, config.port)?;

        if let Some(ref password) = config.password {
            self.transition(WorkerState::Authenticating);
            conn.authenticate(password)?;
        }

        self.transition(WorkerState::Running);
        let outcome = self.run_batches(&mut conn, budget);

        self.transition(WorkerState::Draining);
        conn.shutdown();

        outcome
    }

    /// Claim, send and confirm batches until the budget runs dry
    fn run_batches(&mut self, conn: &mut RawConnection, budget: &RequestBudget) -> Result<()> {
        let pipeline = u64::from(self.config.pipeline.max(1));

        loop {
            let granted = budget.claim(pipeline);
            if granted == 0 {
                return Ok(());
            }

            self.encoder.clear();
            for _ in 0..granted {
                self.generator
                    .next_command()
                    .encode_into(&mut self.encoder);
            }
            conn.send(self.encoder.as_bytes())?;

            // Replies arrive in request order; each must frame as a valid reply
            for _ in 0..granted {
                conn.skip_reply()?;
            }

            self.completed += granted;
            self.batches += 1;
        }
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state != next {
            debug!("client {}: {:?} -> {:?}", self.id, self.state, next);
            self.state = next;
        }
    }
}
