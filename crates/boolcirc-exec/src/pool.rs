//! Scoped worker pool for gate evaluation.
//!
//! Workers share the backend by reference and never touch the wire store:
//! they receive a gate with its operand values already resolved and send
//! back `(wire, outcome)`. The orchestrator tracks how many jobs are in
//! flight and never submits more than the channel capacity, so neither
//! channel ever blocks a sender.

use std::panic::{self, AssertUnwindSafe};

use boolcirc_backend::{BackendError, GateBackend};
use boolcirc_core::{GateOp, WireId};
use crossbeam::channel;
use tracing::trace;

use crate::error::EngineError;

/// One gate ready to evaluate.
pub(crate) struct Job<'c, T> {
    pub wire: WireId,
    pub op: &'c GateOp,
    pub operands: Vec<T>,
}

pub(crate) enum Outcome<T> {
    Bit(T),
    Failed(BackendError),
    Panicked,
}

pub(crate) struct Done<'c, T> {
    pub wire: WireId,
    pub op: &'c GateOp,
    pub outcome: Outcome<T>,
}

/// Orchestrator-side handle to the running workers.
pub(crate) struct WorkerPool<'c, T> {
    jobs: channel::Sender<Job<'c, T>>,
    done: channel::Receiver<Done<'c, T>>,
    in_flight: usize,
    capacity: usize,
}

impl<'c, T> WorkerPool<'c, T> {
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn has_capacity(&self) -> bool {
        self.in_flight < self.capacity
    }

    pub fn submit(&mut self, job: Job<'c, T>) -> Result<(), EngineError> {
        let wire = job.wire;
        self.jobs
            .send(job)
            .map_err(|_| EngineError::WorkerPanicked { wire })?;
        self.in_flight += 1;
        Ok(())
    }

    /// Blocks until one in-flight job completes.
    pub fn recv(&mut self) -> Result<Done<'c, T>, EngineError> {
        let done = self
            .done
            .recv()
            .map_err(|_| EngineError::Stalled {
                remaining: self.in_flight,
            })?;
        self.in_flight -= 1;
        Ok(done)
    }

    /// Waits for every in-flight job, discarding the results.
    pub fn drain(&mut self) {
        while self.in_flight > 0 {
            if self.recv().is_err() {
                break;
            }
        }
    }
}

/// Runs `body` with a pool of `workers` threads evaluating on `backend`.
/// All workers are joined before this returns.
pub(crate) fn scoped<'c, B, R>(
    backend: &B,
    workers: usize,
    capacity: usize,
    body: impl FnOnce(&mut WorkerPool<'c, B::Bit>) -> R,
) -> R
where
    B: GateBackend,
{
    let capacity = capacity.max(1);
    std::thread::scope(|scope| {
        let (job_tx, job_rx) = channel::bounded::<Job<'c, B::Bit>>(capacity);
        let (done_tx, done_rx) = channel::bounded::<Done<'c, B::Bit>>(capacity);
        for _ in 0..workers.max(1) {
            let jobs = job_rx.clone();
            let done = done_tx.clone();
            scope.spawn(move || work(backend, jobs, done));
        }
        drop(job_rx);
        drop(done_tx);

        let mut pool = WorkerPool {
            jobs: job_tx,
            done: done_rx,
            in_flight: 0,
            capacity,
        };
        let result = body(&mut pool);
        // Closing the job channel ends every worker loop.
        drop(pool);
        result
    })
}

fn work<'c, B: GateBackend>(
    backend: &B,
    jobs: channel::Receiver<Job<'c, B::Bit>>,
    done: channel::Sender<Done<'c, B::Bit>>,
) {
    for job in jobs.iter() {
        trace!(wire = %job.wire, op = %job.op, "evaluating gate");
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
            backend.evaluate(job.op, &job.operands)
        })) {
            Ok(Ok(bit)) => Outcome::Bit(bit),
            Ok(Err(e)) => Outcome::Failed(e),
            Err(_) => Outcome::Panicked,
        };
        let report = Done {
            wire: job.wire,
            op: job.op,
            outcome,
        };
        if done.send(report).is_err() {
            break;
        }
    }
}
