//! The parallel execution engine.
//!
//! One orchestrating thread owns the [`WireStore`] and the readiness state;
//! a scoped worker pool evaluates gates whose operands are all resolved.
//! Two strategies share the pool:
//!
//! - [`Schedule::Dataflow`]: every non-input node carries a count of
//!   unready operands. A node enters the ready queue when its count reaches
//!   zero, and the orchestrator keeps the pool filled up to the in-flight cap.
//! - [`Schedule::Levelled`]: the circuit's level buckets are dispatched in
//!   order, waiting for each bucket to finish before starting the next.
//!
//! The first failed gate halts dispatch. In-flight work is drained, workers
//! are joined, and the error is returned. Results do not depend on worker
//! count or completion order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use boolcirc_backend::GateBackend;
use boolcirc_core::{Circuit, WireId};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::{EngineConfig, Schedule};
use crate::error::EngineError;
use crate::pool::{self, Job, Outcome, WorkerPool};
use crate::wire_store::WireStore;

/// Requests engine-wide shutdown. Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears a previous request so the engine can run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Counters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub gates_evaluated: usize,
    /// Number of level buckets in the circuit.
    pub levels: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

/// Output pin values in circuit output order, plus run counters.
#[derive(Debug)]
pub struct Evaluation<T> {
    pub outputs: Vec<T>,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    cancel: CancelHandle,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config: config.normalized(),
            cancel: CancelHandle::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Evaluates every gate of `circuit` given a value for each input wire.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not bind every circuit input exactly once.
    pub fn evaluate<B: GateBackend>(
        &self,
        circuit: &Circuit,
        inputs: Vec<(WireId, B::Bit)>,
        backend: &B,
    ) -> Result<Evaluation<B::Bit>, EngineError> {
        let started = Instant::now();
        let levels = circuit.levels()?;

        let mut store = WireStore::new(circuit.nodes().len());
        for (wire, bit) in inputs {
            let is_input = circuit.node(wire).is_some_and(|n| n.op.is_input());
            if !is_input || !store.insert(wire, bit) {
                panic!("input binding for {} is not a distinct circuit input", wire);
            }
        }
        if let Some(pin) = circuit.inputs().iter().find(|p| !store.contains(p.wire)) {
            panic!("circuit input '{}' was not bound", pin.name);
        }

        let gates = circuit.gate_count();
        let workers = self.config.workers.min(gates).max(1);
        debug!(
            circuit = circuit.name(),
            gates,
            levels = levels.len(),
            workers,
            strategy = %self.config.strategy,
            "starting run"
        );

        if gates > 0 {
            let mut run = Run {
                circuit,
                store: &mut store,
                cancel: &self.cancel,
                total: gates,
                evaluated: 0,
            };
            pool::scoped(backend, workers, self.config.max_in_flight, |pool| {
                match self.config.strategy {
                    Schedule::Dataflow => run.dataflow(pool),
                    Schedule::Levelled => run.levelled(pool, &levels),
                }
            })?;
        }

        let outputs = circuit
            .outputs()
            .iter()
            .map(|p| store.get(p.wire).cloned())
            .collect::<Option<Vec<_>>>()
            .ok_or(EngineError::Stalled {
                remaining: circuit.nodes().len() - store.filled(),
            })?;
        let stats = RunStats {
            gates_evaluated: gates,
            levels: levels.len(),
            workers,
            elapsed: started.elapsed(),
        };
        debug!(
            circuit = circuit.name(),
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(Evaluation { outputs, stats })
    }
}

/// Orchestrator state for one run.
struct Run<'c, 's, T> {
    circuit: &'c Circuit,
    store: &'s mut WireStore<T>,
    cancel: &'s CancelHandle,
    /// Non-input nodes to evaluate.
    total: usize,
    evaluated: usize,
}

impl<'c, T: Clone> Run<'c, '_, T> {
    fn dispatch(&mut self, pool: &mut WorkerPool<'c, T>, wire: WireId) -> Result<(), EngineError> {
        let circuit: &'c Circuit = self.circuit;
        let remaining = self.total - self.evaluated;
        let node = circuit
            .node(wire)
            .ok_or(EngineError::Stalled { remaining })?;
        let operands = self
            .store
            .collect(&node.operands)
            .ok_or(EngineError::Stalled { remaining })?;
        trace!(%wire, op = %node.op, "dispatching gate");
        pool.submit(Job {
            wire,
            op: &node.op,
            operands,
        })
    }

    /// Waits for one completion and records it. Returns the completed wire.
    fn complete(&mut self, pool: &mut WorkerPool<'c, T>) -> Result<WireId, EngineError> {
        let done = pool.recv()?;
        match done.outcome {
            Outcome::Bit(bit) => {
                self.store.insert(done.wire, bit);
                self.evaluated += 1;
                trace!(wire = %done.wire, "gate complete");
                Ok(done.wire)
            }
            Outcome::Failed(source) => Err(EngineError::Gate {
                wire: done.wire,
                op: done.op.to_string(),
                source,
            }),
            Outcome::Panicked => Err(EngineError::WorkerPanicked { wire: done.wire }),
        }
    }

    fn halt(&self, pool: &mut WorkerPool<'c, T>, error: EngineError) -> EngineError {
        warn!(
            circuit = self.circuit.name(),
            in_flight = pool.in_flight(),
            error = %error,
            "halting run"
        );
        pool.drain();
        error
    }

    fn dataflow(&mut self, pool: &mut WorkerPool<'c, T>) -> Result<(), EngineError> {
        let circuit = self.circuit;
        let nodes = circuit.nodes();
        let mut consumers: Vec<Vec<WireId>> = vec![Vec::new(); nodes.len()];
        let mut unready: Vec<usize> = vec![0; nodes.len()];
        let mut ready = VecDeque::new();
        for (index, node) in nodes.iter().enumerate() {
            if node.op.is_input() {
                continue;
            }
            let wire = WireId::from(index);
            for operand in &node.operands {
                if !self.store.contains(*operand) {
                    consumers[operand.index()].push(wire);
                    unready[index] += 1;
                }
            }
            if unready[index] == 0 {
                ready.push_back(wire);
            }
        }

        let total = self.total;
        while self.evaluated < total {
            if self.cancel.is_cancelled() {
                return Err(self.halt(pool, EngineError::Cancelled));
            }
            while pool.has_capacity() {
                let Some(wire) = ready.pop_front() else { break };
                if let Err(e) = self.dispatch(pool, wire) {
                    return Err(self.halt(pool, e));
                }
            }
            if pool.in_flight() == 0 {
                return Err(EngineError::Stalled {
                    remaining: total - self.evaluated,
                });
            }
            let wire = match self.complete(pool) {
                Ok(wire) => wire,
                Err(e) => return Err(self.halt(pool, e)),
            };
            for &consumer in &consumers[wire.index()] {
                unready[consumer.index()] -= 1;
                if unready[consumer.index()] == 0 {
                    ready.push_back(consumer);
                }
            }
        }
        Ok(())
    }

    fn levelled(&mut self, pool: &mut WorkerPool<'c, T>, levels: &[Vec<WireId>]) -> Result<(), EngineError> {
        for (depth, bucket) in levels.iter().enumerate() {
            let mut pending = bucket
                .iter()
                .copied()
                .filter(|w| !self.store.contains(*w))
                .collect::<VecDeque<_>>();
            trace!(depth, gates = pending.len(), "dispatching level");
            while !pending.is_empty() || pool.in_flight() > 0 {
                if self.cancel.is_cancelled() {
                    return Err(self.halt(pool, EngineError::Cancelled));
                }
                while pool.has_capacity() {
                    let Some(wire) = pending.pop_front() else { break };
                    if let Err(e) = self.dispatch(pool, wire) {
                        return Err(self.halt(pool, e));
                    }
                }
                if let Err(e) = self.complete(pool) {
                    return Err(self.halt(pool, e));
                }
            }
        }
        Ok(())
    }
}
