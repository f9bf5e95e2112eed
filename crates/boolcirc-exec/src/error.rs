//! Engine error types for boolcirc-exec.
//!
//! Errors here are recoverable: the run halted and every worker was joined
//! before the error was returned. Wiring contract violations (bit counts
//! that disagree with the metadata) are not represented; they panic, see
//! [`crate::wiring`].

use boolcirc_backend::BackendError;
use boolcirc_core::{CoreError, WireId};
use thiserror::Error;

/// Errors produced while preparing or running a circuit.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Circuit, netlist, library, IR or metadata problem.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Backend failure outside gate evaluation (e.g. encoding an input).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A gate evaluation failed; dispatch was halted.
    #[error("gate {wire} ({op}) failed: {source}")]
    Gate {
        wire: WireId,
        op: String,
        #[source]
        source: BackendError,
    },

    /// Shutdown was requested through a [`crate::engine::CancelHandle`].
    #[error("run cancelled")]
    Cancelled,

    /// A worker thread panicked while evaluating a gate.
    #[error("worker panicked while evaluating gate {wire}")]
    WorkerPanicked { wire: WireId },

    /// Gates remain but none is ready and none is in flight.
    #[error("execution stalled with {remaining} gates unevaluated")]
    Stalled { remaining: usize },

    /// The caller supplied no buffer for a declared parameter.
    #[error("missing argument '{name}'")]
    MissingArgument { name: String },
}
