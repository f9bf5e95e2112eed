//! Backend error types for boolcirc-backend.
//!
//! [`BackendError`] is what a gate evaluation can fail with. The execution
//! engine treats every variant as a hard failure: dispatch halts and the
//! error is returned to the caller.

use thiserror::Error;

/// Errors produced while evaluating a gate.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend has no implementation for this cell output.
    #[error("unsupported cell: {cell}.{pin}")]
    UnsupportedCell { cell: String, pin: String },

    /// A gate was handed the wrong number of operands.
    #[error("{gate} expects {expected} operands, got {actual}")]
    Arity {
        gate: String,
        expected: usize,
        actual: usize,
    },

    /// The node is not a gate (circuit inputs are bound, never evaluated).
    #[error("{op} nodes cannot be evaluated")]
    NotEvaluable { op: String },

    /// The underlying crypto library reported a failure.
    #[error("crypto library error: {0}")]
    Library(String),

    /// A cell function could not be evaluated.
    #[error("cell {cell}: {message}")]
    Expression { cell: String, message: String },
}
