//! Core error types for boolcirc-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering graph
//! analysis, circuit lookups, and the netlist / cell-library / IR parsers.

use thiserror::Error;

/// Core errors produced by the boolcirc-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Topological ordering could not include every vertex.
    #[error("a cycle was detected in the input graph ({ordered} of {total} vertices ordered)")]
    CycleDetected { ordered: usize, total: usize },

    /// A vertex was not present in the dependency graph.
    #[error("vertex not found: {vertex}")]
    VertexNotFound { vertex: String },

    /// A cell name was not present in the cell library.
    #[error("cell not found: '{name}'")]
    CellNotFound { name: String },

    /// A parameter name was not present in the function metadata.
    #[error("parameter not found: '{name}'")]
    ParameterNotFound { name: String },

    /// Malformed netlist, cell library, or IR text.
    #[error("{context} parse error at line {line}: {message}")]
    Parse {
        context: &'static str,
        line: usize,
        message: String,
    },

    /// A cell consumes a wire that nothing drives.
    #[error("usage of uninitialized wire {net}")]
    UninitializedWire { net: String },

    /// A net name that does not follow the expected `_N_` or `name[i]` shape.
    #[error("invalid net reference '{net}': {reason}")]
    InvalidNetRef { net: String, reason: String },

    /// A constant expression that does not follow the `<constant_N>` shape.
    #[error("invalid constant '{text}'")]
    InvalidConstant { text: String },

    /// A circuit whose nodes, operands, or pins are inconsistent.
    #[error("invalid circuit: {reason}")]
    InvalidCircuit { reason: String },

    /// A dataflow IR construct outside the supported bit-level subset.
    #[error("unsupported IR: {reason}")]
    UnsupportedIr { reason: String },

    /// JSON (de)serialization failure for circuits, metadata, or IR.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn parse(context: &'static str, line: usize, message: impl Into<String>) -> Self {
        CoreError::Parse {
            context,
            line,
            message: message.into(),
        }
    }
}
