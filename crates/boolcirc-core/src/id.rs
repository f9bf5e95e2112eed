//! Stable ID newtypes for circuit entities.
//!
//! A [`WireId`] names one single-bit value in a circuit: an input pin, a
//! constant, or the output of a gate. Gate nodes are identified by the wire
//! they drive, so the same ID is used as the vertex in dependency analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable wire identifier. Dense, starting at 0, in circuit node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WireId(pub u32);

impl WireId {
    /// Position of this wire in dense per-circuit storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

impl From<usize> for WireId {
    fn from(index: usize) -> Self {
        WireId(index as u32)
    }
}
