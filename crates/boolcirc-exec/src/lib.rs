pub mod config;
pub mod error;
pub mod wire_store;
pub mod wiring;
mod pool;
pub mod engine;
pub mod runner;

// Re-export commonly used types
pub use config::{EngineConfig, Schedule};
pub use error::EngineError;
pub use wire_store::WireStore;
pub use engine::{CancelHandle, Engine, Evaluation, RunStats};
pub use runner::{decode_le_bits, encode_le_bits, CircuitRunner, RunArgs};

// Backends are part of the run API.
pub use boolcirc_backend as backend;
