pub mod error;
pub mod traits;
pub mod plaintext;
pub mod fhe;
pub mod masked;
pub mod netlist;

// Re-export commonly used types
pub use error::BackendError;
pub use traits::{BitCodec, GateBackend};
pub use plaintext::PlaintextBackend;
pub use fhe::{EncryptedBackend, FheLibrary, LibGate};
pub use masked::{MaskedBitLibrary, MaskKey, MaskedBit, MaskedCloudKey};
pub use netlist::NetlistBackend;
