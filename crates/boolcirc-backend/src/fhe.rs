//! Encrypted backend over a pluggable bootstrapped-gate library.
//!
//! [`FheLibrary`] is the seam to the external crypto library: key
//! generation, encryption with the secret key, and one bootstrapped
//! evaluation per [`LibGate`] with the cloud key. [`EncryptedBackend`] binds
//! a library to one cloud key and exposes it as a [`GateBackend`], mapping
//! every gate the library has natively to exactly one library call.

use crate::error::BackendError;
use crate::traits::{BitCodec, GateBackend};

/// Gates a bootstrapped-gate library evaluates natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibGate {
    Not,
    Copy,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    AndYn,
    AndNy,
    OrYn,
    OrNy,
    /// Operands `[control, a, b]`, selecting `a` when control is set.
    Mux,
}

impl LibGate {
    pub fn arity(self) -> usize {
        match self {
            LibGate::Not | LibGate::Copy => 1,
            LibGate::Mux => 3,
            _ => 2,
        }
    }

    /// True for gates that cost a bootstrapping (everything but `Not` and
    /// `Copy`, which are linear).
    pub fn bootstraps(self) -> bool {
        !matches!(self, LibGate::Not | LibGate::Copy)
    }

    /// Plain truth function of the gate.
    pub fn apply(self, inputs: &[bool]) -> bool {
        match (self, inputs) {
            (LibGate::Not, [a]) => !a,
            (LibGate::Copy, [a]) => *a,
            (LibGate::And, [a, b]) => a & b,
            (LibGate::Or, [a, b]) => a | b,
            (LibGate::Xor, [a, b]) => a ^ b,
            (LibGate::Nand, [a, b]) => !(a & b),
            (LibGate::Nor, [a, b]) => !(a | b),
            (LibGate::Xnor, [a, b]) => !(a ^ b),
            (LibGate::AndYn, [a, b]) => a & !b,
            (LibGate::AndNy, [a, b]) => !a & b,
            (LibGate::OrYn, [a, b]) => a | !b,
            (LibGate::OrNy, [a, b]) => !a | b,
            (LibGate::Mux, [c, a, b]) => {
                if *c {
                    *a
                } else {
                    *b
                }
            }
            _ => false,
        }
    }
}

/// An external homomorphic-encryption library evaluating boolean gates.
pub trait FheLibrary: Send + Sync {
    type SecretKey: Send + Sync;
    type CloudKey: Send + Sync;
    type Ciphertext: Clone + Send + Sync;

    /// Derives a key pair deterministically from `seed`.
    fn generate_keys(&self, seed: u64) -> (Self::SecretKey, Self::CloudKey);

    fn encrypt(&self, key: &Self::SecretKey, value: bool) -> Result<Self::Ciphertext, BackendError>;

    fn decrypt(&self, key: &Self::SecretKey, bit: &Self::Ciphertext) -> Result<bool, BackendError>;

    /// Noiseless public encoding of a constant.
    fn trivial(&self, key: &Self::CloudKey, value: bool) -> Result<Self::Ciphertext, BackendError>;

    /// Evaluates `gate`; `inputs.len()` equals `gate.arity()`.
    fn gate(
        &self,
        key: &Self::CloudKey,
        gate: LibGate,
        inputs: &[&Self::Ciphertext],
    ) -> Result<Self::Ciphertext, BackendError>;
}

/// A [`GateBackend`] whose bits are ciphertexts of library `L`, bound to one
/// cloud key.
pub struct EncryptedBackend<'k, L: FheLibrary> {
    library: &'k L,
    cloud_key: &'k L::CloudKey,
}

impl<'k, L: FheLibrary> EncryptedBackend<'k, L> {
    pub fn new(library: &'k L, cloud_key: &'k L::CloudKey) -> Self {
        EncryptedBackend { library, cloud_key }
    }

    pub fn library(&self) -> &'k L {
        self.library
    }

    fn call(&self, gate: LibGate, inputs: &[&L::Ciphertext]) -> Result<L::Ciphertext, BackendError> {
        self.library.gate(self.cloud_key, gate, inputs)
    }
}

impl<L: FheLibrary> GateBackend for EncryptedBackend<'_, L> {
    type Bit = L::Ciphertext;

    fn and(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::And, &[a, b])
    }

    fn or(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Or, &[a, b])
    }

    fn not(&self, a: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Not, &[a])
    }

    fn constant(&self, value: bool) -> Result<Self::Bit, BackendError> {
        self.library.trivial(self.cloud_key, value)
    }

    fn xor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Xor, &[a, b])
    }

    fn mux(&self, control: &Self::Bit, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Mux, &[control, a, b])
    }

    fn copy(&self, a: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Copy, &[a])
    }

    fn nand(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Nand, &[a, b])
    }

    fn nor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Nor, &[a, b])
    }

    fn xnor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::Xnor, &[a, b])
    }

    fn and_yn(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::AndYn, &[a, b])
    }

    fn and_ny(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::AndNy, &[a, b])
    }

    fn or_yn(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::OrYn, &[a, b])
    }

    fn or_ny(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.call(LibGate::OrNy, &[a, b])
    }
}

impl<L: FheLibrary> BitCodec for EncryptedBackend<'_, L> {
    type SecretKey = L::SecretKey;

    fn encrypt(&self, secret: &L::SecretKey, value: bool) -> Result<Self::Bit, BackendError> {
        self.library.encrypt(secret, value)
    }

    fn decrypt(&self, secret: &L::SecretKey, bit: &Self::Bit) -> Result<bool, BackendError> {
        self.library.decrypt(secret, bit)
    }
}
