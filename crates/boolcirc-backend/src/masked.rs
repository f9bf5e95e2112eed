//! An insecure stand-in for a bootstrapped-gate FHE library.
//!
//! Each ciphertext is a plaintext bit XORed with a pseudo-random mask derived
//! from a 32-byte key and a per-ciphertext nonce (first bit of a keyed
//! BLAKE3 hash). The cloud key carries the mask key, so gate evaluation
//! unmasks, computes and re-masks under a fresh nonce.
//!
//! NOT encryption in any meaningful sense. It exists so the encrypted
//! execution path (opaque bits, key separation, per-gate library calls) can
//! be exercised and benchmarked without a real FHE dependency.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::error::BackendError;
use crate::fhe::{FheLibrary, LibGate};

#[derive(Clone, PartialEq, Eq)]
pub struct MaskKey([u8; 32]);

impl std::fmt::Debug for MaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MaskKey(..)")
    }
}

impl MaskKey {
    fn mask(&self, nonce: u64) -> bool {
        blake3::keyed_hash(&self.0, &nonce.to_le_bytes()).as_bytes()[0] & 1 == 1
    }
}

/// Key given to the evaluating side.
#[derive(Debug, Clone)]
pub struct MaskedCloudKey {
    key: MaskKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedBit {
    nonce: u64,
    masked: bool,
}

/// The masked-bit library. Counts bootstrapped gate evaluations.
#[derive(Debug, Default)]
pub struct MaskedBitLibrary {
    bootstrapped: AtomicU64,
}

impl MaskedBitLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bootstrapping gates evaluated so far (`not` and `copy` are
    /// free and not counted).
    pub fn bootstrapped_gates(&self) -> u64 {
        self.bootstrapped.load(Ordering::Relaxed)
    }

    fn seal(key: &MaskKey, value: bool) -> MaskedBit {
        let nonce = rand::random::<u64>();
        MaskedBit {
            nonce,
            masked: value ^ key.mask(nonce),
        }
    }

    fn open(key: &MaskKey, bit: &MaskedBit) -> bool {
        bit.masked ^ key.mask(bit.nonce)
    }
}

impl FheLibrary for MaskedBitLibrary {
    type SecretKey = MaskKey;
    type CloudKey = MaskedCloudKey;
    type Ciphertext = MaskedBit;

    fn generate_keys(&self, seed: u64) -> (MaskKey, MaskedCloudKey) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        debug!(seed, "generated masked-bit key pair");
        let key = MaskKey(bytes);
        (key.clone(), MaskedCloudKey { key })
    }

    fn encrypt(&self, key: &MaskKey, value: bool) -> Result<MaskedBit, BackendError> {
        Ok(Self::seal(key, value))
    }

    fn decrypt(&self, key: &MaskKey, bit: &MaskedBit) -> Result<bool, BackendError> {
        Ok(Self::open(key, bit))
    }

    fn trivial(&self, key: &MaskedCloudKey, value: bool) -> Result<MaskedBit, BackendError> {
        Ok(Self::seal(&key.key, value))
    }

    fn gate(
        &self,
        key: &MaskedCloudKey,
        gate: LibGate,
        inputs: &[&MaskedBit],
    ) -> Result<MaskedBit, BackendError> {
        if inputs.len() != gate.arity() {
            return Err(BackendError::Library(format!(
                "{:?} takes {} inputs, got {}",
                gate,
                gate.arity(),
                inputs.len()
            )));
        }
        let plain: Vec<bool> = inputs.iter().map(|bit| Self::open(&key.key, bit)).collect();
        if gate.bootstraps() {
            self.bootstrapped.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Self::seal(&key.key, gate.apply(&plain)))
    }
}
