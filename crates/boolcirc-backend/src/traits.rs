//! The [`GateBackend`] and [`BitCodec`] traits.
//!
//! A backend evaluates single-bit gates over its own bit representation.
//! Only `and`, `or`, `not` and `constant` are required; every other gate has
//! a default composition that backends with native versions override.
//!
//! Key handling is asymmetric:
//! - the cloud (bootstrapping) key is bound into the backend value itself and
//!   is used for every gate and for [`BitCodec::encode`];
//! - [`BitCodec::encrypt`] and [`BitCodec::decrypt`] take the secret key
//!   explicitly, so code holding only a backend can never decrypt.

use boolcirc_core::gate::GateOp;

use crate::error::BackendError;

/// Primitive gate operations over an opaque bit type.
///
/// Implementations are shared by reference across worker threads for the
/// duration of a run, hence `Send + Sync`.
pub trait GateBackend: Send + Sync {
    /// One evaluated bit. Moves between the engine and its workers.
    type Bit: Clone + Send + Sync;

    fn and(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError>;

    fn or(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError>;

    fn not(&self, a: &Self::Bit) -> Result<Self::Bit, BackendError>;

    fn constant(&self, value: bool) -> Result<Self::Bit, BackendError>;

    fn xor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        let either = self.or(a, b)?;
        let both = self.nand(a, b)?;
        self.and(&either, &both)
    }

    /// `control ? a : b`
    fn mux(
        &self,
        control: &Self::Bit,
        a: &Self::Bit,
        b: &Self::Bit,
    ) -> Result<Self::Bit, BackendError> {
        let take_a = self.and(control, a)?;
        let take_b = self.and_ny(control, b)?;
        self.or(&take_a, &take_b)
    }

    fn copy(&self, a: &Self::Bit) -> Result<Self::Bit, BackendError> {
        Ok(a.clone())
    }

    fn nand(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.not(&self.and(a, b)?)
    }

    fn nor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.not(&self.or(a, b)?)
    }

    fn xnor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.not(&self.xor(a, b)?)
    }

    /// `a & !b`
    fn and_yn(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.and(a, &self.not(b)?)
    }

    /// `!a & b`
    fn and_ny(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.and(&self.not(a)?, b)
    }

    /// `a | !b`
    fn or_yn(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.or(a, &self.not(b)?)
    }

    /// `!a | b`
    fn or_ny(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.or(&self.not(a)?, b)
    }

    /// Output `pin` of library cell `cell`. Backends without a cell library
    /// reject every cell.
    fn cell(&self, cell: &str, pin: &str, inputs: &[Self::Bit]) -> Result<Self::Bit, BackendError> {
        let _ = inputs;
        Err(BackendError::UnsupportedCell {
            cell: cell.to_string(),
            pin: pin.to_string(),
        })
    }

    /// Evaluates one gate node given its resolved operands.
    fn evaluate(&self, op: &GateOp, operands: &[Self::Bit]) -> Result<Self::Bit, BackendError> {
        if let Some(expected) = op.arity() {
            if operands.len() != expected {
                return Err(BackendError::Arity {
                    gate: op.to_string(),
                    expected,
                    actual: operands.len(),
                });
            }
        }
        let o = operands;
        match op {
            GateOp::Input => Err(BackendError::NotEvaluable {
                op: op.to_string(),
            }),
            GateOp::Constant { value } => self.constant(*value),
            GateOp::Copy => self.copy(&o[0]),
            GateOp::Not => self.not(&o[0]),
            GateOp::And => self.and(&o[0], &o[1]),
            GateOp::Or => self.or(&o[0], &o[1]),
            GateOp::Xor => self.xor(&o[0], &o[1]),
            GateOp::Nand => self.nand(&o[0], &o[1]),
            GateOp::Nor => self.nor(&o[0], &o[1]),
            GateOp::Xnor => self.xnor(&o[0], &o[1]),
            GateOp::AndYn => self.and_yn(&o[0], &o[1]),
            GateOp::AndNy => self.and_ny(&o[0], &o[1]),
            GateOp::OrYn => self.or_yn(&o[0], &o[1]),
            GateOp::OrNy => self.or_ny(&o[0], &o[1]),
            GateOp::Mux => self.mux(&o[0], &o[1], &o[2]),
            GateOp::Cell { cell, pin } => self.cell(cell, pin, operands),
        }
    }
}

/// Conversions between plaintext booleans and a backend's bits.
pub trait BitCodec: GateBackend {
    /// Key needed to encrypt and decrypt.
    type SecretKey;

    /// Encodes a public value using only the key bound into the backend.
    fn encode(&self, value: bool) -> Result<Self::Bit, BackendError> {
        self.constant(value)
    }

    fn encrypt(&self, secret: &Self::SecretKey, value: bool) -> Result<Self::Bit, BackendError>;

    fn decrypt(&self, secret: &Self::SecretKey, bit: &Self::Bit) -> Result<bool, BackendError>;
}
