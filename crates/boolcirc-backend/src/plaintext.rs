//! Plaintext backend: bits are `bool` and every gate is native logic.
//!
//! Used for correctness testing and debugging without cryptographic cost.

use crate::error::BackendError;
use crate::traits::{BitCodec, GateBackend};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextBackend;

impl GateBackend for PlaintextBackend {
    type Bit = bool;

    fn and(&self, a: &bool, b: &bool) -> Result<bool, BackendError> {
        Ok(*a & *b)
    }

    fn or(&self, a: &bool, b: &bool) -> Result<bool, BackendError> {
        Ok(*a | *b)
    }

    fn not(&self, a: &bool) -> Result<bool, BackendError> {
        Ok(!*a)
    }

    fn constant(&self, value: bool) -> Result<bool, BackendError> {
        Ok(value)
    }

    fn xor(&self, a: &bool, b: &bool) -> Result<bool, BackendError> {
        Ok(*a ^ *b)
    }

    fn mux(&self, control: &bool, a: &bool, b: &bool) -> Result<bool, BackendError> {
        Ok(if *control { *a } else { *b })
    }
}

impl BitCodec for PlaintextBackend {
    type SecretKey = ();

    fn encrypt(&self, _secret: &(), value: bool) -> Result<bool, BackendError> {
        Ok(value)
    }

    fn decrypt(&self, _secret: &(), bit: &bool) -> Result<bool, BackendError> {
        Ok(*bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boolcirc_core::gate::GateOp;

    /// Implements only the required operations, so every other gate runs
    /// through the trait's default composition.
    struct Minimal;

    impl GateBackend for Minimal {
        type Bit = bool;

        fn and(&self, a: &bool, b: &bool) -> Result<bool, BackendError> {
            Ok(*a && *b)
        }

        fn or(&self, a: &bool, b: &bool) -> Result<bool, BackendError> {
            Ok(*a || *b)
        }

        fn not(&self, a: &bool) -> Result<bool, BackendError> {
            Ok(!*a)
        }

        fn constant(&self, value: bool) -> Result<bool, BackendError> {
            Ok(value)
        }
    }

    const BINARY: [(GateOp, fn(bool, bool) -> bool); 10] = [
        (GateOp::And, |a, b| a & b),
        (GateOp::Or, |a, b| a | b),
        (GateOp::Xor, |a, b| a ^ b),
        (GateOp::Nand, |a, b| !(a & b)),
        (GateOp::Nor, |a, b| !(a | b)),
        (GateOp::Xnor, |a, b| !(a ^ b)),
        (GateOp::AndYn, |a, b| a & !b),
        (GateOp::AndNy, |a, b| !a & b),
        (GateOp::OrYn, |a, b| a | !b),
        (GateOp::OrNy, |a, b| !a | b),
    ];

    #[test]
    fn default_compositions_match_truth_tables() {
        for (op, expected) in BINARY {
            for a in [false, true] {
                for b in [false, true] {
                    assert_eq!(Minimal.evaluate(&op, &[a, b]).unwrap(), expected(a, b), "{}", op);
                    assert_eq!(
                        PlaintextBackend.evaluate(&op, &[a, b]).unwrap(),
                        expected(a, b),
                        "{}",
                        op
                    );
                }
            }
        }
    }

    #[test]
    fn mux_selects_first_data_operand_on_control() {
        for backend in [&Minimal as &dyn GateBackend<Bit = bool>, &PlaintextBackend] {
            assert!(backend.evaluate(&GateOp::Mux, &[true, true, false]).unwrap());
            assert!(!backend.evaluate(&GateOp::Mux, &[false, true, false]).unwrap());
        }
    }

    #[test]
    fn evaluate_checks_arity_and_rejects_inputs() {
        assert!(matches!(
            PlaintextBackend.evaluate(&GateOp::And, &[true]),
            Err(BackendError::Arity { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            PlaintextBackend.evaluate(&GateOp::Input, &[]),
            Err(BackendError::NotEvaluable { .. })
        ));
        let cell = GateOp::Cell {
            cell: "and2".into(),
            pin: "Y".into(),
        };
        assert!(matches!(
            PlaintextBackend.evaluate(&cell, &[true, true]),
            Err(BackendError::UnsupportedCell { .. })
        ));
    }

    #[test]
    fn codec_is_identity() {
        let bit = PlaintextBackend.encrypt(&(), true).unwrap();
        assert!(PlaintextBackend.decrypt(&(), &bit).unwrap());
        assert!(!PlaintextBackend.encode(false).unwrap());
    }
}
