//! Function metadata: the signature half of the wiring contract.
//!
//! Produced alongside the circuit by the frontend, and read here from JSON:
//!
//! ```json
//! {
//!   "name": "my_package",
//!   "params": [
//!     {"name": "c", "width": 8, "is_reference": true},
//!     {"name": "key", "width": 8, "is_const": true}
//!   ],
//!   "return_width": 0
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Width in bits.
    pub width: usize,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_reference: bool,
}

impl Param {
    /// A mutable reference parameter: read as input, written back as output.
    pub fn is_in_out(&self) -> bool {
        self.is_reference && !self.is_const
    }
}

/// Signature of the transpiled top-level function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMetadata {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    /// Width of the return value in bits; 0 for `void`.
    #[serde(default)]
    pub return_width: usize,
}

impl FunctionMetadata {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn param(&self, name: &str) -> Result<&Param, CoreError> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CoreError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    pub fn in_out_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.is_in_out())
    }

    /// Total input bits across all parameters.
    pub fn input_width(&self) -> usize {
        self.params.iter().map(|p| p.width).sum()
    }

    /// Total output bits: the return value plus every in/out parameter.
    pub fn output_width(&self) -> usize {
        self.return_width + self.in_out_params().map(|p| p.width).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "rot",
        "params": [
            {"name": "c", "width": 8, "is_reference": true},
            {"name": "key", "width": 8, "is_reference": true, "is_const": true},
            {"name": "n", "width": 4}
        ],
        "return_width": 1
    }"#;

    #[test]
    fn parses_flags_with_defaults() {
        let meta = FunctionMetadata::from_json(SAMPLE).unwrap();
        assert_eq!(meta.params.len(), 3);
        assert!(meta.params[0].is_in_out());
        assert!(!meta.params[1].is_in_out());
        assert!(!meta.params[2].is_in_out());
        assert_eq!(meta.input_width(), 20);
        assert_eq!(meta.output_width(), 9);
    }

    #[test]
    fn missing_param_is_not_found() {
        let meta = FunctionMetadata::from_json(SAMPLE).unwrap();
        assert_eq!(meta.param("n").unwrap().width, 4);
        assert!(matches!(
            meta.param("zz"),
            Err(CoreError::ParameterNotFound { name }) if name == "zz"
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            FunctionMetadata::from_json("{\"params\": 3}"),
            Err(CoreError::Json(_))
        ));
    }
}
