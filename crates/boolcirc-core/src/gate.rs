//! Gate operations and gate nodes.
//!
//! A circuit is an ordered list of [`GateNode`]s. Each node drives exactly one
//! wire (its position in the list) and names its operands by [`WireId`].

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::WireId;

/// Operation performed by a gate node.
///
/// `Mux` operands are `[control, a, b]` and select `a` when control is set.
/// The two-letter suffixed ops follow the cell naming of bootstrapped gate
/// libraries: `AndYn(a, b) = a & !b`, `AndNy(a, b) = !a & b`,
/// `OrYn(a, b) = a | !b`, `OrNy(a, b) = !a | b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GateOp {
    /// External input bit, bound from the caller's arguments.
    Input,
    /// Literal bit.
    Constant { value: bool },
    Copy,
    Not,
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
    Mux,
    /// One output pin of a named library cell, resolved by the backend.
    Cell { cell: String, pin: String },
}

impl GateOp {
    /// Required operand count, or `None` when it depends on the cell library.
    pub fn arity(&self) -> Option<usize> {
        match self {
            GateOp::Input | GateOp::Constant { .. } => Some(0),
            GateOp::Copy | GateOp::Not => Some(1),
            GateOp::And
            | GateOp::Or
            | GateOp::Xor
            | GateOp::Nand
            | GateOp::Nor
            | GateOp::Xnor
            | GateOp::AndYn
            | GateOp::AndNy
            | GateOp::OrYn
            | GateOp::OrNy => Some(2),
            GateOp::Mux => Some(3),
            GateOp::Cell { .. } => None,
        }
    }

    /// True for nodes that are not evaluated by a worker: bound inputs.
    pub fn is_input(&self) -> bool {
        matches!(self, GateOp::Input)
    }

    /// Short name used in reports and DOT labels.
    pub fn mnemonic(&self) -> &str {
        match self {
            GateOp::Input => "input",
            GateOp::Constant { value: false } => "const0",
            GateOp::Constant { value: true } => "const1",
            GateOp::Copy => "copy",
            GateOp::Not => "not",
            GateOp::And => "and",
            GateOp::Or => "or",
            GateOp::Xor => "xor",
            GateOp::Nand => "nand",
            GateOp::Nor => "nor",
            GateOp::Xnor => "xnor",
            GateOp::AndYn => "andyn",
            GateOp::AndNy => "andny",
            GateOp::OrYn => "oryn",
            GateOp::OrNy => "orny",
            GateOp::Mux => "mux",
            GateOp::Cell { cell, .. } => cell,
        }
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOp::Cell { cell, pin } => write!(f, "{}.{}", cell, pin),
            other => f.write_str(other.mnemonic()),
        }
    }
}

/// A single-bit gate with resolved operand references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateNode {
    #[serde(flatten)]
    pub op: GateOp,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub operands: SmallVec<[WireId; 3]>,
}

impl GateNode {
    pub fn new(op: GateOp, operands: impl IntoIterator<Item = WireId>) -> Self {
        GateNode {
            op,
            operands: operands.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_of_fixed_ops() {
        assert_eq!(GateOp::Input.arity(), Some(0));
        assert_eq!(GateOp::Not.arity(), Some(1));
        assert_eq!(GateOp::OrNy.arity(), Some(2));
        assert_eq!(GateOp::Mux.arity(), Some(3));
        let cell = GateOp::Cell {
            cell: "imux2".into(),
            pin: "Y".into(),
        };
        assert_eq!(cell.arity(), None);
    }

    #[test]
    fn display_uses_mnemonic_or_cell_pin() {
        assert_eq!(GateOp::Constant { value: true }.to_string(), "const1");
        let cell = GateOp::Cell {
            cell: "and2".into(),
            pin: "Y".into(),
        };
        assert_eq!(cell.to_string(), "and2.Y");
        assert_eq!(cell.mnemonic(), "and2");
    }

    #[test]
    fn node_json_shape() {
        let node = GateNode::new(GateOp::Xor, [WireId(0), WireId(1)]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({"op": "xor", "operands": [0, 1]}));

        let input: GateNode = serde_json::from_str(r#"{"op":"input"}"#).unwrap();
        assert!(input.op.is_input());
        assert!(input.operands.is_empty());

        let constant: GateNode =
            serde_json::from_str(r#"{"op":"constant","value":true}"#).unwrap();
        assert_eq!(constant.op, GateOp::Constant { value: true });

        let cell = GateNode::new(
            GateOp::Cell {
                cell: "imux2".into(),
                pin: "Y".into(),
            },
            [WireId(2), WireId(0), WireId(1)],
        );
        let text = serde_json::to_string(&cell).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            serde_json::json!({"op": "cell", "cell": "imux2", "pin": "Y", "operands": [2, 0, 1]})
        );
    }
}
