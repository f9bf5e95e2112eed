//! Bit-level dataflow IR adapter.
//!
//! A function body arrives as JSON: a list of numbered nodes in definition
//! order plus the id of the node holding the return value.
//!
//! ```json
//! {
//!   "name": "not_first",
//!   "nodes": [
//!     {"id": 1, "op": "bit_slice", "param": "x", "start": 0},
//!     {"id": 2, "op": "not", "operand": 1},
//!     {"id": 3, "op": "literal", "value": 0, "width": 7},
//!     {"id": 4, "op": "concat", "operands": [3, 2]}
//!   ],
//!   "ret": 4
//! }
//! ```
//!
//! Bitwise nodes (`and`, `or`, `xor`, `not`, `mux`) take single-bit
//! operands. `concat` lists operands most significant first. When the
//! function has in/out parameters the return node is a `tuple` of the return
//! value (if any) followed by each in/out parameter's new value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::CoreError;
use crate::gate::GateOp;
use crate::id::WireId;
use crate::metadata::FunctionMetadata;

/// One IR operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IrOp {
    Literal {
        value: u64,
        #[serde(default = "one")]
        width: usize,
    },
    BitSlice {
        param: String,
        start: usize,
        #[serde(default = "one")]
        width: usize,
    },
    Not {
        operand: u32,
    },
    And {
        operands: Vec<u32>,
    },
    Or {
        operands: Vec<u32>,
    },
    Xor {
        operands: Vec<u32>,
    },
    /// `control ? on_true : on_false`
    Mux {
        control: u32,
        on_true: u32,
        on_false: u32,
    },
    /// Most significant operand first.
    Concat {
        operands: Vec<u32>,
    },
    Tuple {
        elements: Vec<u32>,
    },
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrNode {
    pub id: u32,
    #[serde(flatten)]
    pub op: IrOp,
}

/// A function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrFunction {
    pub name: String,
    pub nodes: Vec<IrNode>,
    /// Node holding the return value.
    pub ret: u32,
}

impl IrFunction {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Lowered node value.
#[derive(Debug, Clone)]
enum Value {
    /// LSB first.
    Bits(Vec<WireId>),
    Tuple(Vec<Value>),
}

impl Value {
    fn flatten_into(&self, out: &mut Vec<WireId>) {
        match self {
            Value::Bits(bits) => out.extend_from_slice(bits),
            Value::Tuple(elements) => elements.iter().for_each(|e| e.flatten_into(out)),
        }
    }
}

fn unsupported(reason: impl Into<String>) -> CoreError {
    CoreError::UnsupportedIr {
        reason: reason.into(),
    }
}

/// Input pin name for bit `index` of a parameter.
fn pin_name(param: &str, width: usize, index: usize) -> String {
    if width == 1 {
        param.to_string()
    } else {
        format!("{}[{}]", param, index)
    }
}

struct Lowering<'a> {
    circuit: Circuit,
    values: HashMap<u32, Value>,
    params: HashMap<&'a str, Vec<WireId>>,
    constants: [Option<WireId>; 2],
    /// Widest literal accepted: the widest parameter or return value.
    max_literal: usize,
}

impl Lowering<'_> {
    fn value(&self, id: u32) -> Result<&Value, CoreError> {
        self.values
            .get(&id)
            .ok_or_else(|| unsupported(format!("node {} used before its definition", id)))
    }

    fn bit(&self, id: u32) -> Result<WireId, CoreError> {
        match self.value(id)? {
            Value::Bits(bits) if bits.len() == 1 => Ok(bits[0]),
            Value::Bits(bits) => Err(unsupported(format!(
                "node {} is {} bits wide where a single bit is required",
                id,
                bits.len()
            ))),
            Value::Tuple(_) => Err(unsupported(format!("node {} is a tuple", id))),
        }
    }

    fn constant(&mut self, value: bool) -> WireId {
        match self.constants[usize::from(value)] {
            Some(wire) => wire,
            None => {
                let wire = self.circuit.add_constant(value);
                self.constants[usize::from(value)] = Some(wire);
                wire
            }
        }
    }

    fn fold(&mut self, op: GateOp, operands: &[u32]) -> Result<WireId, CoreError> {
        let (first, rest) = operands
            .split_first()
            .ok_or_else(|| unsupported(format!("{} without operands", op)))?;
        let mut acc = self.bit(*first)?;
        for id in rest {
            let rhs = self.bit(*id)?;
            acc = self.circuit.add_gate(op.clone(), [acc, rhs])?;
        }
        Ok(acc)
    }

    fn lower(&mut self, op: &IrOp) -> Result<Value, CoreError> {
        Ok(match op {
            IrOp::Literal { value, width } => {
                if *width > self.max_literal {
                    return Err(unsupported(format!(
                        "literal of width {} is wider than any parameter or return value ({})",
                        width, self.max_literal
                    )));
                }
                Value::Bits(
                    (0..*width)
                        .map(|i| self.constant(i < 64 && value >> i & 1 == 1))
                        .collect(),
                )
            }
            IrOp::BitSlice {
                param,
                start,
                width,
            } => {
                let bits = self
                    .params
                    .get(param.as_str())
                    .ok_or_else(|| CoreError::ParameterNotFound {
                        name: param.clone(),
                    })?;
                let slice = start
                    .checked_add(*width)
                    .and_then(|end| bits.get(*start..end));
                let slice = slice.ok_or_else(|| {
                    unsupported(format!(
                        "bit_slice {}[{}+:{}] exceeds width {}",
                        param,
                        start,
                        width,
                        bits.len()
                    ))
                })?;
                Value::Bits(slice.to_vec())
            }
            IrOp::Not { operand } => {
                let bit = self.bit(*operand)?;
                Value::Bits(vec![self.circuit.add_gate(GateOp::Not, [bit])?])
            }
            IrOp::And { operands } => Value::Bits(vec![self.fold(GateOp::And, operands)?]),
            IrOp::Or { operands } => Value::Bits(vec![self.fold(GateOp::Or, operands)?]),
            IrOp::Xor { operands } => Value::Bits(vec![self.fold(GateOp::Xor, operands)?]),
            IrOp::Mux {
                control,
                on_true,
                on_false,
            } => {
                let args = [self.bit(*control)?, self.bit(*on_true)?, self.bit(*on_false)?];
                Value::Bits(vec![self.circuit.add_gate(GateOp::Mux, args)?])
            }
            IrOp::Concat { operands } => {
                let mut bits = Vec::new();
                for id in operands.iter().rev() {
                    match self.value(*id)? {
                        Value::Bits(part) => bits.extend_from_slice(part),
                        Value::Tuple(_) => {
                            return Err(unsupported(format!("concat of tuple node {}", id)))
                        }
                    }
                }
                Value::Bits(bits)
            }
            IrOp::Tuple { elements } => Value::Tuple(
                elements
                    .iter()
                    .map(|id| self.value(*id).cloned())
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl Circuit {
    /// Lowers an IR function against its metadata.
    ///
    /// Input pins are declared parameter by parameter in metadata order, bit
    /// 0 first, named `param[i]` (or `param` for one-bit parameters). Output
    /// pins are the flattened return value, named `out[i]`.
    pub fn from_ir(function: &IrFunction, metadata: &FunctionMetadata) -> Result<Circuit, CoreError> {
        let mut lowering = Lowering {
            circuit: Circuit::new(function.name.clone()),
            values: HashMap::new(),
            params: HashMap::new(),
            constants: [None, None],
            max_literal: metadata
                .params
                .iter()
                .map(|p| p.width)
                .chain([metadata.return_width, 1])
                .max()
                .unwrap_or(1),
        };
        for param in &metadata.params {
            let bits = (0..param.width)
                .map(|i| lowering.circuit.add_input(pin_name(&param.name, param.width, i)))
                .collect();
            lowering.params.insert(param.name.as_str(), bits);
        }

        for node in &function.nodes {
            if lowering.values.contains_key(&node.id) {
                return Err(unsupported(format!("node {} defined twice", node.id)));
            }
            let value = lowering.lower(&node.op)?;
            lowering.values.insert(node.id, value);
        }

        let mut outputs = Vec::new();
        lowering.value(function.ret)?.flatten_into(&mut outputs);
        for (i, wire) in outputs.into_iter().enumerate() {
            lowering.circuit.add_output(format!("out[{}]", i), wire)?;
        }
        Ok(lowering.circuit)
    }
}
