//! Circuit representation.
//!
//! A [`Circuit`] is an ordered list of gate nodes plus the circuit's external
//! interface: input pins in declaration order and output pins in output-port
//! order. Pin names follow the netlist convention `name[index]`, or a bare
//! `name` for single-bit ports.
//!
//! Circuits are built either with the builder methods here, lowered from a
//! netlist (`Circuit::from_netlist`), lowered from the
//! dataflow IR ([`crate::ir`]), or loaded from JSON.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::gate::{GateNode, GateOp};
use crate::graph::DependencyGraph;
use crate::id::WireId;

/// A named external connection of the circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    pub wire: WireId,
}

/// An ordered list of gate nodes with named input and output pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    nodes: Vec<GateNode>,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
}

impl Circuit {
    pub fn new(name: impl Into<String>) -> Self {
        Circuit {
            name: name.into(),
            nodes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Declares the next input pin and returns its wire.
    pub fn add_input(&mut self, name: impl Into<String>) -> WireId {
        let wire = self.push(GateNode::new(GateOp::Input, []));
        self.inputs.push(Pin {
            name: name.into(),
            wire,
        });
        wire
    }

    pub fn add_constant(&mut self, value: bool) -> WireId {
        self.push(GateNode::new(GateOp::Constant { value }, []))
    }

    /// Appends a gate. Operands must name wires that already exist.
    pub fn add_gate(
        &mut self,
        op: GateOp,
        operands: impl IntoIterator<Item = WireId>,
    ) -> Result<WireId, CoreError> {
        let node = GateNode::new(op, operands);
        if let Some(bad) = node.operands.iter().find(|w| w.index() >= self.nodes.len()) {
            return Err(CoreError::InvalidCircuit {
                reason: format!("operand {} of new {} gate does not exist yet", bad, node.op),
            });
        }
        check_arity(&node, WireId::from(self.nodes.len()))?;
        Ok(self.push(node))
    }

    /// Declares the next output pin, driven by `wire`.
    pub fn add_output(&mut self, name: impl Into<String>, wire: WireId) -> Result<(), CoreError> {
        if wire.index() >= self.nodes.len() {
            return Err(CoreError::InvalidCircuit {
                reason: format!("output driven by unknown wire {}", wire),
            });
        }
        self.outputs.push(Pin {
            name: name.into(),
            wire,
        });
        Ok(())
    }

    fn push(&mut self, node: GateNode) -> WireId {
        let wire = WireId::from(self.nodes.len());
        self.nodes.push(node);
        wire
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[GateNode] {
        &self.nodes
    }

    pub fn node(&self, wire: WireId) -> Option<&GateNode> {
        self.nodes.get(wire.index())
    }

    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }

    /// Number of nodes evaluated by the backend (everything but inputs).
    pub fn gate_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.op.is_input()).count()
    }

    /// Operand -> consumer dependency graph over every node.
    pub fn dependency_graph(&self) -> DependencyGraph<WireId, GateOp> {
        let mut graph = DependencyGraph::new();
        for (index, node) in self.nodes.iter().enumerate() {
            graph.add_vertex(WireId::from(index), node.op.clone());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            let consumer = WireId::from(index);
            for operand in &node.operands {
                graph.add_edge(operand, &consumer);
            }
        }
        graph
    }

    /// Wires bucketed by level, input-most bucket first.
    pub fn levels(&self) -> Result<Vec<Vec<WireId>>, CoreError> {
        self.dependency_graph().sort_graph_by_levels()
    }

    /// Checks structural consistency: operand and pin references are in
    /// range, fixed-arity ops have the right operand count, every input node
    /// is declared by exactly one input pin, and the graph is acyclic.
    pub fn validate(&self) -> Result<(), CoreError> {
        let len = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            let wire = WireId::from(index);
            if let Some(bad) = node.operands.iter().find(|w| w.index() >= len) {
                return Err(CoreError::InvalidCircuit {
                    reason: format!("{} reads unknown wire {}", wire, bad),
                });
            }
            check_arity(node, wire)?;
        }

        let mut declared = HashSet::new();
        for pin in &self.inputs {
            let is_input = self.node(pin.wire).is_some_and(|n| n.op.is_input());
            if !is_input || !declared.insert(pin.wire) {
                return Err(CoreError::InvalidCircuit {
                    reason: format!("input pin '{}' does not name a distinct input node", pin.name),
                });
            }
        }
        let input_nodes = self.nodes.iter().filter(|n| n.op.is_input()).count();
        if input_nodes != declared.len() {
            return Err(CoreError::InvalidCircuit {
                reason: format!(
                    "{} input nodes but {} input pins",
                    input_nodes,
                    declared.len()
                ),
            });
        }

        if let Some(pin) = self.outputs.iter().find(|p| p.wire.index() >= len) {
            return Err(CoreError::InvalidCircuit {
                reason: format!("output pin '{}' reads unknown wire {}", pin.name, pin.wire),
            });
        }

        self.dependency_graph().topological_sort()?;
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let circuit: Circuit = serde_json::from_str(text)?;
        circuit.validate()?;
        Ok(circuit)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_arity(node: &GateNode, wire: WireId) -> Result<(), CoreError> {
    match node.op.arity() {
        Some(expected) if expected != node.operands.len() => Err(CoreError::InvalidCircuit {
            reason: format!(
                "{} gate {} expects {} operands, got {}",
                node.op,
                wire,
                expected,
                node.operands.len()
            ),
        }),
        _ => Ok(()),
    }
}
