//! Netlist -> circuit lowering.

use std::collections::HashMap;

use super::analysis::{cell_graph, drivers, trace_source, Source};
use super::{Module, Net};
use crate::circuit::Circuit;
use crate::error::CoreError;
use crate::gate::GateOp;
use crate::id::WireId;
use crate::liberty::CellLibrary;

struct Lowering<'m> {
    module: &'m Module,
    drivers: HashMap<&'m str, &'m str>,
    circuit: Circuit,
    inputs: HashMap<&'m str, WireId>,
    /// Cell-driven wire name -> gate node.
    nets: HashMap<&'m str, WireId>,
    constants: [Option<WireId>; 2],
}

impl Lowering<'_> {
    fn resolve(&mut self, net: &Net) -> Result<WireId, CoreError> {
        let wire = match trace_source(self.module, &self.drivers, net)? {
            Source::Constant(value) => match self.constants[usize::from(value)] {
                Some(wire) => wire,
                None => {
                    let wire = self.circuit.add_constant(value);
                    self.constants[usize::from(value)] = Some(wire);
                    wire
                }
            },
            Source::Input(name) => self.inputs[name],
            Source::Cell { wire, .. } => {
                *self
                    .nets
                    .get(wire)
                    .ok_or_else(|| CoreError::UninitializedWire {
                        net: wire.to_string(),
                    })?
            }
        };
        Ok(wire)
    }
}

impl Circuit {
    /// Lowers a parsed netlist module.
    ///
    /// Each connected output pin of each cell instance becomes one
    /// [`GateOp::Cell`] node whose operands are the cell's input-pin nets in
    /// the library's pin order. Module inputs become input pins in module
    /// input order; module outputs become output pins in output-port order.
    /// Cells are emitted in dependency order and the two constants are
    /// emitted at most once each.
    pub fn from_netlist(module: &Module, library: &CellLibrary) -> Result<Circuit, CoreError> {
        let order = cell_graph(module, library)?.topological_sort()?;
        let by_name: HashMap<&str, _> = module.cells.iter().map(|c| (c.name.as_str(), c)).collect();

        let mut lowering = Lowering {
            module,
            drivers: drivers(module, library)?,
            circuit: Circuit::new(module.name.clone()),
            inputs: HashMap::new(),
            nets: HashMap::new(),
            constants: [None, None],
        };
        for name in &module.inputs {
            let wire = lowering.circuit.add_input(name.clone());
            lowering.inputs.insert(name, wire);
        }

        for name in &order {
            let inst = by_name[name.as_str()];
            let def = library.cell(&inst.cell)?;
            let mut operands = Vec::with_capacity(def.inputs.len());
            for pin in &def.inputs {
                let net = inst.net(pin).ok_or_else(|| {
                    CoreError::parse(
                        "netlist",
                        inst.line,
                        format!("input pin {}.{} is unconnected", inst.name, pin),
                    )
                })?;
                operands.push(lowering.resolve(net)?);
            }
            for output in &def.outputs {
                let Some(Net::Wire(driven)) = inst.net(&output.name) else {
                    continue;
                };
                let wire = lowering.circuit.add_gate(
                    GateOp::Cell {
                        cell: inst.cell.clone(),
                        pin: output.name.clone(),
                    },
                    operands.iter().copied(),
                )?;
                lowering.nets.insert(driven, wire);
            }
        }

        for name in &module.outputs {
            let wire = lowering.resolve(&Net::Wire(name.clone()))?;
            lowering.circuit.add_output(name.clone(), wire)?;
        }
        Ok(lowering.circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plain evaluation in node order, for checking the lowering.
    fn simulate(circuit: &Circuit, library: &CellLibrary, inputs: &[bool]) -> Vec<bool> {
        let mut values: Vec<bool> = Vec::new();
        let mut next_input = inputs.iter();
        for node in circuit.nodes() {
            let value = match &node.op {
                GateOp::Input => *next_input.next().unwrap(),
                GateOp::Constant { value } => *value,
                GateOp::Cell { cell, pin } => {
                    let def = library.cell(cell).unwrap();
                    let args: Vec<bool> = node.operands.iter().map(|w| values[w.index()]).collect();
                    let env = |name: &str| def.inputs.iter().position(|p| p == name).map(|i| args[i]);
                    def.output(pin).unwrap().function.eval(&env).unwrap()
                }
                other => panic!("unexpected {:?}", other),
            };
            values.push(value);
        }
        circuit.outputs().iter().map(|p| values[p.wire.index()]).collect()
    }

    /// out = {x[1] ^ x[0], !x[0]}: a 2-bit increment.
    const INCREMENT2: &str = r#"
module inc2(x, out);
  wire _0_;
  input [1:0] x;
  output [1:0] out;
  xor2 _2_ ( .A(x[0]), .B(x[1]), .Y(_0_) );
  inv _1_ ( .A(x[0]), .Y(out[0]) );
  assign out[1] = _0_;
endmodule
"#;

    #[test]
    fn lowers_cells_in_dependency_order() {
        let lib = CellLibrary::builtin();
        let m = Module::parse(INCREMENT2).unwrap();
        let c = Circuit::from_netlist(&m, &lib).unwrap();
        c.validate().unwrap();
        assert_eq!(c.name(), "inc2");
        let inputs: Vec<_> = c.inputs().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(inputs, vec!["x[0]", "x[1]"]);
        let outputs: Vec<_> = c.outputs().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(outputs, vec!["out[0]", "out[1]"]);
        assert_eq!(c.gate_count(), 2);

        for x in 0..4u8 {
            let bits = [x & 1 == 1, x & 2 == 2];
            let out = simulate(&c, &lib, &bits);
            let y = (x + 1) % 4;
            assert_eq!(out, vec![y & 1 == 1, y & 2 == 2], "x = {}", x);
        }
    }

    #[test]
    fn outputs_may_alias_inputs_and_constants() {
        let text = r#"
module pass(data, out);
  input [2:0] data;
  output [2:0] out;
  wire _0_;
  inv _0_ ( .A(data[2]), .Y(_0_) );
  assign { out[1:0] } = { data[0], _0_ };
  assign out[2] = 1'h1;
endmodule
"#;
        let lib = CellLibrary::builtin();
        let c = Circuit::from_netlist(&Module::parse(text).unwrap(), &lib).unwrap();
        assert_eq!(c.outputs()[1].wire, c.inputs()[0].wire);
        assert_eq!(
            c.node(c.outputs()[2].wire).unwrap().op,
            GateOp::Constant { value: true }
        );
        assert_eq!(simulate(&c, &lib, &[true, false, true]), vec![false, true, true]);
    }

    #[test]
    fn mux_operands_follow_library_pin_order() {
        let text = r#"
module sel(a, b, s, y);
  input a; input b; input s;
  output y;
  imux2 _1_ ( .S(s), .B(b), .Y(y), .A(a) );
endmodule
"#;
        let lib = CellLibrary::builtin();
        let c = Circuit::from_netlist(&Module::parse(text).unwrap(), &lib).unwrap();
        let gate = c.node(c.outputs()[0].wire).unwrap();
        assert_eq!(gate.operands.as_slice(), &[WireId(0), WireId(1), WireId(2)]);
        assert_eq!(simulate(&c, &lib, &[true, false, true]), vec![true]);
        assert_eq!(simulate(&c, &lib, &[true, false, false]), vec![false]);
    }

    #[test]
    fn unconnected_input_pin_is_an_error() {
        let text = "module m(a, y); input a; output y; and2 _1_ ( .A(a), .Y(y) ); endmodule";
        let err = Circuit::from_netlist(&Module::parse(text).unwrap(), &CellLibrary::builtin())
            .unwrap_err();
        assert!(err.to_string().contains("unconnected"));
    }

    #[test]
    fn undriven_output_is_an_error() {
        let text = "module m(a, y); input a; output y; endmodule";
        let err = Circuit::from_netlist(&Module::parse(text).unwrap(), &CellLibrary::builtin())
            .unwrap_err();
        assert!(matches!(err, CoreError::UninitializedWire { net } if net == "y"));
    }
}
