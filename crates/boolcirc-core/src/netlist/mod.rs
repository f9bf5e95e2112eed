//! Gate-level structural netlists.
//!
//! [`Module::parse`] reads the Verilog subset produced by logic synthesis
//! against a bootstrapped-gate cell library: port and wire declarations, cell
//! instances with named pin connections, and `assign` statements. Every net
//! is flattened to single bits named `name[index]` (or `name` for scalars).
//!
//! [`analysis`] builds the cell dependency graph used for scheduling reports,
//! and `Circuit::from_netlist` turns a module into a
//! [`Circuit`](crate::circuit::Circuit).

pub mod analysis;
mod lexer;
mod lower;
mod parser;

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::CoreError;

pub use analysis::{
    cell_graph, constant_value, level_sorted_cell_names, net_index, net_stem, numeric_net_id,
    topo_sorted_cell_names,
};

/// One bit of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Net {
    Wire(String),
    Constant(bool),
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Net::Wire(name) => f.write_str(name),
            Net::Constant(value) => write!(f, "<constant_{}>", u8::from(*value)),
        }
    }
}

/// A cell instance: `CELL NAME ( .PIN(net), ... );`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellInstance {
    /// Library cell type, e.g. `and2`.
    pub cell: String,
    /// Instance name, unique within the module.
    pub name: String,
    pub line: usize,
    /// Connected pins; unconnected pins are omitted.
    pub connections: Vec<(String, Net)>,
}

impl CellInstance {
    pub fn net(&self, pin: &str) -> Option<&Net> {
        self.connections
            .iter()
            .find(|(p, _)| p == pin)
            .map(|(_, net)| net)
    }
}

/// A flattened netlist module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// Input bits, by `input` declaration order then ascending index.
    pub inputs: IndexSet<String>,
    /// Output bits, by port-list order then ascending index.
    pub outputs: IndexSet<String>,
    pub cells: Vec<CellInstance>,
    /// Bit-level `assign` aliases: target net -> source.
    pub assigns: IndexMap<String, Net>,
}

impl Module {
    /// Parses a netlist holding exactly one module.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        parser::parse_module(text)
    }

    pub fn is_input(&self, net: &str) -> bool {
        self.inputs.contains(net)
    }

    pub fn cell(&self, name: &str) -> Option<&CellInstance> {
        self.cells.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD_ONE: &str = r#"
module add_one(x, out);
  wire _0_;
  input [1:0] x;
  wire [1:0] x;
  output [1:0] out;
  wire [1:0] out;
  inv _1_ ( .A(x[0]), .Y(out[0]) );
  xor2 _2_ ( .A(x[0]), .B(x[1]), .Y(_0_) );
  assign out[1] = _0_;
endmodule
"#;

    #[test]
    fn parses_ports_cells_and_assigns() {
        let m = Module::parse(ADD_ONE).unwrap();
        assert_eq!(m.name, "add_one");
        assert_eq!(m.inputs.iter().collect::<Vec<_>>(), vec!["x[0]", "x[1]"]);
        assert_eq!(m.outputs.iter().collect::<Vec<_>>(), vec!["out[0]", "out[1]"]);
        assert_eq!(m.cells.len(), 2);
        let xor = m.cell("_2_").unwrap();
        assert_eq!(xor.cell, "xor2");
        assert_eq!(xor.line, 9);
        assert_eq!(xor.net("B"), Some(&Net::Wire("x[1]".into())));
        assert_eq!(m.assigns["out[1]"], Net::Wire("_0_".into()));
        assert!(m.is_input("x[1]"));
        assert!(!m.is_input("_0_"));
    }

    #[test]
    fn assign_concat_aligns_lsb_and_pads_constants() {
        let text = r#"
module m(data, out);
  input [2:0] data;
  output [2:0] out;
  wire _0_;
  inv _0_ ( .A(data[1]), .Y(_0_) );
  assign { out[1:0] } = { data[0], _0_ };
  assign out[2] = 1'h1;
endmodule
"#;
        let m = Module::parse(text).unwrap();
        assert_eq!(m.assigns["out[0]"], Net::Wire("_0_".into()));
        assert_eq!(m.assigns["out[1]"], Net::Wire("data[0]".into()));
        assert_eq!(m.assigns["out[2]"], Net::Constant(true));
    }

    #[test]
    fn inputs_follow_declaration_order_not_port_list() {
        let text = r#"
module f(a, c, out);
  input c;
  input [1:0] a;
  output [2:0] out;
  inv g0 ( .A(a[0]), .Y(out[2]) );
  assign out[1:0] = { a[1], c };
endmodule
"#;
        let m = Module::parse(text).unwrap();
        assert_eq!(m.inputs.iter().collect::<Vec<_>>(), vec!["c", "a[0]", "a[1]"]);
        assert_eq!(
            m.outputs.iter().collect::<Vec<_>>(),
            vec!["out[0]", "out[1]", "out[2]"]
        );
    }

    #[test]
    fn wire_redeclaration_keeps_input_position() {
        let text = "module m(y, x); wire y; input x; input y; endmodule";
        let m = Module::parse(text).unwrap();
        assert_eq!(m.inputs.iter().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn wide_constant_assign_truncates() {
        let text = "module m(o); output [2:0] o; assign o[2:0] = 6'h05; endmodule";
        let m = Module::parse(text).unwrap();
        assert_eq!(m.assigns["o[0]"], Net::Constant(true));
        assert_eq!(m.assigns["o[1]"], Net::Constant(false));
        assert_eq!(m.assigns["o[2]"], Net::Constant(true));
    }

    #[test]
    fn parse_errors() {
        let cases = [
            ("module m(a); input a; endmodule module n(); endmodule", "only one module"),
            ("module m(a); input [1:0] a; inv u ( .A(a), .Y() ); endmodule", "2 bits"),
            ("module m(a); input a; inv u ( .A(b) ); endmodule", "undeclared net b"),
            ("module m(a); input [1:0] a; inv u ( .A(a[4]) ); endmodule", "out of range"),
            ("module m(a); input a; inv u ( a ); endmodule", "positional"),
            ("module m(a); wire a; endmodule", "no direction"),
            ("module m(a); input a; output b; endmodule", "missing from the port list"),
            ("module m(a); input a; assign a = 1'h0; assign a = 1'h1; endmodule", "assigned twice"),
            ("module m(a); inout a; endmodule", "inout"),
        ];
        for (text, needle) in cases {
            match Module::parse(text) {
                Err(CoreError::Parse { message, .. }) => {
                    assert!(message.contains(needle), "{:?} lacks {:?}", message, needle)
                }
                other => panic!("{:?}: expected parse error, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn constant_display_matches_net_naming() {
        assert_eq!(Net::Constant(true).to_string(), "<constant_1>");
        assert_eq!(Net::Wire("c[3]".into()).to_string(), "c[3]");
    }
}
