//! Cell-level dependency analysis and net-name helpers.

use std::collections::HashMap;

use super::{Module, Net};
use crate::error::CoreError;
use crate::graph::DependencyGraph;
use crate::liberty::CellLibrary;

/// Maps each driven wire to the instance name of the cell driving it.
pub(super) fn drivers<'m>(
    module: &'m Module,
    library: &CellLibrary,
) -> Result<HashMap<&'m str, &'m str>, CoreError> {
    let mut drivers = HashMap::new();
    for inst in &module.cells {
        let def = library.cell(&inst.cell)?;
        for (pin, net) in &inst.connections {
            if !def.is_input(pin) && !def.is_output(pin) {
                return Err(CoreError::parse(
                    "netlist",
                    inst.line,
                    format!("cell {} ({}) has no pin {}", inst.name, inst.cell, pin),
                ));
            }
            match net {
                Net::Wire(name) if def.is_output(pin) => {
                    drivers.insert(name.as_str(), inst.name.as_str());
                }
                _ => {}
            }
        }
    }
    Ok(drivers)
}

/// Where a consumed net ultimately comes from once `assign` aliases are
/// followed.
pub(super) enum Source<'m> {
    /// Driven by the cell instance `cell` through the wire named `wire`.
    Cell { cell: &'m str, wire: &'m str },
    Input(&'m str),
    Constant(bool),
}

pub(super) fn trace_source<'m>(
    module: &'m Module,
    drivers: &HashMap<&'m str, &'m str>,
    net: &Net,
) -> Result<Source<'m>, CoreError> {
    let mut current = net;
    // An alias chain longer than the assign table loops.
    for _ in 0..=module.assigns.len() {
        let name = match current {
            Net::Constant(value) => return Ok(Source::Constant(*value)),
            Net::Wire(name) => name.as_str(),
        };
        if let Some((&wire, &cell)) = drivers.get_key_value(name) {
            return Ok(Source::Cell { cell, wire });
        }
        if let Some(input) = module.inputs.get(name) {
            return Ok(Source::Input(input));
        }
        match module.assigns.get(name) {
            Some(next) => current = next,
            None => break,
        }
    }
    Err(CoreError::UninitializedWire {
        net: net.to_string(),
    })
}

/// Dependency graph over cell instance names: an edge runs from the cell
/// driving a wire to every cell reading it. Constant and module-input
/// operands add no edge; every cell is a vertex.
pub fn cell_graph(
    module: &Module,
    library: &CellLibrary,
) -> Result<DependencyGraph<String, ()>, CoreError> {
    let drivers = drivers(module, library)?;
    let mut graph = DependencyGraph::new();
    for inst in &module.cells {
        graph.add_vertex(inst.name.clone(), ());
    }
    for inst in &module.cells {
        let def = library.cell(&inst.cell)?;
        for (pin, net) in &inst.connections {
            if !def.is_input(pin) {
                continue;
            }
            if let Source::Cell { cell, .. } = trace_source(module, &drivers, net)? {
                graph.add_edge(&cell.to_string(), &inst.name);
            }
        }
    }
    Ok(graph)
}

/// Cell instance names in a dependency-respecting order.
pub fn topo_sorted_cell_names(
    module: &Module,
    library: &CellLibrary,
) -> Result<Vec<String>, CoreError> {
    cell_graph(module, library)?.topological_sort()
}

/// Cell instance names grouped into levels, input-most first. Cells within
/// one level can be evaluated in parallel.
pub fn level_sorted_cell_names(
    module: &Module,
    library: &CellLibrary,
) -> Result<Vec<Vec<String>>, CoreError> {
    cell_graph(module, library)?.sort_graph_by_levels()
}

/// `"c[3]"` -> `"c"`; names without a subscript are returned whole.
pub fn net_stem(net: &str) -> &str {
    match net.find('[') {
        Some(index) => &net[..index],
        None => net,
    }
}

/// `"c[3]"` -> `3`; `0` when there is no subscript.
pub fn net_index(net: &str) -> Result<usize, CoreError> {
    let Some(open) = net.find('[') else {
        return Ok(0);
    };
    let inner = net[open + 1..].split(']').next().unwrap_or("");
    inner.parse().map_err(|_| CoreError::InvalidNetRef {
        net: net.to_string(),
        reason: format!("non-integral index '{}'", inner),
    })
}

/// `"_12_"` -> `12`, the synthesizer's numbered internal nets.
pub fn numeric_net_id(net: &str) -> Result<u32, CoreError> {
    let stripped = net.strip_prefix('_').unwrap_or(net);
    let stripped = stripped.strip_suffix('_').unwrap_or(stripped);
    stripped.parse().map_err(|_| CoreError::InvalidNetRef {
        net: net.to_string(),
        reason: "expected an id like '_0123_'".to_string(),
    })
}

/// `"<constant_1>"` -> `1`.
pub fn constant_value(text: &str) -> Result<u32, CoreError> {
    text.strip_prefix("<constant_")
        .and_then(|rest| rest.strip_suffix('>'))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| CoreError::InvalidConstant {
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four cells: _3_ and _4_ both read _1_'s output through an alias.
    const NETLIST: &str = r#"
module chain(a, b, out);
  input a;
  input b;
  output [1:0] out;
  wire _5_;
  wire _6_;
  wire _7_;
  and2 _1_ ( .A(a), .B(b), .Y(_5_) );
  assign _6_ = _5_;
  inv _3_ ( .A(_6_), .Y(_7_) );
  or2 _4_ ( .A(_5_), .B(1'h1), .Y(out[1]) );
  xor2 _2_ ( .A(a), .B(1'h0), .Y(out[0]) );
endmodule
"#;

    fn module(text: &str) -> Module {
        Module::parse(text).unwrap()
    }

    #[test]
    fn graph_follows_aliases_and_skips_ports_and_constants() {
        let m = module(NETLIST);
        let graph = cell_graph(&m, &CellLibrary::builtin()).unwrap();
        assert_eq!(graph.vertices(), vec!["_1_", "_2_", "_3_", "_4_"]);
        assert_eq!(graph.edges_out_of(&"_1_".to_string()), vec!["_3_", "_4_"]);
        assert!(graph.edges_into(&"_2_".to_string()).is_empty());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn level_and_topo_sorted_names() {
        let m = module(NETLIST);
        let lib = CellLibrary::builtin();
        assert_eq!(
            level_sorted_cell_names(&m, &lib).unwrap(),
            vec![vec!["_1_".to_string()], vec!["_2_".into(), "_3_".into(), "_4_".into()]]
        );
        let order = topo_sorted_cell_names(&m, &lib).unwrap();
        assert_eq!(order.len(), 4);
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("_1_") < pos("_3_"));
        assert!(pos("_1_") < pos("_4_"));
    }

    #[test]
    fn undriven_wire_is_reported() {
        let text = r#"
module m(a, y);
  input a;
  output y;
  wire _9_;
  and2 _1_ ( .A(a), .B(_9_), .Y(y) );
endmodule
"#;
        let err = cell_graph(&module(text), &CellLibrary::builtin()).unwrap_err();
        assert_eq!(err.to_string(), "usage of uninitialized wire _9_");
    }

    #[test]
    fn unknown_cell_and_pin_are_reported() {
        let lib = CellLibrary::builtin();
        let m = module("module m(a); input a; lut3 _1_ ( .A(a) ); endmodule");
        assert!(matches!(cell_graph(&m, &lib), Err(CoreError::CellNotFound { .. })));
        let m = module("module m(a); input a; inv _1_ ( .Q(a) ); endmodule");
        assert!(matches!(cell_graph(&m, &lib), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn net_name_helpers() {
        assert_eq!(net_stem("c[3]"), "c");
        assert_eq!(net_stem("flag"), "flag");
        assert_eq!(net_index("c[3]").unwrap(), 3);
        assert_eq!(net_index("flag").unwrap(), 0);
        assert!(matches!(net_index("c[x]"), Err(CoreError::InvalidNetRef { .. })));
        assert_eq!(numeric_net_id("_12_").unwrap(), 12);
        assert_eq!(numeric_net_id("_0123_").unwrap(), 123);
        assert!(numeric_net_id("out").is_err());
        assert_eq!(constant_value("<constant_1>").unwrap(), 1);
        assert_eq!(constant_value("<constant_0>").unwrap(), 0);
        assert!(matches!(
            constant_value("constant_1"),
            Err(CoreError::InvalidConstant { .. })
        ));
    }
}
