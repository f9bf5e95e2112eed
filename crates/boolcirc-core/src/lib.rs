pub mod id;
pub mod error;
pub mod graph;
pub mod gate;
pub mod circuit;
pub mod metadata;
pub mod liberty;
pub mod netlist;
pub mod ir;

// Re-export commonly used types
pub use id::WireId;
pub use error::CoreError;
pub use graph::DependencyGraph;
pub use gate::{GateNode, GateOp};
pub use circuit::{Circuit, Pin};
pub use metadata::{FunctionMetadata, Param};
pub use liberty::{CellDef, CellLibrary, Expr, OutputPin};
pub use netlist::{CellInstance, Module, Net};
pub use ir::{IrFunction, IrNode, IrOp};
