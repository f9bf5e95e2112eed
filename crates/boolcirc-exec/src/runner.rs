//! Circuit runner: circuit + metadata + engine behind one `run` call.
//!
//! A runner is built from a netlist (with a cell library) or from dataflow
//! IR, and executes against any [`GateBackend`]. Callers pass named
//! argument buffers; the runner applies the wiring contract on the way in
//! and on the way out.

use boolcirc_backend::{GateBackend, NetlistBackend, PlaintextBackend};
use boolcirc_core::{Circuit, CellLibrary, FunctionMetadata, IrFunction, Module};
use tracing::info;

use crate::config::EngineConfig;
use crate::engine::{CancelHandle, Engine, RunStats};
use crate::error::EngineError;
use crate::wiring;

/// Named argument buffers for one run.
///
/// Read-only parameters are added with [`RunArgs::input`]; mutable
/// reference parameters are added with [`RunArgs::in_out`] and are
/// overwritten with the function's updated values.
pub struct RunArgs<'a, T> {
    inputs: Vec<(&'a str, &'a [T])>,
    in_out: Vec<(&'a str, &'a mut [T])>,
}

impl<T> Default for RunArgs<'_, T> {
    fn default() -> Self {
        RunArgs {
            inputs: Vec::new(),
            in_out: Vec::new(),
        }
    }
}

impl<'a, T> RunArgs<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, name: &'a str, bits: &'a [T]) -> Self {
        self.inputs.push((name, bits));
        self
    }

    pub fn in_out(mut self, name: &'a str, bits: &'a mut [T]) -> Self {
        self.in_out.push((name, bits));
        self
    }

    fn find(&self, name: &str) -> Option<&[T]> {
        self.inputs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bits)| *bits)
            .or_else(|| {
                self.in_out
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, bits)| &**bits)
            })
    }
}

pub struct CircuitRunner {
    circuit: Circuit,
    metadata: FunctionMetadata,
    library: CellLibrary,
    engine: Engine,
}

impl CircuitRunner {
    pub fn new(circuit: Circuit, metadata: FunctionMetadata, library: CellLibrary) -> Self {
        info!(
            function = %metadata.name,
            gates = circuit.gate_count(),
            inputs = circuit.inputs().len(),
            outputs = circuit.outputs().len(),
            "circuit runner ready"
        );
        CircuitRunner {
            circuit,
            metadata,
            library,
            engine: Engine::new(EngineConfig::from_env()),
        }
    }

    /// Builds a runner from netlist text. `liberty` is the cell library
    /// text; `None` selects the built-in gate set.
    pub fn from_netlist(
        liberty: Option<&str>,
        netlist: &str,
        metadata_json: &str,
    ) -> Result<Self, EngineError> {
        let library = match liberty {
            Some(text) => CellLibrary::parse(text)?,
            None => CellLibrary::builtin(),
        };
        let module = Module::parse(netlist)?;
        let circuit = Circuit::from_netlist(&module, &library)?;
        let metadata = FunctionMetadata::from_json(metadata_json)?;
        Ok(CircuitRunner::new(circuit, metadata, library))
    }

    /// Builds a runner from a JSON dataflow IR function.
    pub fn from_ir(ir_json: &str, metadata_json: &str) -> Result<Self, EngineError> {
        let function = IrFunction::from_json(ir_json)?;
        let metadata = FunctionMetadata::from_json(metadata_json)?;
        let circuit = Circuit::from_ir(&function, &metadata)?;
        Ok(CircuitRunner::new(circuit, metadata, CellLibrary::builtin()))
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.engine = Engine::new(config);
        self
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn metadata(&self) -> &FunctionMetadata {
        &self.metadata
    }

    pub fn library(&self) -> &CellLibrary {
        &self.library
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.engine.cancel_handle()
    }

    /// Wraps `inner` so it can evaluate this runner's library cells.
    pub fn cell_backend<B: GateBackend>(&self, inner: B) -> NetlistBackend<B> {
        NetlistBackend::new(inner, self.library.clone())
    }

    /// Runs the circuit on `backend`.
    ///
    /// `result` receives the return value and must be `return_width` bits.
    /// Every parameter must be present in `args`; in/out buffers are
    /// overwritten in place.
    ///
    /// # Panics
    ///
    /// Panics when buffer widths disagree with the metadata or the circuit.
    pub fn run<B: GateBackend>(
        &self,
        result: &mut [B::Bit],
        mut args: RunArgs<'_, B::Bit>,
        backend: &B,
    ) -> Result<RunStats, EngineError> {
        let bindings = {
            let mut ordered = Vec::with_capacity(self.metadata.params.len());
            for param in &self.metadata.params {
                let bits = args
                    .find(&param.name)
                    .ok_or_else(|| EngineError::MissingArgument {
                        name: param.name.clone(),
                    })?;
                ordered.push(bits);
            }
            wiring::bind_inputs(&self.circuit, &self.metadata, &ordered)
        };
        let evaluation = self.engine.evaluate(&self.circuit, bindings, backend)?;
        wiring::assemble_outputs(
            &self.circuit,
            &self.metadata,
            &evaluation.outputs,
            result,
            &mut args.in_out,
        );
        Ok(evaluation.stats)
    }

    /// Runs on plain booleans.
    pub fn run_plaintext(
        &self,
        result: &mut [bool],
        args: RunArgs<'_, bool>,
    ) -> Result<RunStats, EngineError> {
        self.run(result, args, &self.cell_backend(PlaintextBackend))
    }
}

/// `width` low bits of `value`, least significant first.
pub fn encode_le_bits(value: u64, width: usize) -> Vec<bool> {
    (0..width)
        .map(|i| i < 64 && (value >> i) & 1 == 1)
        .collect()
}

/// Inverse of [`encode_le_bits`]; bits past the 64th are ignored.
pub fn decode_le_bits(bits: &[bool]) -> u64 {
    bits.iter()
        .take(64)
        .enumerate()
        .fold(0, |acc, (i, bit)| acc | (u64::from(*bit) << i))
}
