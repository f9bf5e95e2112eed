//! Netlist-driven backend: `Cell { cell, pin }` nodes resolved by name.
//!
//! At construction every library cell whose truth table matches a gate the
//! inner backend has natively is bound to that gate in a name→callback
//! table (`"and2"` → `and`, `"imux2"` → `mux`, ...). Any other cell is
//! evaluated by walking its output function through the inner backend's
//! `and`/`or`/`not`/`xor`/`constant`, so arbitrary gate vocabularies work
//! at the cost of more backend calls.

use std::collections::HashMap;

use boolcirc_core::liberty::{CellDef, CellLibrary, Expr};
use tracing::debug;

use crate::error::BackendError;
use crate::traits::{BitCodec, GateBackend};

type Bit<B> = <B as GateBackend>::Bit;
type CellFn<B> = fn(&B, &[Bit<B>]) -> Result<Bit<B>, BackendError>;

/// One natively-mapped cell: its canonical name, truth function over the
/// library input-pin order, and the backend call.
struct Native<B: GateBackend> {
    name: &'static str,
    arity: usize,
    truth: fn(&[bool]) -> bool,
    call: CellFn<B>,
}

fn natives<B: GateBackend>() -> Vec<Native<B>> {
    macro_rules! unary {
        ($name:literal, $truth:expr, $method:ident) => {
            Native::<B> {
                name: $name,
                arity: 1,
                truth: $truth,
                call: |b, x| b.$method(&x[0]),
            }
        };
    }
    macro_rules! binary {
        ($name:literal, $truth:expr, $method:ident) => {
            Native::<B> {
                name: $name,
                arity: 2,
                truth: $truth,
                call: |b, x| b.$method(&x[0], &x[1]),
            }
        };
    }
    vec![
        unary!("inv", |x| !x[0], not),
        unary!("buffer", |x| x[0], copy),
        binary!("and2", |x| x[0] & x[1], and),
        binary!("nand2", |x| !(x[0] & x[1]), nand),
        binary!("or2", |x| x[0] | x[1], or),
        binary!("nor2", |x| !(x[0] | x[1]), nor),
        binary!("xor2", |x| x[0] ^ x[1], xor),
        binary!("xnor2", |x| !(x[0] ^ x[1]), xnor),
        binary!("andyn2", |x| x[0] & !x[1], and_yn),
        binary!("andny2", |x| !x[0] & x[1], and_ny),
        binary!("oryn2", |x| x[0] | !x[1], or_yn),
        binary!("orny2", |x| !x[0] | x[1], or_ny),
        // Pins A, B, S.
        Native::<B> {
            name: "imux2",
            arity: 3,
            truth: |x| if x[2] { x[0] } else { x[1] },
            call: |b, x| b.mux(&x[2], &x[0], &x[1]),
        },
    ]
}

/// True when the cell has a single output whose function equals `truth` on
/// every input row.
fn matches_truth(cell: &CellDef, arity: usize, truth: fn(&[bool]) -> bool) -> bool {
    if cell.inputs.len() != arity || cell.outputs.len() != 1 {
        return false;
    }
    let function = &cell.outputs[0].function;
    (0..1u32 << arity).all(|row| {
        let bits: Vec<bool> = (0..arity).map(|i| row >> i & 1 == 1).collect();
        let env = |pin: &str| cell.inputs.iter().position(|p| p == pin).map(|i| bits[i]);
        function.eval(&env) == Some(truth(&bits))
    })
}

/// Wraps an inner backend and adds cell evaluation from a [`CellLibrary`].
pub struct NetlistBackend<B: GateBackend> {
    inner: B,
    library: CellLibrary,
    table: HashMap<String, CellFn<B>>,
}

impl<B: GateBackend> NetlistBackend<B> {
    pub fn new(inner: B, library: CellLibrary) -> Self {
        let mut table = HashMap::new();
        for native in natives::<B>() {
            if let Ok(cell) = library.cell(native.name) {
                if matches_truth(cell, native.arity, native.truth) {
                    table.insert(native.name.to_string(), native.call);
                }
            }
        }
        debug!(
            library = library.name(),
            cells = library.cells().count(),
            native = table.len(),
            "built cell dispatch table"
        );
        NetlistBackend {
            inner,
            library,
            table,
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn library(&self) -> &CellLibrary {
        &self.library
    }

    /// Whether `cell` dispatches straight to a native backend gate.
    pub fn is_native(&self, cell: &str) -> bool {
        self.table.contains_key(cell)
    }

    fn eval_expr(&self, cell: &CellDef, expr: &Expr, inputs: &[Bit<B>]) -> Result<Bit<B>, BackendError> {
        match expr {
            Expr::Const(value) => self.inner.constant(*value),
            Expr::Pin(name) => {
                let index = cell
                    .inputs
                    .iter()
                    .position(|p| p == name)
                    .ok_or_else(|| BackendError::Expression {
                        cell: cell.name.clone(),
                        message: format!("function references unknown pin {}", name),
                    })?;
                Ok(inputs[index].clone())
            }
            Expr::Not(a) => self.inner.not(&self.eval_expr(cell, a, inputs)?),
            Expr::And(a, b) => {
                let a = self.eval_expr(cell, a, inputs)?;
                self.inner.and(&a, &self.eval_expr(cell, b, inputs)?)
            }
            Expr::Or(a, b) => {
                let a = self.eval_expr(cell, a, inputs)?;
                self.inner.or(&a, &self.eval_expr(cell, b, inputs)?)
            }
            Expr::Xor(a, b) => {
                let a = self.eval_expr(cell, a, inputs)?;
                self.inner.xor(&a, &self.eval_expr(cell, b, inputs)?)
            }
        }
    }
}

impl<B: GateBackend> GateBackend for NetlistBackend<B> {
    type Bit = B::Bit;

    fn and(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.and(a, b)
    }

    fn or(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.or(a, b)
    }

    fn not(&self, a: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.not(a)
    }

    fn constant(&self, value: bool) -> Result<Self::Bit, BackendError> {
        self.inner.constant(value)
    }

    fn xor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.xor(a, b)
    }

    fn mux(&self, control: &Self::Bit, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.mux(control, a, b)
    }

    fn copy(&self, a: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.copy(a)
    }

    fn nand(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.nand(a, b)
    }

    fn nor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.nor(a, b)
    }

    fn xnor(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.xnor(a, b)
    }

    fn and_yn(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.and_yn(a, b)
    }

    fn and_ny(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.and_ny(a, b)
    }

    fn or_yn(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.or_yn(a, b)
    }

    fn or_ny(&self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit, BackendError> {
        self.inner.or_ny(a, b)
    }

    fn cell(&self, cell: &str, pin: &str, inputs: &[Self::Bit]) -> Result<Self::Bit, BackendError> {
        let unsupported = || BackendError::UnsupportedCell {
            cell: cell.to_string(),
            pin: pin.to_string(),
        };
        let def = self.library.cell(cell).map_err(|_| unsupported())?;
        let output = def.output(pin).ok_or_else(unsupported)?;
        if inputs.len() != def.inputs.len() {
            return Err(BackendError::Arity {
                gate: format!("{}.{}", cell, pin),
                expected: def.inputs.len(),
                actual: inputs.len(),
            });
        }
        match self.table.get(cell) {
            Some(call) => call(&self.inner, inputs),
            None => self.eval_expr(def, &output.function, inputs),
        }
    }
}

impl<B: BitCodec> BitCodec for NetlistBackend<B> {
    type SecretKey = B::SecretKey;

    fn encode(&self, value: bool) -> Result<Self::Bit, BackendError> {
        self.inner.encode(value)
    }

    fn encrypt(&self, secret: &B::SecretKey, value: bool) -> Result<Self::Bit, BackendError> {
        self.inner.encrypt(secret, value)
    }

    fn decrypt(&self, secret: &B::SecretKey, bit: &Self::Bit) -> Result<bool, BackendError> {
        self.inner.decrypt(secret, bit)
    }
}
