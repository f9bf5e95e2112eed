//! Cell libraries: named combinational cells with ordered input pins and
//! boolean output functions.
//!
//! [`CellLibrary::parse`] reads the Liberty subset emitted for bootstrapped
//! gate sets; [`CellLibrary::builtin`] provides the default gate set without
//! any file.

mod function;
mod parser;

pub use function::Expr;

use indexmap::IndexMap;

use crate::error::CoreError;

/// An output pin and the function that drives it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPin {
    pub name: String,
    pub function: Expr,
}

/// One combinational cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDef {
    pub name: String,
    /// Input pins in declaration order. Gate operands follow this order.
    pub inputs: Vec<String>,
    pub outputs: Vec<OutputPin>,
}

impl CellDef {
    pub fn is_input(&self, pin: &str) -> bool {
        self.inputs.iter().any(|p| p == pin)
    }

    pub fn is_output(&self, pin: &str) -> bool {
        self.output(pin).is_some()
    }

    pub fn output(&self, pin: &str) -> Option<&OutputPin> {
        self.outputs.iter().find(|p| p.name == pin)
    }
}

/// Cells by name, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CellLibrary {
    name: String,
    cells: IndexMap<String, CellDef>,
}

impl CellLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        CellLibrary {
            name: name.into(),
            cells: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, cell: CellDef) {
        self.cells.insert(cell.name.clone(), cell);
    }

    pub fn cell(&self, name: &str) -> Result<&CellDef, CoreError> {
        self.cells.get(name).ok_or_else(|| CoreError::CellNotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellDef> {
        self.cells.values()
    }

    /// Parses `library(name) { cell(...) { pin(...) { ... } } }`.
    ///
    /// Cells holding `ff` or `latch` groups are sequential and skipped.
    /// Every output pin needs a `function`, and functions may only read the
    /// cell's input pins.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let top = parser::parse_groups(text)?;
        if top.kind != "library" {
            return Err(CoreError::parse(
                "cell library",
                top.line,
                format!("expected a library group, found '{}'", top.kind),
            ));
        }
        let mut library = CellLibrary::new(top.args.first().cloned().unwrap_or_default());

        for group in top.groups_of("cell") {
            if group.groups_of("ff").next().is_some() || group.groups_of("latch").next().is_some() {
                continue;
            }
            let name = group.args.first().cloned().ok_or_else(|| {
                CoreError::parse("cell library", group.line, "cell without a name")
            })?;
            let mut cell = CellDef {
                name,
                inputs: Vec::new(),
                outputs: Vec::new(),
            };
            let mut pending = Vec::new();
            for pin in group.groups_of("pin") {
                let direction = pin
                    .attr("direction")
                    .and_then(|a| a.values.first())
                    .map(String::as_str);
                for pin_name in &pin.args {
                    match direction {
                        Some("input") => cell.inputs.push(pin_name.clone()),
                        Some("output") => {
                            let attr = pin.attr("function").ok_or_else(|| {
                                CoreError::parse(
                                    "cell library",
                                    pin.line,
                                    format!(
                                        "output pin {} of cell {} has no function",
                                        pin_name, cell.name
                                    ),
                                )
                            })?;
                            let text = attr.values.first().map(String::as_str).unwrap_or("");
                            let function = Expr::parse(text).map_err(|e| match e {
                                CoreError::Parse { message, .. } => {
                                    CoreError::parse("cell library", attr.line, message)
                                }
                                other => other,
                            })?;
                            pending.push((pin.line, OutputPin {
                                name: pin_name.clone(),
                                function,
                            }));
                        }
                        other => {
                            return Err(CoreError::parse(
                                "cell library",
                                pin.line,
                                format!(
                                    "pin {} of cell {} has unsupported direction {:?}",
                                    pin_name, cell.name, other
                                ),
                            ))
                        }
                    }
                }
            }
            // Functions may reference input pins declared after the output.
            for (line, output) in pending {
                if let Some(unknown) = output.function.pins().into_iter().find(|p| !cell.is_input(p)) {
                    return Err(CoreError::parse(
                        "cell library",
                        line,
                        format!(
                            "function of {}.{} reads unknown pin {}",
                            cell.name, output.name, unknown
                        ),
                    ));
                }
                cell.outputs.push(output);
            }
            library.insert(cell);
        }
        Ok(library)
    }

    /// The default bootstrapped gate set.
    ///
    /// `andyn2 = A & !B`, `andny2 = !A & B`, `oryn2 = A | !B`,
    /// `orny2 = !A | B`; `imux2` has pins `A`, `B`, `S` with `Y = S ? A : B`.
    pub fn builtin() -> Self {
        let a = || Expr::pin("A");
        let b = || Expr::pin("B");
        let mut library = CellLibrary::new("default");
        library.insert(cell("inv", &["A"], a().not()));
        library.insert(cell("buffer", &["A"], a()));
        library.insert(cell("and2", &["A", "B"], a().and(b())));
        library.insert(cell("nand2", &["A", "B"], a().and(b()).not()));
        library.insert(cell("or2", &["A", "B"], a().or(b())));
        library.insert(cell("nor2", &["A", "B"], a().or(b()).not()));
        library.insert(cell("xor2", &["A", "B"], a().xor(b())));
        library.insert(cell("xnor2", &["A", "B"], a().xor(b()).not()));
        library.insert(cell("andyn2", &["A", "B"], a().and(b().not())));
        library.insert(cell("andny2", &["A", "B"], a().not().and(b())));
        library.insert(cell("oryn2", &["A", "B"], a().or(b().not())));
        library.insert(cell("orny2", &["A", "B"], a().not().or(b())));
        let s = || Expr::pin("S");
        library.insert(cell(
            "imux2",
            &["A", "B", "S"],
            a().and(s()).or(b().and(s().not())),
        ));
        library
    }
}

fn cell(name: &str, inputs: &[&str], function: Expr) -> CellDef {
    CellDef {
        name: name.to_string(),
        inputs: inputs.iter().map(|p| p.to_string()).collect(),
        outputs: vec![OutputPin {
            name: "Y".to_string(),
            function,
        }],
    }
}
