//! Recursive-descent parser and elaborator for one gate-level module.
//!
//! Parsing collects declarations, cell instances and assignments with their
//! raw expressions; elaboration then expands every expression into single
//! bits once all declarations are known, so statement order does not matter.

use indexmap::{IndexMap, IndexSet};

use super::lexer::{tokenize, Spanned, Token, CONTEXT};
use super::{CellInstance, Module, Net};
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Default)]
struct Decl {
    direction: Option<Direction>,
    /// Inclusive `(low, high)` index range of a bus.
    range: Option<(i64, i64)>,
}

#[derive(Debug, Clone)]
enum Expr {
    Ident(String),
    Bit(String, i64),
    Part(String, i64, i64),
    /// LSB first.
    Const(Vec<bool>),
    /// MSB first, as written.
    Concat(Vec<Expr>),
}

struct RawCell {
    cell: String,
    name: String,
    line: usize,
    pins: Vec<(String, Option<Expr>)>,
}

struct RawAssign {
    lhs: Expr,
    rhs: Expr,
    line: usize,
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

pub(super) fn parse_module(text: &str) -> Result<Module, CoreError> {
    let mut p = Parser {
        tokens: tokenize(text)?,
        pos: 0,
    };

    p.keyword("module")?;
    let name = p.ident()?;
    let mut ports = Vec::new();
    if p.eat('(') {
        if !p.eat(')') {
            loop {
                ports.push(p.ident()?);
                if p.eat(')') {
                    break;
                }
                p.expect(',')?;
            }
        }
    }
    p.expect(';')?;

    let mut decls: IndexMap<String, Decl> = IndexMap::new();
    let mut port_decls = Vec::new();
    let mut cells = Vec::new();
    let mut assigns = Vec::new();

    loop {
        let line = p.line();
        let word = p.ident()?;
        match word.as_str() {
            "endmodule" => break,
            "input" | "output" | "wire" | "reg" => {
                let direction = match word.as_str() {
                    "input" => Some(Direction::Input),
                    "output" => Some(Direction::Output),
                    _ => None,
                };
                p.declaration(direction, line, &mut decls, &mut port_decls)?;
            }
            "inout" => {
                return Err(CoreError::parse(CONTEXT, line, "inout ports are not supported"))
            }
            "assign" => loop {
                let line = p.line();
                let lhs = p.expr()?;
                p.expect('=')?;
                let rhs = p.expr()?;
                assigns.push(RawAssign { lhs, rhs, line });
                if p.eat(';') {
                    break;
                }
                p.expect(',')?;
            },
            _ => cells.push(p.instance(word, line)?),
        }
    }

    if let Some(extra) = p.tokens.get(p.pos) {
        let message = if extra.token == Token::Ident("module".into()) {
            "only one module per netlist is supported".to_string()
        } else {
            format!("unexpected {:?} after endmodule", extra.token)
        };
        return Err(CoreError::parse(CONTEXT, extra.line, message));
    }

    elaborate(name, ports, port_decls, decls, cells, assigns)
}

impl Parser {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    fn error(&self, message: impl Into<String>) -> CoreError {
        CoreError::parse(CONTEXT, self.line(), message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), CoreError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {:?}", c, self.peek())))
        }
    }

    fn ident(&mut self) -> Result<String, CoreError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            other => Err(self.error(format!("expected an identifier, found {:?}", other))),
        }
    }

    fn keyword(&mut self, word: &str) -> Result<(), CoreError> {
        match self.ident()? {
            w if w == word => Ok(()),
            w => Err(self.error(format!("expected '{}', found '{}'", word, w))),
        }
    }

    fn integer(&mut self) -> Result<i64, CoreError> {
        match self.peek() {
            Some(Token::Number(text)) => {
                let value = text
                    .replace('_', "")
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("expected an index, found '{}'", text)))?;
                self.pos += 1;
                Ok(value)
            }
            other => Err(self.error(format!("expected an index, found {:?}", other))),
        }
    }

    /// `[h:l] a, b, c;` after the declaration keyword.
    fn declaration(
        &mut self,
        direction: Option<Direction>,
        line: usize,
        decls: &mut IndexMap<String, Decl>,
        port_decls: &mut Vec<String>,
    ) -> Result<(), CoreError> {
        let range = if self.eat('[') {
            let h = self.integer()?;
            self.expect(':')?;
            let l = self.integer()?;
            self.expect(']')?;
            Some((h.min(l), h.max(l)))
        } else {
            None
        };
        loop {
            let name = self.ident()?;
            let decl = decls.entry(name.clone()).or_insert_with(|| Decl {
                direction: None,
                range,
            });
            if decl.range != range {
                return Err(CoreError::parse(
                    CONTEXT,
                    line,
                    format!("net {} redeclared with a different width", name),
                ));
            }
            if direction.is_some() {
                if decl.direction.is_some() && decl.direction != direction {
                    return Err(CoreError::parse(
                        CONTEXT,
                        line,
                        format!("port {} declared with two directions", name),
                    ));
                }
                if decl.direction.is_none() {
                    port_decls.push(name.clone());
                }
                decl.direction = direction;
            }
            if self.eat(';') {
                return Ok(());
            }
            self.expect(',')?;
        }
    }

    /// `CELL [#(...)] NAME ( .PIN(expr), ... );` after the cell type.
    fn instance(&mut self, cell: String, line: usize) -> Result<RawCell, CoreError> {
        if self.eat('#') {
            self.expect('(')?;
            let mut depth = 1;
            while depth > 0 {
                match self.peek() {
                    Some(Token::Punct('(')) => depth += 1,
                    Some(Token::Punct(')')) => depth -= 1,
                    None => return Err(self.error("unterminated parameter list")),
                    _ => {}
                }
                self.pos += 1;
            }
        }
        let name = self.ident()?;
        self.expect('(')?;
        let mut pins = Vec::new();
        if !self.eat(')') {
            loop {
                if !self.eat('.') {
                    return Err(self.error(format!(
                        "cell {} uses positional connections; only .PIN(net) is supported",
                        name
                    )));
                }
                let pin = self.ident()?;
                self.expect('(')?;
                let expr = if self.eat(')') {
                    None
                } else {
                    let e = self.expr()?;
                    self.expect(')')?;
                    Some(e)
                };
                pins.push((pin, expr));
                if self.eat(')') {
                    break;
                }
                self.expect(',')?;
            }
        }
        self.expect(';')?;
        Ok(RawCell {
            cell,
            name,
            line,
            pins,
        })
    }

    fn expr(&mut self) -> Result<Expr, CoreError> {
        if self.eat('{') {
            let mut parts = Vec::new();
            loop {
                parts.push(self.expr()?);
                if self.eat('}') {
                    return Ok(Expr::Concat(parts));
                }
                self.expect(',')?;
            }
        }
        if let Some(Token::Number(text)) = self.peek() {
            let bits = constant_bits(text).map_err(|m| self.error(m))?;
            self.pos += 1;
            return Ok(Expr::Const(bits));
        }
        let name = self.ident()?;
        if !self.eat('[') {
            return Ok(Expr::Ident(name));
        }
        let h = self.integer()?;
        if self.eat(':') {
            let l = self.integer()?;
            self.expect(']')?;
            Ok(Expr::Part(name, h, l))
        } else {
            self.expect(']')?;
            Ok(Expr::Bit(name, h))
        }
    }
}

/// Expands a Verilog number into bits, LSB first.
fn constant_bits(text: &str) -> Result<Vec<bool>, String> {
    let clean = text.replace('_', "");
    let Some((size, rest)) = clean.split_once('\'') else {
        let value: u64 = clean
            .parse()
            .map_err(|_| format!("invalid number '{}'", text))?;
        return Ok((0..32).map(|i| value >> i & 1 == 1).collect());
    };
    let width: usize = if size.is_empty() {
        32
    } else {
        size.parse().map_err(|_| format!("invalid width in '{}'", text))?
    };
    let rest = rest.trim_start_matches(['s', 'S']);
    let mut chars = rest.chars();
    let base = chars.next().map(|c| c.to_ascii_lowercase());
    let digits: String = chars.collect();
    let bits_per_digit = match base {
        Some('b') => 1,
        Some('o') => 3,
        Some('h') => 4,
        Some('d') => {
            let value: u128 = digits
                .parse()
                .map_err(|_| format!("invalid decimal constant '{}'", text))?;
            return Ok((0..width).map(|i| i < 128 && value >> i & 1 == 1).collect());
        }
        _ => return Err(format!("invalid base in '{}'", text)),
    };
    let mut bits = Vec::with_capacity(digits.len() * bits_per_digit);
    for c in digits.chars().rev() {
        let value = c
            .to_digit(1 << bits_per_digit)
            .ok_or_else(|| format!("invalid digit '{}' in '{}'", c, text))?;
        for i in 0..bits_per_digit {
            bits.push(value >> i & 1 == 1);
        }
    }
    bits.resize(width, false);
    Ok(bits)
}

fn bit_name(name: &str, index: i64) -> String {
    format!("{}[{}]", name, index)
}

/// Expands an expression into single-bit nets, LSB first.
fn expand(
    expr: &Expr,
    decls: &IndexMap<String, Decl>,
    line: usize,
) -> Result<Vec<Net>, CoreError> {
    let decl = |name: &str| {
        decls.get(name).ok_or_else(|| {
            CoreError::parse(CONTEXT, line, format!("undeclared net {}", name))
        })
    };
    let in_range = |name: &str, index: i64, range: Option<(i64, i64)>| match range {
        Some((lo, hi)) if (lo..=hi).contains(&index) => Ok(()),
        _ => Err(CoreError::parse(
            CONTEXT,
            line,
            format!("index {} out of range for {}", index, name),
        )),
    };
    Ok(match expr {
        Expr::Ident(name) => match decl(name)?.range {
            Some((lo, hi)) => (lo..=hi).map(|i| Net::Wire(bit_name(name, i))).collect(),
            None => vec![Net::Wire(name.clone())],
        },
        Expr::Bit(name, index) => {
            in_range(name, *index, decl(name)?.range)?;
            vec![Net::Wire(bit_name(name, *index))]
        }
        Expr::Part(name, h, l) => {
            let range = decl(name)?.range;
            in_range(name, *h, range)?;
            in_range(name, *l, range)?;
            (*h.min(l)..=*h.max(l))
                .map(|i| Net::Wire(bit_name(name, i)))
                .collect()
        }
        Expr::Const(bits) => bits.iter().map(|b| Net::Constant(*b)).collect(),
        Expr::Concat(parts) => {
            let mut bits = Vec::new();
            for part in parts.iter().rev() {
                bits.extend(expand(part, decls, line)?);
            }
            bits
        }
    })
}

fn bits_of(name: &str, decl: &Decl) -> Vec<String> {
    match decl.range {
        Some((lo, hi)) => (lo..=hi).map(|i| bit_name(name, i)).collect(),
        None => vec![name.to_string()],
    }
}

fn elaborate(
    name: String,
    ports: Vec<String>,
    port_decls: Vec<String>,
    decls: IndexMap<String, Decl>,
    raw_cells: Vec<RawCell>,
    raw_assigns: Vec<RawAssign>,
) -> Result<Module, CoreError> {
    let mut outputs = IndexSet::new();
    for port in &ports {
        let decl = decls.get(port).ok_or_else(|| {
            CoreError::parse(CONTEXT, 1, format!("port {} is never declared", port))
        })?;
        match decl.direction {
            Some(Direction::Input) => {}
            Some(Direction::Output) => outputs.extend(bits_of(port, decl)),
            None => {
                return Err(CoreError::parse(
                    CONTEXT,
                    1,
                    format!("port {} has no direction", port),
                ))
            }
        }
    }
    // Inputs follow their `input` statements, not the port list.
    let mut inputs = IndexSet::new();
    for port in &port_decls {
        if let Some(decl) = decls.get(port) {
            if decl.direction == Some(Direction::Input) {
                inputs.extend(bits_of(port, decl));
            }
        }
    }
    if let Some((undeclared, _)) = decls
        .iter()
        .find(|(n, d)| d.direction.is_some() && !ports.contains(*n))
    {
        return Err(CoreError::parse(
            CONTEXT,
            1,
            format!("{} is declared as a port but missing from the port list", undeclared),
        ));
    }

    let mut cells = Vec::with_capacity(raw_cells.len());
    for raw in raw_cells {
        let mut connections = Vec::with_capacity(raw.pins.len());
        for (pin, expr) in raw.pins {
            let Some(expr) = expr else { continue };
            let mut bits = expand(&expr, &decls, raw.line)?;
            if bits.len() != 1 {
                return Err(CoreError::parse(
                    CONTEXT,
                    raw.line,
                    format!("pin {}.{} is connected to {} bits", raw.name, pin, bits.len()),
                ));
            }
            connections.push((pin, bits.remove(0)));
        }
        cells.push(CellInstance {
            cell: raw.cell,
            name: raw.name,
            line: raw.line,
            connections,
        });
    }

    let mut assigns = IndexMap::new();
    for raw in raw_assigns {
        let lhs = expand(&raw.lhs, &decls, raw.line)?;
        let rhs = expand(&raw.rhs, &decls, raw.line)?;
        for (i, target) in lhs.into_iter().enumerate() {
            let Net::Wire(target) = target else {
                return Err(CoreError::parse(CONTEXT, raw.line, "cannot assign to a constant"));
            };
            let source = rhs.get(i).cloned().unwrap_or(Net::Constant(false));
            if assigns.insert(target.clone(), source).is_some() {
                return Err(CoreError::parse(
                    CONTEXT,
                    raw.line,
                    format!("net {} is assigned twice", target),
                ));
            }
        }
    }

    Ok(Module {
        name,
        inputs,
        outputs,
        cells,
        assigns,
    })
}
