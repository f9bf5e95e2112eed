//! Boolean function expressions attached to cell output pins.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or    := and  (('+' | '|') and)*
//! and   := xor  (('*' | '&' | <juxtaposition>) xor)*
//! xor   := unary ('^' unary)*
//! unary := '!' unary | primary '\''*
//! primary := PIN | '0' | '1' | '(' or ')'
//! ```

use std::fmt;

use crate::error::CoreError;

/// Parsed cell function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Const(bool),
    Pin(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn pin(name: &str) -> Self {
        Expr::Pin(name.to_string())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn and(self, rhs: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(rhs))
    }

    pub fn xor(self, rhs: Expr) -> Self {
        Expr::Xor(Box::new(self), Box::new(rhs))
    }

    /// Parses a function string such as `"(A * S) + (B * (S'))"`.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        parse_function(text).map_err(|message| CoreError::parse("cell function", 1, message))
    }

    /// Pin names referenced by the expression, in first-use order.
    pub fn pins(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_pins(&mut out);
        out
    }

    fn collect_pins<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Const(_) => {}
            Expr::Pin(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Not(inner) => inner.collect_pins(out),
            Expr::And(a, b) | Expr::Or(a, b) | Expr::Xor(a, b) => {
                a.collect_pins(out);
                b.collect_pins(out);
            }
        }
    }

    /// Evaluates over plain booleans. Returns `None` if a pin is unbound.
    pub fn eval(&self, pin: &dyn Fn(&str) -> Option<bool>) -> Option<bool> {
        Some(match self {
            Expr::Const(value) => *value,
            Expr::Pin(name) => pin(name)?,
            Expr::Not(inner) => !inner.eval(pin)?,
            Expr::And(a, b) => a.eval(pin)? & b.eval(pin)?,
            Expr::Or(a, b) => a.eval(pin)? | b.eval(pin)?,
            Expr::Xor(a, b) => a.eval(pin)? ^ b.eval(pin)?,
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{}", u8::from(*value)),
            Expr::Pin(name) => f.write_str(name),
            Expr::Not(inner) => write!(f, "!{}", inner),
            Expr::And(a, b) => write!(f, "({} * {})", a, b),
            Expr::Or(a, b) => write!(f, "({} + {})", a, b),
            Expr::Xor(a, b) => write!(f, "({} ^ {})", a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Const(bool),
    Op(char),
}

fn tokenize(text: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Tok::Ident(ident));
        } else if c == '0' || c == '1' {
            tokens.push(Tok::Const(c == '1'));
            chars.next();
        } else if "!'*&+|^()".contains(c) {
            tokens.push(Tok::Op(c));
            chars.next();
        } else {
            return Err(format!("unexpected character '{}' in function", c));
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

fn parse_function(text: &str) -> Result<Expr, String> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
    };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(format!("trailing {:?} in function '{}'", tok, text)),
    }
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, op: char) -> bool {
        if self.peek() == Some(&Tok::Op(op)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Ident(_)) | Some(Tok::Const(_)) | Some(Tok::Op('(')) | Some(Tok::Op('!'))
        )
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and()?;
        while self.eat('+') || self.eat('|') {
            lhs = lhs.or(self.and()?);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.xor()?;
        loop {
            if self.eat('*') || self.eat('&') || self.starts_operand() {
                lhs = lhs.and(self.xor()?);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn xor(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        while self.eat('^') {
            lhs = lhs.xor(self.unary()?);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat('!') {
            return Ok(self.unary()?.not());
        }
        let mut expr = self.primary()?;
        while self.eat('\'') {
            expr = expr.not();
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let tok = self.peek().cloned();
        self.pos += 1;
        match tok {
            Some(Tok::Ident(name)) => Ok(Expr::Pin(name)),
            Some(Tok::Const(value)) => Ok(Expr::Const(value)),
            Some(Tok::Op('(')) => {
                let inner = self.or()?;
                if self.eat(')') {
                    Ok(inner)
                } else {
                    Err("missing ')' in function".to_string())
                }
            }
            Some(other) => Err(format!("unexpected {:?} in function", other)),
            None => Err("function ends early".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth(expr: &Expr, pins: &[&str]) -> Vec<bool> {
        (0..1u32 << pins.len())
            .map(|row| {
                let lookup = |name: &str| {
                    pins.iter()
                        .position(|p| *p == name)
                        .map(|i| row >> i & 1 == 1)
                };
                expr.eval(&lookup).unwrap()
            })
            .collect()
    }

    #[test]
    fn postfix_and_prefix_negation_agree() {
        let a = Expr::parse("(A * B)'").unwrap();
        let b = Expr::parse("!(A & B)").unwrap();
        assert_eq!(truth(&a, &["A", "B"]), truth(&b, &["A", "B"]));
        assert_eq!(truth(&a, &["A", "B"]), vec![true, true, true, false]);
    }

    #[test]
    fn mux_function_selects_a_on_s() {
        let mux = Expr::parse("(A * S) + (B * (S'))").unwrap();
        assert_eq!(mux.pins(), vec!["A", "S", "B"]);
        // rows enumerate A (bit 0), B (bit 1), S (bit 2)
        assert_eq!(
            truth(&mux, &["A", "B", "S"]),
            vec![false, false, true, true, false, true, false, true]
        );
    }

    #[test]
    fn juxtaposition_is_and() {
        let lut = Expr::parse("(C' B A P3) | (C B' A' P4)").unwrap();
        assert_eq!(lut.pins(), vec!["C", "B", "A", "P3", "P4"]);
        let env = |name: &str| Some(matches!(name, "B" | "A" | "P3"));
        assert_eq!(lut.eval(&env), Some(true));
    }

    #[test]
    fn xor_binds_tighter_than_and_and_or() {
        // A + B ^ C * D  ==  A + ((B ^ C) * D)
        let expr = Expr::parse("A + B ^ C * D").unwrap();
        assert_eq!(expr.to_string(), "(A + ((B ^ C) * D))");
    }

    #[test]
    fn constants_and_errors() {
        assert_eq!(Expr::parse("1").unwrap(), Expr::Const(true));
        assert!(Expr::parse("(A * B").is_err());
        assert!(Expr::parse("A $ B").is_err());
        assert!(Expr::parse("").is_err());
        assert!(Expr::parse("A )").is_err());
    }
}
