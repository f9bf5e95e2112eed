//! Tokenizer for gate-level Verilog.

use crate::error::CoreError;

pub(super) const CONTEXT: &str = "netlist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    /// Simple or escaped identifier (escape backslash removed).
    Ident(String),
    /// Sized (`4'hA`) or unsized (`12`) number, verbatim.
    Number(String),
    Punct(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub(super) fn tokenize(text: &str) -> Result<Vec<Spanned>, CoreError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    let skip_until = |i: &mut usize, line: &mut usize, end: [char; 2], what: &str| {
        let start = *line;
        while *i + 1 < chars.len() {
            if chars[*i] == end[0] && chars[*i + 1] == end[1] {
                *i += 2;
                return Ok(());
            }
            if chars[*i] == '\n' {
                *line += 1;
            }
            *i += 1;
        }
        Err(CoreError::parse(CONTEXT, start, format!("unterminated {}", what)))
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if next == Some('*') => {
                i += 2;
                skip_until(&mut i, &mut line, ['*', '/'], "comment")?;
            }
            '(' if next == Some('*') && chars.get(i + 2) != Some(&')') => {
                i += 2;
                skip_until(&mut i, &mut line, ['*', ')'], "attribute")?;
            }
            '\\' => {
                let start = i + 1;
                i = start;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                if i == start {
                    return Err(CoreError::parse(CONTEXT, line, "empty escaped identifier"));
                }
                tokens.push(Spanned {
                    token: Token::Ident(chars[start..i].iter().collect()),
                    line,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                tokens.push(Spanned {
                    token: Token::Ident(chars[start..i].iter().collect()),
                    line,
                });
            }
            c if c.is_ascii_digit() || c == '\'' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '\'' {
                    i += 1;
                    if i < chars.len() && matches!(chars[i], 's' | 'S') {
                        i += 1;
                    }
                    if i < chars.len() && "bBoOdDhH".contains(chars[i]) {
                        i += 1;
                    } else {
                        return Err(CoreError::parse(CONTEXT, line, "missing base in constant"));
                    }
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                }
                tokens.push(Spanned {
                    token: Token::Number(chars[start..i].iter().collect()),
                    line,
                });
            }
            '(' | ')' | '[' | ']' | '{' | '}' | ';' | ',' | '.' | ':' | '=' | '#' => {
                tokens.push(Spanned {
                    token: Token::Punct(c),
                    line,
                });
                i += 1;
            }
            other => {
                return Err(CoreError::parse(
                    CONTEXT,
                    line,
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }
    Ok(tokens)
}
