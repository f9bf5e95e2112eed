//! Generic Liberty group/attribute reader.
//!
//! Produces a tree of [`Group`]s without interpreting attribute names; the
//! caller in `liberty/mod.rs` picks out the cells, pins and functions it
//! needs and ignores everything else (timing tables, units, and so on).

use crate::error::CoreError;

const CONTEXT: &str = "cell library";

/// `kind(args) { attrs... groups... }`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Group {
    pub kind: String,
    pub args: Vec<String>,
    pub line: usize,
    pub attrs: Vec<Attr>,
    pub groups: Vec<Group>,
}

impl Group {
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    pub fn groups_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Group> + 'a {
        self.groups.iter().filter(move |g| g.kind == kind)
    }
}

/// Simple (`name : value;`) or complex (`name(a, b);`) attribute.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Attr {
    pub name: String,
    pub values: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Str(String),
    Punct(char),
}

fn tokenize(text: &str) -> Result<Vec<(Tok, usize)>, CoreError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            // line continuation
            '\\' => {}
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let start = line;
                let mut prev = ' ';
                loop {
                    match chars.next() {
                        Some('/') if prev == '*' => break,
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            prev = c;
                        }
                        None => return Err(CoreError::parse(CONTEXT, start, "unterminated comment")),
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '"' => {
                let start = line;
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => {
                            if chars.peek() == Some(&'\n') {
                                chars.next();
                                line += 1;
                            }
                        }
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            value.push(c);
                        }
                        None => return Err(CoreError::parse(CONTEXT, start, "unterminated string")),
                    }
                }
                tokens.push((Tok::Str(value), start));
            }
            '(' | ')' | '{' | '}' | ':' | ';' | ',' => tokens.push((Tok::Punct(c), line)),
            c => {
                let mut word = String::from(c);
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || "(){}:;,\"".contains(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push((Tok::Word(word), line));
            }
        }
    }
    Ok(tokens)
}

struct Reader {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
}

/// Parses the single top-level group of a Liberty file.
pub(crate) fn parse_groups(text: &str) -> Result<Group, CoreError> {
    let mut reader = Reader {
        tokens: tokenize(text)?,
        pos: 0,
    };
    let (name, line) = reader.word()?;
    reader.expect('(')?;
    let args = reader.args()?;
    let group = reader.group_body(name, args, line)?;
    if let Some((tok, line)) = reader.tokens.get(reader.pos) {
        return Err(CoreError::parse(
            CONTEXT,
            *line,
            format!("unexpected {:?} after top-level group", tok),
        ));
    }
    Ok(group)
}

impl Reader {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |(_, line)| *line)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        tok
    }

    fn peek_punct(&self, c: char) -> bool {
        matches!(self.tokens.get(self.pos), Some((Tok::Punct(p), _)) if *p == c)
    }

    fn expect(&mut self, c: char) -> Result<(), CoreError> {
        let line = self.line();
        match self.next() {
            Some(Tok::Punct(p)) if p == c => Ok(()),
            other => Err(CoreError::parse(
                CONTEXT,
                line,
                format!("expected '{}', found {:?}", c, other),
            )),
        }
    }

    fn word(&mut self) -> Result<(String, usize), CoreError> {
        let line = self.line();
        match self.next() {
            Some(Tok::Word(w)) => Ok((w, line)),
            other => Err(CoreError::parse(
                CONTEXT,
                line,
                format!("expected a name, found {:?}", other),
            )),
        }
    }

    /// Comma-separated values up to and including `)`.
    fn args(&mut self) -> Result<Vec<String>, CoreError> {
        let mut args = Vec::new();
        loop {
            let line = self.line();
            match self.next() {
                Some(Tok::Punct(')')) => return Ok(args),
                Some(Tok::Punct(',')) => {}
                Some(Tok::Word(w)) | Some(Tok::Str(w)) => args.push(w),
                other => {
                    return Err(CoreError::parse(
                        CONTEXT,
                        line,
                        format!("unexpected {:?} in argument list", other),
                    ))
                }
            }
        }
    }

    /// Statements after `kind(args)` up to and including the closing `}`.
    fn group_body(
        &mut self,
        kind: String,
        args: Vec<String>,
        line: usize,
    ) -> Result<Group, CoreError> {
        self.expect('{')?;
        let mut group = Group {
            kind,
            args,
            line,
            attrs: Vec::new(),
            groups: Vec::new(),
        };
        loop {
            if self.peek_punct('}') {
                self.pos += 1;
                return Ok(group);
            }
            if self.peek_punct(';') {
                self.pos += 1;
                continue;
            }
            let (name, line) = self.word()?;
            let stmt_line = self.line();
            match self.next() {
                Some(Tok::Punct(':')) => {
                    let value = match self.next() {
                        Some(Tok::Word(v)) | Some(Tok::Str(v)) => v,
                        other => {
                            return Err(CoreError::parse(
                                CONTEXT,
                                line,
                                format!("attribute '{}' has no value (found {:?})", name, other),
                            ))
                        }
                    };
                    if self.peek_punct(';') {
                        self.pos += 1;
                    }
                    group.attrs.push(Attr {
                        name,
                        values: vec![value],
                        line,
                    });
                }
                Some(Tok::Punct('(')) => {
                    let args = self.args()?;
                    if self.peek_punct('{') {
                        group.groups.push(self.group_body(name, args, line)?);
                    } else {
                        if self.peek_punct(';') {
                            self.pos += 1;
                        }
                        group.attrs.push(Attr {
                            name,
                            values: args,
                            line,
                        });
                    }
                }
                other => {
                    return Err(CoreError::parse(
                        CONTEXT,
                        stmt_line,
                        format!("unexpected {:?} after '{}'", other, name),
                    ))
                }
            }
        }
    }
}
