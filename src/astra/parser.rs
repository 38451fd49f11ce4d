// astra/parser.rs
//! Recursive-descent parser for astra.conf call statements.
//!
//! Only two statement shapes matter: `[local] NAME = FUNC({...})` and
//! `FUNC({...})` (the parentheses may be omitted, `FUNC{...}`). Everything else
//! (control flow, `log.set`, plain assignments) is stepped over one token at a
//! time, so a malformed statement only costs itself.

use super::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Number(String),
    /// Bare or dotted identifier (`true`, `nil`, `decap.output`)
    Ident(String),
    Table(Table),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Decimal or `0x` hex integer literal
    pub fn as_u64(&self) -> Option<u64> {
        let Value::Number(raw) = self else { return None };
        match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => raw.parse().ok(),
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// `None` for positional entries
    pub key: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub fields: Vec<Field>,
}

impl Table {
    /// First field with this key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.key.as_deref() == Some(key))
            .map(|f| &f.value)
    }

    pub fn positional(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().filter(|f| f.key.is_none()).map(|f| &f.value)
    }

    /// True if `key` holds a string equal (ignoring case) to `expected`
    /// anywhere in this table or its nested tables.
    pub fn contains_str_field(&self, key: &str, expected: &str) -> bool {
        self.fields.iter().any(|f| {
            let direct = f.key.as_deref() == Some(key)
                && f.value.as_str().is_some_and(|s| s.eq_ignore_ascii_case(expected));
            direct || f.value.as_table().is_some_and(|t| t.contains_str_field(key, expected))
        })
    }
}

/// A call statement with a table argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub binding: Option<String>,
    pub function: String,
    pub args: Table,
    pub line: usize,
}

pub fn parse_statements(tokens: &[Token]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut idx = 0;
    while idx < tokens.len() {
        match Cursor::new(tokens, idx).statement() {
            Some((stmt, next)) => {
                statements.push(stmt);
                idx = next;
            }
            None => idx += 1,
        }
    }
    statements
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], pos: usize) -> Self {
        Self { tokens, pos }
    }

    fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.line).unwrap_or(0)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&TokenKind::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<String> {
        match self.peek()? {
            TokenKind::Ident(name) => {
                self.pos += 1;
                Some(name.clone())
            }
            _ => None,
        }
    }

    fn statement(mut self) -> Option<(Statement, usize)> {
        let line = self.line();
        if self.peek() == Some(&TokenKind::Ident("local".into())) {
            self.pos += 1;
        }

        let first = self.ident()?;
        let (binding, function) = if self.eat_punct('=') {
            (Some(first), self.ident()?)
        } else {
            (None, first)
        };

        let args = if self.eat_punct('(') {
            let t = self.table()?;
            if !self.eat_punct(')') {
                return None;
            }
            t
        } else {
            self.table()?
        };

        Some((Statement { binding, function, args, line }, self.pos))
    }

    fn table(&mut self) -> Option<Table> {
        if !self.eat_punct('{') {
            return None;
        }
        let mut table = Table::default();
        loop {
            if self.eat_punct('}') {
                return Some(table);
            }
            table.fields.push(self.field()?);
            if !(self.eat_punct(',') || self.eat_punct(';')) {
                return if self.eat_punct('}') { Some(table) } else { None };
            }
        }
    }

    fn field(&mut self) -> Option<Field> {
        // name = value
        if let (Some(TokenKind::Ident(name)), Some(TokenKind::Punct('='))) = (self.peek(), self.peek_at(1)) {
            self.pos += 2;
            return Some(Field { key: Some(name.clone()), value: self.value()? });
        }
        // ["name"] = value
        if let (Some(TokenKind::Punct('[')), Some(TokenKind::Str(name)), Some(TokenKind::Punct(']'))) =
            (self.peek(), self.peek_at(1), self.peek_at(2))
        {
            self.pos += 3;
            if !self.eat_punct('=') {
                return None;
            }
            return Some(Field { key: Some(name.clone()), value: self.value()? });
        }
        Some(Field { key: None, value: self.value()? })
    }

    fn value(&mut self) -> Option<Value> {
        // `"a" .. "b"` string concatenation
        let mut joined = match self.single_value()? {
            Value::Str(s) => s,
            other => return Some(other),
        };
        while self.peek() == Some(&TokenKind::Punct('.')) && self.peek_at(1) == Some(&TokenKind::Punct('.')) {
            self.pos += 2;
            match self.single_value()? {
                Value::Str(s) | Value::Number(s) | Value::Ident(s) => joined.push_str(&s),
                Value::Table(_) => return None,
            }
        }
        Some(Value::Str(joined))
    }

    fn single_value(&mut self) -> Option<Value> {
        match self.peek()? {
            TokenKind::Str(s) => {
                self.pos += 1;
                Some(Value::Str(s.clone()))
            }
            TokenKind::Number(n) => {
                self.pos += 1;
                Some(Value::Number(n.clone()))
            }
            TokenKind::Punct('-') => {
                self.pos += 1;
                match self.peek()? {
                    TokenKind::Number(n) => {
                        self.pos += 1;
                        Some(Value::Number(format!("-{n}")))
                    }
                    _ => None,
                }
            }
            TokenKind::Punct('{') => self.table().map(Value::Table),
            TokenKind::Ident(_) => {
                let mut name = self.ident()?;
                while self.peek() == Some(&TokenKind::Punct('.'))
                    && matches!(self.peek_at(1), Some(TokenKind::Ident(_)))
                {
                    self.pos += 1;
                    name.push('.');
                    name.push_str(&self.ident()?);
                }
                Some(Value::Ident(name))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astra::lexer::tokenize;

    fn parse(src: &str) -> Vec<Statement> {
        parse_statements(&tokenize(src))
    }

    #[test]
    fn test_bound_and_bare_calls() {
        let stmts = parse(
            r#"
            local d = make_t2mi_decap({ name = "A", pid = 0x0FFF })
            make_channel { input = { "t2mi://d" }, output = { "http://x/1" } }
            "#,
        );
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].binding.as_deref(), Some("d"));
        assert_eq!(stmts[0].function, "make_t2mi_decap");
        assert_eq!(stmts[0].args.get("pid").and_then(Value::as_u64), Some(4095));
        assert_eq!(stmts[1].binding, None);
        let input = stmts[1].args.get("input").and_then(Value::as_table).unwrap();
        assert_eq!(input.positional().next().and_then(Value::as_str), Some("t2mi://d"));
    }

    #[test]
    fn test_nested_tables_and_bracket_keys() {
        let stmts = parse(
            r#"c = make_channel({ ["name"] = "x", transform = { { format = "pipe", args = { 1, 2 } } } })"#,
        );
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].args.get("name").and_then(Value::as_str), Some("x"));
        assert!(stmts[0].args.contains_str_field("format", "PIPE"));
    }

    #[test]
    fn test_concat_and_dotted_ident() {
        let stmts = parse(r#"f({ a = "http://" .. "host", b = decap.output, c = true; })"#);
        assert_eq!(stmts[0].args.get("a").and_then(Value::as_str), Some("http://host"));
        assert_eq!(stmts[0].args.get("b"), Some(&Value::Ident("decap.output".into())));
    }

    #[test]
    fn test_malformed_statement_is_skipped() {
        let stmts = parse(
            r#"
            broken = make_t2mi_decap({ name = "A" pid = 1 })
            ok = make_t2mi_decap({ name = "B", pid = 2 })
            "#,
        );
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].binding.as_deref(), Some("ok"));
        assert_eq!(stmts[0].line, 3);
    }
}
