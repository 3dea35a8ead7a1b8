//! Stored values and the type tags expressions are evaluated under.

use std::fmt;

/// A declared value. Immutable once it lands in the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    /// The literal form spliced into an expression in place of `#name`.
    ///
    /// Text is wrapped in double quotes without escaping, so a stored
    /// string containing `"` no longer forms a valid literal.
    pub fn literal(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Text(s) => format!("\"{s}\""),
        }
    }

    pub fn type_tag(&self) -> ExpectedType {
        match self {
            Value::Integer(_) => ExpectedType::Number,
            Value::Text(_) => ExpectedType::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// The type a declaration keyword demands from its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Number,
    Text,
}
