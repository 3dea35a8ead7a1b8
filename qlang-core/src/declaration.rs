//! Per-keyword declaration handling.
//!
//! Handlers validate the name and assignment token, then drive the
//! resolver and evaluator. They only read the symbol table.

use std::str::FromStr;

use tracing::debug;

use crate::error::{CoreError, ErrorKind};
use crate::evaluator::{Evaluated, evaluate};
use crate::resolver::{is_word_char, resolve};
use crate::symbols::SymbolTable;
use crate::value::{ExpectedType, Value};

const ASSIGN: &str = "=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Int,
    Var,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Int => "int",
            Keyword::Var => "var",
        }
    }
}

impl FromStr for Keyword {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Keyword::Int),
            "var" => Ok(Keyword::Var),
            other => Err(ErrorKind::UnknownKeyword(other.to_string())),
        }
    }
}

/// One tokenized source line: `<keyword> <name> <operator> <value>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration<'src> {
    pub keyword: Keyword,
    pub name: &'src str,
    pub operator_token: &'src str,
    pub raw_value: &'src str,
    pub line: usize,
}

impl Declaration<'_> {
    /// Runs the handler for this declaration's keyword.
    pub fn evaluate(&self, symbols: &SymbolTable) -> Result<Value, CoreError> {
        debug!(line = self.line, keyword = self.keyword.as_str(), name = self.name, "handling declaration");
        match self.keyword {
            Keyword::Int => handle_integer(self, symbols),
            Keyword::Var => handle_var(self, symbols),
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if !is_identifier(self.name) {
            return Err(ErrorKind::InvalidName(self.name.to_string()).at(self.line));
        }
        if self.operator_token != ASSIGN {
            return Err(ErrorKind::ExpectedAssign.at(self.line));
        }
        Ok(())
    }
}

fn handle_integer(decl: &Declaration<'_>, symbols: &SymbolTable) -> Result<Value, CoreError> {
    decl.validate()?;
    let resolved = resolve(decl.raw_value, symbols, decl.line)?;
    let result = evaluate(&resolved, ExpectedType::Number, decl.line)?;
    match result {
        Evaluated::Int(n) => Ok(Value::Integer(n)),
        Evaluated::Float(x) => truncate(x)
            .map(Value::Integer)
            .ok_or_else(|| ErrorKind::Overflow.at(decl.line)),
        Evaluated::Text(_) => Err(ErrorKind::TypeMismatch(ExpectedType::Number).at(decl.line)),
    }
}

fn handle_var(decl: &Declaration<'_>, symbols: &SymbolTable) -> Result<Value, CoreError> {
    decl.validate()?;
    if let Some(inner) = quoted(decl.raw_value) {
        return Ok(Value::Text(inner.to_string()));
    }
    let resolved = resolve(decl.raw_value, symbols, decl.line)?;
    match evaluate(&resolved, ExpectedType::Text, decl.line)? {
        Evaluated::Text(s) => Ok(Value::Text(s)),
        _ => Err(ErrorKind::TypeMismatch(ExpectedType::Text).at(decl.line)),
    }
}

/// Strips one leading and one trailing double quote, if both are present.
///
/// A lone `"` counts as both ends and yields the empty string.
fn quoted(raw: &str) -> Option<&str> {
    if raw.starts_with('"') && raw.ends_with('"') {
        Some(raw.get(1..raw.len().saturating_sub(1)).unwrap_or(""))
    } else {
        None
    }
}

/// Truncates toward zero. `None` for NaN, infinities and out-of-range values.
pub fn truncate(x: f64) -> Option<i64> {
    let t = x.trunc();
    // 2^63 is exactly representable; i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if t.is_finite() && t >= -LIMIT && t < LIMIT {
        Some(t as i64)
    } else {
        None
    }
}

/// Letter or underscore first, then letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => chars.all(is_word_char),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl<'a>(keyword: Keyword, name: &'a str, raw_value: &'a str) -> Declaration<'a> {
        Declaration {
            keyword,
            name,
            operator_token: "=",
            raw_value,
            line: 1,
        }
    }

    fn symbols(entries: &[(&str, Value)]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, value) in entries {
            table.insert(name.to_string(), value.clone()).unwrap();
        }
        table
    }

    #[test]
    fn parses_keywords() {
        assert_eq!("int".parse::<Keyword>(), Ok(Keyword::Int));
        assert_eq!("var".parse::<Keyword>(), Ok(Keyword::Var));
        assert_eq!(
            "float".parse::<Keyword>(),
            Err(ErrorKind::UnknownKeyword("float".into()))
        );
        assert!("INT".parse::<Keyword>().is_err());
    }

    #[test]
    fn integer_truncates_toward_zero() {
        let table = SymbolTable::new();
        assert_eq!(decl(Keyword::Int, "a", "7/2").evaluate(&table), Ok(Value::Integer(3)));
        assert_eq!(decl(Keyword::Int, "a", "-7/2").evaluate(&table), Ok(Value::Integer(-3)));
        assert_eq!(decl(Keyword::Int, "a", "2 ** -1").evaluate(&table), Ok(Value::Integer(0)));
    }

    #[test]
    fn integer_rejects_text_result() {
        let table = SymbolTable::new();
        let err = decl(Keyword::Int, "a", "\"5\"").evaluate(&table).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch(ExpectedType::Number));
    }

    #[test]
    fn integer_uses_references() {
        let table = symbols(&[("a", Value::Integer(5))]);
        assert_eq!(
            decl(Keyword::Int, "b", "#a + 2").evaluate(&table),
            Ok(Value::Integer(7))
        );
    }

    #[test]
    fn quoted_var_is_stored_verbatim() {
        let table = symbols(&[("x", Value::Integer(1))]);
        assert_eq!(
            decl(Keyword::Var, "s", "\"1+1\"").evaluate(&table),
            Ok(Value::Text("1+1".into()))
        );
        // No resolution happens, so neither markers nor bare names matter.
        assert_eq!(
            decl(Keyword::Var, "s", "\"#nope x\"").evaluate(&table),
            Ok(Value::Text("#nope x".into()))
        );
        assert_eq!(
            decl(Keyword::Var, "s", "\"a\\n\"").evaluate(&table),
            Ok(Value::Text("a\\n".into()))
        );
    }

    #[test]
    fn quoted_var_strips_outer_quotes_only() {
        let table = SymbolTable::new();
        // Looks like a concatenation but starts and ends with a quote.
        assert_eq!(
            decl(Keyword::Var, "s", "\"a\" + \"b\"").evaluate(&table),
            Ok(Value::Text("a\" + \"b".into()))
        );
        assert_eq!(decl(Keyword::Var, "s", "\"").evaluate(&table), Ok(Value::Text(String::new())));
    }

    #[test]
    fn var_expression_must_be_text() {
        let table = symbols(&[("s", Value::Text("hi".into()))]);
        assert_eq!(
            decl(Keyword::Var, "t", "#s + ' there'").evaluate(&table),
            Ok(Value::Text("hi there".into()))
        );
        let err = decl(Keyword::Var, "t", "5").evaluate(&table).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch(ExpectedType::Text));
    }

    #[test]
    fn validates_name_before_assignment() {
        let table = SymbolTable::new();
        let mut bad = decl(Keyword::Int, "1a", "1");
        bad.operator_token = ":=";
        assert_eq!(
            bad.evaluate(&table).unwrap_err().kind,
            ErrorKind::InvalidName("1a".into())
        );
        bad.name = "a";
        assert_eq!(bad.evaluate(&table).unwrap_err().kind, ErrorKind::ExpectedAssign);
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("a"));
        assert!(is_identifier("_private9"));
        assert!(is_identifier("größe"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("#a"));
    }

    #[test]
    fn truncation_limits() {
        assert_eq!(truncate(-3.99), Some(-3));
        assert_eq!(truncate(3.99), Some(3));
        assert_eq!(truncate(-9_223_372_036_854_775_808.0), Some(i64::MIN));
        assert_eq!(truncate(9_223_372_036_854_775_808.0), None);
        assert_eq!(truncate(f64::INFINITY), None);
        assert_eq!(truncate(f64::NAN), None);
    }
}
