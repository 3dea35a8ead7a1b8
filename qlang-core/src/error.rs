use thiserror::Error;

use crate::ast::Operator;
use crate::value::ExpectedType;

/// A failed declaration, tagged with the line it came from.
///
/// The display form is the user-facing message for both front ends.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[Line {line}] Error: {kind}")]
pub struct CoreError {
    pub line: usize,
    pub kind: ErrorKind,
}

impl CoreError {
    pub fn new(line: usize, kind: ErrorKind) -> Self {
        CoreError { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("Invalid syntax. Format must be: <type> <name> = <value>")]
    Syntax,
    #[error("Unsupported declaration keyword '{0}'. Expected 'var' or 'int'.")]
    UnknownKeyword(String),
    #[error("Invalid variable name '{0}'")]
    InvalidName(String),
    #[error("Expected '=' after variable name.")]
    ExpectedAssign,
    #[error("Variable '{0}' used without '#'. Use '#{0}' to reference it.")]
    BareVariableUsage(String),
    #[error("Undefined variable '{0}' used in expression.")]
    UndefinedVariable(String),
    #[error("Mixed types in {} expression.", context_name(.0))]
    MixedType(ExpectedType),
    #[error("Unsupported expression")]
    UnsupportedExpression,
    #[error("Unsupported operator '{op}' in {} expression", context_name(.context))]
    UnsupportedOperator { op: Operator, context: ExpectedType },
    #[error("Expression does not evaluate to a {}.", type_name(.0))]
    TypeMismatch(ExpectedType),
    #[error("Variable '{0}' already declared.")]
    DuplicateDeclaration(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("math domain error")]
    MathDomain,
}

impl ErrorKind {
    pub fn at(self, line: usize) -> CoreError {
        CoreError::new(line, self)
    }
}

fn context_name(ty: &ExpectedType) -> &'static str {
    match ty {
        ExpectedType::Number => "numeric",
        ExpectedType::Text => "string",
    }
}

fn type_name(ty: &ExpectedType) -> &'static str {
    match ty {
        ExpectedType::Number => "number",
        ExpectedType::Text => "string",
    }
}
