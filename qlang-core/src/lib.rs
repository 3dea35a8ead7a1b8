//! Core of the qlang declaration language.
//!
//! A source line has the form `<keyword> <name> = <value>`, where the
//! keyword is `int` or `var` and the value is a small arithmetic or
//! string expression that may reference earlier declarations as
//! `#name`. The pipeline per line is roughly:
//!
//!   line
//!     -> pipeline     (field split, keyword dispatch)
//!     -> declaration  (name / `=` validation)
//!     -> resolver     (`#name` -> literal text)
//!     -> parser       (restricted AST)
//!     -> evaluator    (type-directed evaluation)
//!     -> pipeline     (uniqueness check, symbol table insert)
//!
//! Front ends (batch runner, interactive prompt) should depend on this
//! crate and drive [`Pipeline`] rather than reimplementing any of it.

// ---------------------------------------------------------------------
// Error handling and values
// ---------------------------------------------------------------------

pub mod error;
pub mod value;
pub mod symbols;

// ---------------------------------------------------------------------
// Expressions: lexing, parsing, reference resolution, evaluation
// ---------------------------------------------------------------------

pub mod lexer;
pub mod ast;
pub mod parser;
pub mod resolver;
pub mod evaluator;

// ---------------------------------------------------------------------
// Declarations and line processing
// ---------------------------------------------------------------------

pub mod declaration;
pub mod pipeline;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use error::{CoreError, ErrorKind};
pub use pipeline::{Binding, FailurePolicy, Flow, Pipeline, Sink, run_source};
pub use symbols::SymbolTable;
pub use value::{ExpectedType, Value};
