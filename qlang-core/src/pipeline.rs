//! Line-at-a-time declaration processing.
//!
//! A [`Pipeline`] owns the symbol table for one run. Each call to
//! [`Pipeline::process_line`] either commits exactly one binding or
//! leaves the table untouched. What happens after a failed line is the
//! caller's [`FailurePolicy`], applied by [`Pipeline::feed`].

use tracing::debug;

use crate::declaration::{Declaration, Keyword};
use crate::error::{CoreError, ErrorKind};
use crate::symbols::SymbolTable;
use crate::value::Value;

/// What to do with the rest of the run once a line fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop processing and discard everything declared so far.
    Halt,
    /// Report the line and carry on with the table as it was.
    Skip,
}

/// A binding committed by a successful line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub line: usize,
    pub name: String,
    pub value: Value,
}

/// Receives the outcome of every processed line.
pub trait Sink {
    fn accepted(&mut self, binding: &Binding);
    fn rejected(&mut self, error: &CoreError);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

#[derive(Debug)]
pub struct Pipeline {
    symbols: SymbolTable,
    line_number: usize,
    policy: FailurePolicy,
    halted: bool,
}

impl Pipeline {
    pub fn new(policy: FailurePolicy) -> Self {
        Pipeline {
            symbols: SymbolTable::new(),
            line_number: 0,
            policy,
            halted: false,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Number of lines consumed so far, blank ones included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Processes one source line. Blank lines yield `Ok(None)`.
    ///
    /// The line counter advances on every call. The table is only
    /// modified when the result is `Ok(Some(_))`.
    pub fn process_line(&mut self, line: &str) -> Result<Option<Binding>, CoreError> {
        self.line_number += 1;
        let line_number = self.line_number;

        let fields = split_fields(line);
        if fields.is_empty() {
            return Ok(None);
        }
        let Ok([keyword, name, operator_token, raw_value]) = <[&str; 4]>::try_from(fields) else {
            return Err(ErrorKind::Syntax.at(line_number));
        };
        let keyword = keyword
            .parse::<Keyword>()
            .map_err(|kind| kind.at(line_number))?;

        let declaration = Declaration {
            keyword,
            name,
            operator_token,
            raw_value,
            line: line_number,
        };
        let value = declaration.evaluate(&self.symbols)?;

        // Uniqueness is checked only once the right-hand side has evaluated.
        self.symbols
            .insert(name.to_string(), value.clone())
            .map_err(|_| ErrorKind::DuplicateDeclaration(name.to_string()).at(line_number))?;

        debug!(line = line_number, name, value = %value, "committed binding");
        Ok(Some(Binding {
            line: line_number,
            name: name.to_string(),
            value,
        }))
    }

    /// Processes one line and applies the failure policy.
    ///
    /// Once a halting pipeline has failed, further lines are ignored.
    pub fn feed(&mut self, line: &str, sink: &mut impl Sink) -> Flow {
        if self.halted {
            return Flow::Halt;
        }
        match self.process_line(line) {
            Ok(Some(binding)) => sink.accepted(&binding),
            Ok(None) => {}
            Err(error) => {
                sink.rejected(&error);
                if self.policy == FailurePolicy::Halt {
                    debug!(line = error.line, "halting run");
                    self.halted = true;
                    return Flow::Halt;
                }
            }
        }
        Flow::Continue
    }

    /// Ends the run. A halted run has no output.
    pub fn finalize(self) -> Option<SymbolTable> {
        if self.halted { None } else { Some(self.symbols) }
    }
}

/// Splits on whitespace into at most four fields.
///
/// The fourth field is the remainder of the line after the third run of
/// whitespace, so it keeps any internal whitespace.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(4);
    let mut rest = line.trim();
    while !rest.is_empty() {
        if fields.len() == 3 {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }
    fields
}

/// Runs a whole source text with the halting policy.
///
/// Line numbers are physical: blank lines count.
pub fn run_source(source: &str) -> Result<SymbolTable, CoreError> {
    let mut pipeline = Pipeline::new(FailurePolicy::Halt);
    for line in source.lines() {
        pipeline.process_line(line)?;
    }
    Ok(pipeline.symbols)
}
