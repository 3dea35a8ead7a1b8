//! `#name` reference resolution.
//!
//! Resolution is textual. The bare-usage check looks at every maximal
//! run of word characters in the raw expression that names a declared
//! symbol. Such a word is rejected when `#word` appears nowhere in the
//! text, string literal contents included, or when it sits outside any
//! string literal without a `#` directly in front of it. A declared name
//! quoted inside a literal is therefore rejected unless the expression
//! also references it.

use std::ops::Range;

use tracing::debug;

use crate::error::{CoreError, ErrorKind};
use crate::symbols::SymbolTable;

const MARKER: char = '#';

/// Rewrites every `#name` in `expr` into the literal form of its value.
///
/// Replacement text is never rescanned, so a stored string that itself
/// contains `#` is spliced in as-is.
pub fn resolve(expr: &str, symbols: &SymbolTable, line: usize) -> Result<String, CoreError> {
    check_bare_usage(expr, symbols, line)?;

    let mut resolved = String::with_capacity(expr.len());
    let mut rest = expr;
    while let Some(offset) = rest.find(MARKER) {
        resolved.push_str(&rest[..offset]);
        let after = &rest[offset + MARKER.len_utf8()..];
        let name = leading_word(after);
        if name.is_empty() {
            // A lone marker is left for the parser to reject.
            resolved.push(MARKER);
            rest = after;
            continue;
        }
        let value = symbols
            .get(name)
            .ok_or_else(|| ErrorKind::UndefinedVariable(name.to_string()).at(line))?;
        resolved.push_str(&value.literal());
        rest = &after[name.len()..];
    }
    resolved.push_str(rest);

    debug!(line, raw = expr, resolved = %resolved, "substituted references");
    Ok(resolved)
}

fn check_bare_usage(expr: &str, symbols: &SymbolTable, line: usize) -> Result<(), CoreError> {
    let literals = literal_spans(expr);
    for (start, word) in words(expr) {
        if !symbols.contains(word) {
            continue;
        }
        let referenced = expr.contains(&format!("{MARKER}{word}"));
        let quoted = literals.iter().any(|span| span.contains(&start));
        let marked = expr[..start].ends_with(MARKER);
        if !referenced || (!quoted && !marked) {
            return Err(ErrorKind::BareVariableUsage(word.to_string()).at(line));
        }
    }
    Ok(())
}

/// Byte ranges of quoted string literals, quotes included.
///
/// An unterminated literal runs to the end of the text.
fn literal_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut chars = text.char_indices();
    while let Some((start, ch)) = chars.next() {
        if ch != '"' && ch != '\'' {
            continue;
        }
        let end = chars
            .by_ref()
            .find(|(_, next)| *next == ch)
            .map(|(index, _)| index + 1)
            .unwrap_or(text.len());
        spans.push(start..end);
    }
    spans
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Maximal runs of word characters with their byte offsets, in order.
fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    std::iter::from_fn(move || {
        let rest = &text[offset..];
        let start = offset + rest.find(is_word_char)?;
        let word = leading_word(&text[start..]);
        offset = start + word.len();
        Some((start, word))
    })
}

fn leading_word(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, ch)| !is_word_char(*ch))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    &text[..end]
}
