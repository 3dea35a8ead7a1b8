//! Lexer for substituted expressions.
//!
//! By the time an expression reaches here every `#name` marker has
//! been replaced, so the only legal tokens are literals, binary
//! operators and parentheses. Binary operators outside the arithmetic
//! six are still tokenized so the evaluator can report them as
//! unsupported operators. Anything else is rejected outright.

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,

    IntLiteral,
    StringLiteral,

    LParen,     // (
    RParen,     // )
    Plus,       // +
    Minus,      // -
    Star,       // *
    DoubleStar, // **
    Slash,      // /
    Percent,    // %

    DoubleSlash, // //
    At,          // @
    ShiftLeft,   // <<
    ShiftRight,  // >>
    Ampersand,   // &
    Caret,       // ^
    Pipe,        // |
}

/// A token and the byte range it covers in the source.
///
/// For string literals `text_start` / `text_end` cover the contents
/// only, without the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub text_start: usize,
    pub text_end: usize,
}

impl Token {
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.text_start..self.text_end]
    }
}

pub fn lex(source: &str) -> Result<Vec<Token>, ErrorKind> {
    let mut lexer = Lexer { source, index: 0 };
    lexer.run()
}

struct Lexer<'src> {
    source: &'src str,
    index: usize,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> Result<Vec<Token>, ErrorKind> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.consume_char();
                continue;
            }

            let start = self.index;
            let token = match ch {
                '(' => self.single(TokenKind::LParen, start),
                ')' => self.single(TokenKind::RParen, start),
                '+' => self.single(TokenKind::Plus, start),
                '-' => self.single(TokenKind::Minus, start),
                '%' => self.single(TokenKind::Percent, start),
                '@' => self.single(TokenKind::At, start),
                '&' => self.single(TokenKind::Ampersand, start),
                '^' => self.single(TokenKind::Caret, start),
                '|' => self.single(TokenKind::Pipe, start),
                '*' => self.single_or_double(TokenKind::Star, TokenKind::DoubleStar, start),
                '/' => self.single_or_double(TokenKind::Slash, TokenKind::DoubleSlash, start),
                // Comparisons share the first character with the shifts.
                '<' | '>' => {
                    self.consume_char();
                    if self.peek_char() != Some(ch) {
                        return Err(ErrorKind::UnsupportedExpression);
                    }
                    self.consume_char();
                    let kind = if ch == '<' { TokenKind::ShiftLeft } else { TokenKind::ShiftRight };
                    self.simple_token(kind, start)
                }
                '"' | '\'' => self.lex_string(ch, start)?,
                '0'..='9' => self.lex_number(start)?,
                _ => return Err(ErrorKind::UnsupportedExpression),
            };
            tokens.push(token);
        }

        let len = self.source.len();
        tokens.push(Token {
            kind: TokenKind::Eof,
            start: len,
            end: len,
            text_start: len,
            text_end: len,
        });
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.consume_char();
        self.simple_token(kind, start)
    }

    /// `single` unless the same character follows, as in `*` and `**`.
    fn single_or_double(&mut self, single: TokenKind, double: TokenKind, start: usize) -> Token {
        let Some(ch) = self.peek_char() else {
            return self.simple_token(single, start);
        };
        self.consume_char();
        if self.peek_char() == Some(ch) {
            self.consume_char();
            self.simple_token(double, start)
        } else {
            self.simple_token(single, start)
        }
    }

    fn simple_token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            start,
            end: self.index,
            text_start: start,
            text_end: self.index,
        }
    }

    /// Quoted text, taken verbatim. A backslash has no special meaning.
    fn lex_string(&mut self, quote: char, start: usize) -> Result<Token, ErrorKind> {
        self.consume_char();
        let content_start = self.index;
        while let Some(ch) = self.peek_char() {
            if ch == quote {
                let content_end = self.index;
                self.consume_char();
                return Ok(Token {
                    kind: TokenKind::StringLiteral,
                    start,
                    end: self.index,
                    text_start: content_start,
                    text_end: content_end,
                });
            }
            self.consume_char();
        }
        Err(ErrorKind::UnsupportedExpression)
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, ErrorKind> {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() || ch == '_' {
                self.consume_char();
            } else {
                break;
            }
        }

        // Floats, exponents, radix prefixes and digit-led names are all out.
        if let Some(ch) = self.peek_char() {
            if ch == '.' || ch.is_alphanumeric() {
                return Err(ErrorKind::UnsupportedExpression);
            }
        }

        let text = &self.source[start..self.index];
        if text.ends_with('_') || text.contains("__") {
            return Err(ErrorKind::UnsupportedExpression);
        }
        // Leading zeros are only allowed on a literal that is all zeros.
        if text.starts_with('0') && text.contains(|ch: char| ch.is_ascii_digit() && ch != '0') {
            return Err(ErrorKind::UnsupportedExpression);
        }
        Ok(self.simple_token(TokenKind::IntLiteral, start))
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn consume_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.index += ch.len_utf8();
        }
    }
}
