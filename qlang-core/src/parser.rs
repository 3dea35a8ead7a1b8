use crate::ast::{BinaryOp, Expr, ForeignOp, Operator};
use crate::error::ErrorKind;
use crate::lexer::{Token, TokenKind, lex};
use crate::value::Value;

type Level = &'static [(TokenKind, Operator)];

/// Left-associative binary levels, loosest binding first.
const LEVELS: [Level; 6] = [
    &[(TokenKind::Pipe, Operator::Foreign(ForeignOp::BitOr))],
    &[(TokenKind::Caret, Operator::Foreign(ForeignOp::BitXor))],
    &[(TokenKind::Ampersand, Operator::Foreign(ForeignOp::BitAnd))],
    &[
        (TokenKind::ShiftLeft, Operator::Foreign(ForeignOp::ShiftLeft)),
        (TokenKind::ShiftRight, Operator::Foreign(ForeignOp::ShiftRight)),
    ],
    &[
        (TokenKind::Plus, Operator::Arithmetic(BinaryOp::Add)),
        (TokenKind::Minus, Operator::Arithmetic(BinaryOp::Sub)),
    ],
    &[
        (TokenKind::Star, Operator::Arithmetic(BinaryOp::Mul)),
        (TokenKind::Slash, Operator::Arithmetic(BinaryOp::Div)),
        (TokenKind::DoubleSlash, Operator::Foreign(ForeignOp::FloorDiv)),
        (TokenKind::Percent, Operator::Arithmetic(BinaryOp::Mod)),
        (TokenKind::At, Operator::Foreign(ForeignOp::MatMul)),
    ],
];

/// Parses a substituted expression into the restricted tree.
///
/// Grammar, loosest binding first:
///
/// ```text
/// expr    := xor ("|" xor)*
/// xor     := and ("^" and)*
/// and     := shift ("&" shift)*
/// shift   := sum (("<<" | ">>") sum)*
/// sum     := product (("+" | "-") product)*
/// product := power (("*" | "/" | "//" | "%" | "@") power)*
/// power   := atom ("**" power)?
/// atom    := INT | "-" INT | STRING | "(" expr ")"
/// ```
///
/// `"-" INT` is only a literal when the sign touches the digits; it is
/// how substituted negative integers come back in. Every construct
/// outside this grammar is `UnsupportedExpression`. Operators outside
/// [`BinaryOp`] parse into the tree and are left for the evaluator to
/// reject.
pub fn parse(source: &str) -> Result<Expr, ErrorKind> {
    let tokens = lex(source)?;
    let mut position = 0;
    let expr = parse_level(0, source, &tokens, &mut position)?;
    if peek(&tokens, position) != TokenKind::Eof {
        return Err(ErrorKind::UnsupportedExpression);
    }
    Ok(expr)
}

fn parse_level(
    level: usize,
    source: &str,
    tokens: &[Token],
    position: &mut usize,
) -> Result<Expr, ErrorKind> {
    let Some(operators) = LEVELS.get(level) else {
        return parse_power(source, tokens, position);
    };
    let mut left = parse_level(level + 1, source, tokens, position)?;
    loop {
        let kind = peek(tokens, *position);
        let Some(&(_, op)) = operators.iter().find(|(token, _)| *token == kind) else {
            return Ok(left);
        };
        *position += 1;
        let right = parse_level(level + 1, source, tokens, position)?;
        left = Expr::binary(op, left, right);
    }
}

fn parse_power(source: &str, tokens: &[Token], position: &mut usize) -> Result<Expr, ErrorKind> {
    let base = parse_atom(source, tokens, position)?;
    if peek(tokens, *position) == TokenKind::DoubleStar {
        *position += 1;
        let exponent = parse_power(source, tokens, position)?;
        return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
    }
    Ok(base)
}

fn parse_atom(source: &str, tokens: &[Token], position: &mut usize) -> Result<Expr, ErrorKind> {
    let token = tokens
        .get(*position)
        .ok_or(ErrorKind::UnsupportedExpression)?;
    *position += 1;
    match token.kind {
        TokenKind::IntLiteral => int_literal(token.text(source), false),
        TokenKind::StringLiteral => Ok(Expr::Literal(Value::Text(token.text(source).to_string()))),
        TokenKind::Minus => {
            let digits = tokens
                .get(*position)
                .filter(|next| next.kind == TokenKind::IntLiteral && next.start == token.end)
                .ok_or(ErrorKind::UnsupportedExpression)?;
            *position += 1;
            int_literal(digits.text(source), true)
        }
        TokenKind::LParen => {
            let expr = parse_level(0, source, tokens, position)?;
            if peek(tokens, *position) != TokenKind::RParen {
                return Err(ErrorKind::UnsupportedExpression);
            }
            *position += 1;
            Ok(expr)
        }
        _ => Err(ErrorKind::UnsupportedExpression),
    }
}

fn int_literal(text: &str, negative: bool) -> Result<Expr, ErrorKind> {
    let mut digits = String::with_capacity(text.len() + 1);
    if negative {
        digits.push('-');
    }
    digits.extend(text.chars().filter(|ch| *ch != '_'));
    let value = digits.parse::<i64>().map_err(|_| ErrorKind::Overflow)?;
    Ok(Expr::Literal(Value::Integer(value)))
}

fn peek(tokens: &[Token], position: usize) -> TokenKind {
    tokens
        .get(position)
        .map(|token| token.kind)
        .unwrap_or(TokenKind::Eof)
}
