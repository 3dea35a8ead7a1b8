//! Type-directed evaluation of the restricted expression tree.
//!
//! Every binary node checks both operands against the expected type
//! before the operator is looked at, so `1 + "a"` is a mixed-type error
//! in either context while `"a" - "b"` and `7 // 2` are unsupported
//! operators.

use std::fmt;

use tracing::debug;

use crate::ast::{BinaryOp, Expr, Operator};
use crate::error::{CoreError, ErrorKind};
use crate::parser::parse;
use crate::value::{ExpectedType, Value};

/// A runtime value. Division can produce floats that never get stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Evaluated {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Evaluated::Int(_) | Evaluated::Float(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Evaluated::Text(_))
    }

    fn as_f64(&self) -> f64 {
        match self {
            Evaluated::Int(n) => *n as f64,
            Evaluated::Float(x) => *x,
            Evaluated::Text(_) => f64::NAN,
        }
    }
}

impl From<Value> for Evaluated {
    fn from(value: Value) -> Self {
        match value {
            Value::Integer(n) => Evaluated::Int(n),
            Value::Text(s) => Evaluated::Text(s),
        }
    }
}

impl fmt::Display for Evaluated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluated::Int(n) => write!(f, "{n}"),
            Evaluated::Float(x) => write!(f, "{x:?}"),
            Evaluated::Text(s) => f.write_str(s),
        }
    }
}

/// Parses and evaluates a fully substituted expression.
pub fn evaluate(source: &str, expected: ExpectedType, line: usize) -> Result<Evaluated, CoreError> {
    let expr = parse(source).map_err(|kind| kind.at(line))?;
    let result = eval_expr(&expr, expected).map_err(|kind| kind.at(line))?;
    debug!(line, ?expected, result = %result, "evaluated expression");
    Ok(result)
}

pub fn eval_expr(expr: &Expr, expected: ExpectedType) -> Result<Evaluated, ErrorKind> {
    match expr {
        Expr::Literal(value) => Ok(value.clone().into()),
        Expr::Binary { op, left, right } => {
            let left = eval_expr(left, expected)?;
            let right = eval_expr(right, expected)?;
            let operands_match = match expected {
                ExpectedType::Number => left.is_numeric() && right.is_numeric(),
                ExpectedType::Text => left.is_text() && right.is_text(),
            };
            if !operands_match {
                return Err(ErrorKind::MixedType(expected));
            }
            match (expected, *op, left, right) {
                (ExpectedType::Number, Operator::Arithmetic(op), left, right) => {
                    apply_numeric(op, &left, &right)
                }
                (
                    ExpectedType::Text,
                    Operator::Arithmetic(BinaryOp::Add),
                    Evaluated::Text(mut l),
                    Evaluated::Text(r),
                ) => {
                    l.push_str(&r);
                    Ok(Evaluated::Text(l))
                }
                (_, op, _, _) => Err(ErrorKind::UnsupportedOperator { op, context: expected }),
            }
        }
    }
}

fn apply_numeric(op: BinaryOp, left: &Evaluated, right: &Evaluated) -> Result<Evaluated, ErrorKind> {
    if let (Evaluated::Int(a), Evaluated::Int(b)) = (left, right) {
        return apply_int(op, *a, *b);
    }
    apply_float(op, left.as_f64(), right.as_f64())
}

fn apply_int(op: BinaryOp, a: i64, b: i64) -> Result<Evaluated, ErrorKind> {
    let checked = |result: Option<i64>| result.map(Evaluated::Int).ok_or(ErrorKind::Overflow);
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mul => checked(a.checked_mul(b)),
        BinaryOp::Div => apply_float(op, a as f64, b as f64),
        BinaryOp::Mod => {
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            // i64::MIN % -1 overflows in Rust but is simply 0.
            let r = a.checked_rem(b).unwrap_or(0);
            let floored = if r != 0 && (r < 0) != (b < 0) { r + b } else { r };
            Ok(Evaluated::Int(floored))
        }
        BinaryOp::Pow => {
            match (a, b) {
                (_, ..0) => return apply_float(op, a as f64, b as f64),
                (_, 0) | (1, _) => return Ok(Evaluated::Int(1)),
                (0, _) => return Ok(Evaluated::Int(0)),
                (-1, _) => return Ok(Evaluated::Int(if b % 2 == 0 { 1 } else { -1 })),
                _ => {}
            }
            let exponent = u32::try_from(b).map_err(|_| ErrorKind::Overflow)?;
            checked(a.checked_pow(exponent))
        }
    }
}

fn apply_float(op: BinaryOp, a: f64, b: f64) -> Result<Evaluated, ErrorKind> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ErrorKind::DivisionByZero);
            }
            a / b
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(ErrorKind::DivisionByZero);
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(ErrorKind::DivisionByZero);
            }
            let value = a.powf(b);
            if value.is_nan() {
                return Err(ErrorKind::MathDomain);
            }
            if value.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(ErrorKind::Overflow);
            }
            value
        }
    };
    Ok(Evaluated::Float(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ForeignOp;

    fn number(source: &str) -> Result<Evaluated, ErrorKind> {
        evaluate(source, ExpectedType::Number, 1).map_err(|err| err.kind)
    }

    fn text(source: &str) -> Result<Evaluated, ErrorKind> {
        evaluate(source, ExpectedType::Text, 1).map_err(|err| err.kind)
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(number("1 + 2 * 3").unwrap(), Evaluated::Int(7));
        assert_eq!(number("(1 + 2) * 3").unwrap(), Evaluated::Int(9));
        assert_eq!(number("2 ** 10").unwrap(), Evaluated::Int(1024));
        assert_eq!(number("10 - 3 - 2").unwrap(), Evaluated::Int(5));
    }

    #[test]
    fn division_is_true_division() {
        assert_eq!(number("7 / 2").unwrap(), Evaluated::Float(3.5));
        assert_eq!(number("-7 / 2").unwrap(), Evaluated::Float(-3.5));
        assert_eq!(number("6 / 3").unwrap(), Evaluated::Float(2.0));
    }

    #[test]
    fn modulo_takes_sign_of_divisor() {
        assert_eq!(number("7 % 3").unwrap(), Evaluated::Int(1));
        assert_eq!(number("-7 % 3").unwrap(), Evaluated::Int(2));
        assert_eq!(number("7 % -3").unwrap(), Evaluated::Int(-2));
        assert_eq!(number("7 / 2 % 2").unwrap(), Evaluated::Float(1.5));
        assert_eq!(number("-9223372036854775808 % -1").unwrap(), Evaluated::Int(0));
    }

    #[test]
    fn negative_exponent_promotes_to_float() {
        assert_eq!(number("2 ** -1").unwrap(), Evaluated::Float(0.5));
    }

    #[test]
    fn huge_exponents_on_trivial_bases() {
        assert_eq!(number("1 ** 4294967296").unwrap(), Evaluated::Int(1));
        assert_eq!(number("0 ** 4294967296").unwrap(), Evaluated::Int(0));
        assert_eq!(number("0 ** 0").unwrap(), Evaluated::Int(1));
        assert_eq!(number("-1 ** 4294967296").unwrap(), Evaluated::Int(1));
        assert_eq!(number("-1 ** 4294967297").unwrap(), Evaluated::Int(-1));
        assert_eq!(number("2 ** 4294967296"), Err(ErrorKind::Overflow));
    }

    #[test]
    fn arithmetic_failures() {
        assert_eq!(number("1 / 0"), Err(ErrorKind::DivisionByZero));
        assert_eq!(number("1 % 0"), Err(ErrorKind::DivisionByZero));
        assert_eq!(number("0 ** -1"), Err(ErrorKind::DivisionByZero));
        assert_eq!(number("9223372036854775807 + 1"), Err(ErrorKind::Overflow));
        assert_eq!(number("2 ** 64"), Err(ErrorKind::Overflow));
        assert_eq!(number("-8 ** (1 / 3)"), Err(ErrorKind::MathDomain));
    }

    #[test]
    fn concatenates_strings() {
        assert_eq!(
            text("\"hi\" + \" \" + 'there'").unwrap(),
            Evaluated::Text("hi there".into())
        );
    }

    #[test]
    fn mixed_operands_fail_in_both_contexts() {
        assert_eq!(number("1 + \"a\""), Err(ErrorKind::MixedType(ExpectedType::Number)));
        assert_eq!(text("\"a\" + 1"), Err(ErrorKind::MixedType(ExpectedType::Text)));
        assert_eq!(text("1 + 2"), Err(ErrorKind::MixedType(ExpectedType::Text)));
    }

    #[test]
    fn strings_only_support_concatenation() {
        assert_eq!(
            text("\"a\" * \"b\""),
            Err(ErrorKind::UnsupportedOperator {
                op: BinaryOp::Mul.into(),
                context: ExpectedType::Text,
            })
        );
    }

    #[test]
    fn unevaluated_operators_fail_after_operand_checks() {
        let floor_div = |context| ErrorKind::UnsupportedOperator {
            op: ForeignOp::FloorDiv.into(),
            context,
        };
        assert_eq!(number("7 // 2"), Err(floor_div(ExpectedType::Number)));
        assert_eq!(text("\"a\" // \"b\""), Err(floor_div(ExpectedType::Text)));
        assert_eq!(
            number("1 << 2"),
            Err(ErrorKind::UnsupportedOperator {
                op: ForeignOp::ShiftLeft.into(),
                context: ExpectedType::Number,
            })
        );
        assert_eq!(
            number("6 & 3"),
            Err(ErrorKind::UnsupportedOperator {
                op: ForeignOp::BitAnd.into(),
                context: ExpectedType::Number,
            })
        );
        // Operand failures come first.
        assert_eq!(number("7 // \"a\""), Err(ErrorKind::MixedType(ExpectedType::Number)));
        assert_eq!(number("(1 / 0) | 1"), Err(ErrorKind::DivisionByZero));
        assert_eq!(number("(\"a\" + 1) + (7 // 2)"), Err(ErrorKind::MixedType(ExpectedType::Number)));
    }

    #[test]
    fn lone_literal_is_returned_unchecked() {
        assert_eq!(number("\"a\"").unwrap(), Evaluated::Text("a".into()));
        assert_eq!(text("5").unwrap(), Evaluated::Int(5));
    }

    #[test]
    fn errors_carry_line() {
        let err = evaluate("x", ExpectedType::Number, 9).unwrap_err();
        assert_eq!(err, ErrorKind::UnsupportedExpression.at(9));
    }
}
