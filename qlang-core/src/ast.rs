use std::fmt;

use crate::value::Value;

/// Restricted expression tree. Literals and binary operators only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Value),
    Binary {
        op: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: impl Into<Operator>, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// The operators the language evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

/// Binary operators that parse but never evaluate.
///
/// They get a place in the grammar so that `7 // 2` is rejected as an
/// unsupported operator once its operands have been checked, rather
/// than as an unparseable expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignOp {
    FloorDiv,
    MatMul,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitXor,
    BitOr,
}

impl ForeignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ForeignOp::FloorDiv => "//",
            ForeignOp::MatMul => "@",
            ForeignOp::ShiftLeft => "<<",
            ForeignOp::ShiftRight => ">>",
            ForeignOp::BitAnd => "&",
            ForeignOp::BitXor => "^",
            ForeignOp::BitOr => "|",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Arithmetic(BinaryOp),
    Foreign(ForeignOp),
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Arithmetic(op) => op.symbol(),
            Operator::Foreign(op) => op.symbol(),
        }
    }
}

impl From<BinaryOp> for Operator {
    fn from(op: BinaryOp) -> Self {
        Operator::Arithmetic(op)
    }
}

impl From<ForeignOp> for Operator {
    fn from(op: ForeignOp) -> Self {
        Operator::Foreign(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
