//! Program representation for the interpreted variant.
//!
//! Programs are trees of [`Stmt`] over a flat slot environment and a handful of
//! typed arrays. The operator impls on [`Expr`] exist so kernel programs read
//! close to the arithmetic they evaluate; `a * b / c` builds the same
//! left-associated tree that the native code evaluates.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

pub type Slot = usize;
pub type ArrayId = usize;

/// Dynamically typed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f64),
    /// Unsigned 32-bit word with wrapping arithmetic.
    Word(u32),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Float(_) => "float",
            Value::Word(_) => "word",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Word(v) => write!(f, "{v}u"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Sqrt,
    /// Word to float.
    ToFloat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Xor,
    Shr,
    Rotl,
    Lt,
    Gt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Value),
    Load(Slot),
    Index(ArrayId, Box<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Set(Slot, Expr),
    Store(ArrayId, Expr, Expr),
    If(Expr, Vec<Stmt>, Vec<Stmt>),
    While(Expr, Vec<Stmt>),
    /// Leave the innermost `While`.
    Break,
}

macro_rules! binop_impl {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::Binary($op, Box::new(self), Box::new(rhs))
            }
        }
    };
}

binop_impl!(Add, add, BinOp::Add);
binop_impl!(Sub, sub, BinOp::Sub);
binop_impl!(Mul, mul, BinOp::Mul);
binop_impl!(Div, div, BinOp::Div);

pub fn lit(v: f64) -> Expr {
    Expr::Lit(Value::Float(v))
}

pub fn word(v: u32) -> Expr {
    Expr::Lit(Value::Word(v))
}

pub fn var(slot: Slot) -> Expr {
    Expr::Load(slot)
}

pub fn idx(array: ArrayId, index: Expr) -> Expr {
    Expr::Index(array, Box::new(index))
}

fn unary(op: UnOp, e: Expr) -> Expr {
    Expr::Unary(op, Box::new(e))
}

fn binary(op: BinOp, a: Expr, b: Expr) -> Expr {
    Expr::Binary(op, Box::new(a), Box::new(b))
}

pub fn neg(e: Expr) -> Expr {
    unary(UnOp::Neg, e)
}

pub fn sqrt(e: Expr) -> Expr {
    unary(UnOp::Sqrt, e)
}

pub fn to_float(e: Expr) -> Expr {
    unary(UnOp::ToFloat, e)
}

pub fn min(a: Expr, b: Expr) -> Expr {
    binary(BinOp::Min, a, b)
}

pub fn max(a: Expr, b: Expr) -> Expr {
    binary(BinOp::Max, a, b)
}

pub fn xor(a: Expr, b: Expr) -> Expr {
    binary(BinOp::Xor, a, b)
}

pub fn shr(a: Expr, b: Expr) -> Expr {
    binary(BinOp::Shr, a, b)
}

pub fn rotl(a: Expr, b: Expr) -> Expr {
    binary(BinOp::Rotl, a, b)
}

pub fn lt(a: Expr, b: Expr) -> Expr {
    binary(BinOp::Lt, a, b)
}

pub fn gt(a: Expr, b: Expr) -> Expr {
    binary(BinOp::Gt, a, b)
}

pub fn set(slot: Slot, e: Expr) -> Stmt {
    Stmt::Set(slot, e)
}

pub fn store(array: ArrayId, index: Expr, value: Expr) -> Stmt {
    Stmt::Store(array, index, value)
}

pub fn when(cond: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Stmt {
    Stmt::If(cond, then, otherwise)
}

pub fn repeat_while(cond: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While(cond, body)
}
