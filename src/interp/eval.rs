//! Tree-walking evaluator.

use super::ast::{ArrayId, BinOp, Expr, Slot, Stmt, UnOp, Value};
use crate::{BenchError, BenchResult};

/// Typed array owned by the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Float(Vec<f64>),
    Word(Vec<u32>),
}

impl Array {
    fn len(&self) -> usize {
        match self {
            Array::Float(v) => v.len(),
            Array::Word(v) => v.len(),
        }
    }
}

enum Flow {
    Next,
    Break,
}

/// Interpreter state: value slots, arrays and a statement counter.
#[derive(Debug)]
pub struct Interpreter {
    slots: Vec<Value>,
    arrays: Vec<Array>,
    steps: u64,
}

impl Interpreter {
    pub fn new(slot_count: usize, arrays: Vec<Array>) -> Self {
        Interpreter {
            slots: vec![Value::Word(0); slot_count],
            arrays,
            steps: 0,
        }
    }

    pub fn set_slot(&mut self, slot: Slot, value: Value) -> BenchResult<()> {
        let cell = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| runtime_error(format!("slot {slot} out of range")))?;
        *cell = value;
        Ok(())
    }

    pub fn slot(&self, slot: Slot) -> BenchResult<Value> {
        self.slots
            .get(slot)
            .copied()
            .ok_or_else(|| runtime_error(format!("slot {slot} out of range")))
    }

    /// Statements executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Move an array out of the interpreter.
    pub fn take_array(&mut self, id: ArrayId) -> BenchResult<Array> {
        let cell = self
            .arrays
            .get_mut(id)
            .ok_or_else(|| runtime_error(format!("array {id} out of range")))?;
        Ok(std::mem::replace(cell, Array::Word(Vec::new())))
    }

    pub fn run(&mut self, program: &[Stmt]) -> BenchResult<()> {
        match self.exec_block(program)? {
            Flow::Next => Ok(()),
            Flow::Break => Err(runtime_error("break outside of loop".into())),
        }
    }

    fn exec_block(&mut self, block: &[Stmt]) -> BenchResult<Flow> {
        for stmt in block {
            if let Flow::Break = self.exec(stmt)? {
                return Ok(Flow::Break);
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, stmt: &Stmt) -> BenchResult<Flow> {
        self.steps += 1;
        match stmt {
            Stmt::Set(slot, e) => {
                let v = self.eval(e)?;
                self.set_slot(*slot, v)?;
            }
            Stmt::Store(id, index, value) => {
                let i = self.eval_index(index)?;
                let v = self.eval(value)?;
                self.store(*id, i, v)?;
            }
            Stmt::If(cond, then, otherwise) => {
                let branch = if self.eval_bool(cond)? { then } else { otherwise };
                return self.exec_block(branch);
            }
            Stmt::While(cond, body) => {
                while self.eval_bool(cond)? {
                    if let Flow::Break = self.exec_block(body)? {
                        break;
                    }
                }
            }
            Stmt::Break => return Ok(Flow::Break),
        }
        Ok(Flow::Next)
    }

    fn eval_bool(&self, e: &Expr) -> BenchResult<bool> {
        match self.eval(e)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_error("condition", &[other])),
        }
    }

    fn eval_index(&self, e: &Expr) -> BenchResult<usize> {
        match self.eval(e)? {
            Value::Word(w) => Ok(w as usize),
            other => Err(type_error("index", &[other])),
        }
    }

    fn store(&mut self, id: ArrayId, i: usize, v: Value) -> BenchResult<()> {
        let array = self
            .arrays
            .get_mut(id)
            .ok_or_else(|| runtime_error(format!("array {id} out of range")))?;
        let len = array.len();
        match (array, v) {
            (Array::Float(a), Value::Float(x)) if i < len => a[i] = x,
            (Array::Word(a), Value::Word(x)) if i < len => a[i] = x,
            (_, v) if i < len => return Err(type_error("store", &[v])),
            _ => return Err(runtime_error(format!("store index {i} out of bounds ({len})"))),
        }
        Ok(())
    }

    pub fn eval(&self, e: &Expr) -> BenchResult<Value> {
        match e {
            Expr::Lit(v) => Ok(*v),
            Expr::Load(slot) => self.slot(*slot),
            Expr::Index(id, index) => {
                let i = self.eval_index(index)?;
                let array = self
                    .arrays
                    .get(*id)
                    .ok_or_else(|| runtime_error(format!("array {id} out of range")))?;
                let out_of_bounds =
                    || runtime_error(format!("index {i} out of bounds ({})", array.len()));
                match array {
                    Array::Float(a) => a.get(i).map(|x| Value::Float(*x)).ok_or_else(out_of_bounds),
                    Array::Word(a) => a.get(i).map(|x| Value::Word(*x)).ok_or_else(out_of_bounds),
                }
            }
            Expr::Unary(op, inner) => unary(*op, self.eval(inner)?),
            Expr::Binary(op, a, b) => binary(*op, self.eval(a)?, self.eval(b)?),
        }
    }
}

fn unary(op: UnOp, v: Value) -> BenchResult<Value> {
    match (op, v) {
        (UnOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnOp::Sqrt, Value::Float(x)) => Ok(Value::Float(x.sqrt())),
        (UnOp::ToFloat, Value::Word(x)) => Ok(Value::Float(f64::from(x))),
        (op, v) => Err(type_error(&format!("{op:?}"), &[v])),
    }
}

fn binary(op: BinOp, a: Value, b: Value) -> BenchResult<Value> {
    use Value::{Bool, Float, Word};
    let v = match (op, a, b) {
        (BinOp::Add, Float(x), Float(y)) => Float(x + y),
        (BinOp::Sub, Float(x), Float(y)) => Float(x - y),
        (BinOp::Mul, Float(x), Float(y)) => Float(x * y),
        (BinOp::Div, Float(x), Float(y)) => Float(x / y),
        (BinOp::Min, Float(x), Float(y)) => Float(x.min(y)),
        (BinOp::Max, Float(x), Float(y)) => Float(x.max(y)),
        (BinOp::Lt, Float(x), Float(y)) => Bool(x < y),
        (BinOp::Gt, Float(x), Float(y)) => Bool(x > y),

        (BinOp::Add, Word(x), Word(y)) => Word(x.wrapping_add(y)),
        (BinOp::Sub, Word(x), Word(y)) => Word(x.wrapping_sub(y)),
        (BinOp::Mul, Word(x), Word(y)) => Word(x.wrapping_mul(y)),
        (BinOp::Div, Word(x), Word(y)) => Word(
            x.checked_div(y)
                .ok_or_else(|| runtime_error("division by zero".into()))?,
        ),
        (BinOp::Min, Word(x), Word(y)) => Word(x.min(y)),
        (BinOp::Max, Word(x), Word(y)) => Word(x.max(y)),
        (BinOp::Xor, Word(x), Word(y)) => Word(x ^ y),
        (BinOp::Shr, Word(x), Word(y)) => Word(x.wrapping_shr(y)),
        (BinOp::Rotl, Word(x), Word(y)) => Word(x.rotate_left(y)),
        (BinOp::Lt, Word(x), Word(y)) => Bool(x < y),
        (BinOp::Gt, Word(x), Word(y)) => Bool(x > y),

        (op, a, b) => return Err(type_error(&format!("{op:?}"), &[a, b])),
    };
    Ok(v)
}

fn runtime_error(msg: String) -> BenchError {
    BenchError::Message(format!("interpreter: {msg}"))
}

fn type_error(what: &str, operands: &[Value]) -> BenchError {
    let types: Vec<&str> = operands.iter().map(Value::type_name).collect();
    runtime_error(format!("type error in {what}: ({})", types.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ast::*;

    #[test]
    fn test_arithmetic_and_loops() {
        // sum = 0; i = 0; while i < 10 { sum = sum + float(i); i = i + 1 }
        let program = vec![
            set(0, lit(0.0)),
            set(1, word(0)),
            repeat_while(
                lt(var(1), word(10)),
                vec![set(0, var(0) + to_float(var(1))), set(1, var(1) + word(1))],
            ),
        ];
        let mut it = Interpreter::new(2, Vec::new());
        it.run(&program).unwrap();
        assert_eq!(it.slot(0).unwrap(), Value::Float(45.0));
        assert!(it.steps() > 20);
    }

    #[test]
    fn test_break_leaves_innermost_loop() {
        let program = vec![
            set(0, word(0)),
            repeat_while(
                lt(var(0), word(100)),
                vec![
                    when(gt(var(0), word(6)), vec![Stmt::Break], vec![]),
                    set(0, var(0) + word(1)),
                ],
            ),
        ];
        let mut it = Interpreter::new(1, Vec::new());
        it.run(&program).unwrap();
        assert_eq!(it.slot(0).unwrap(), Value::Word(7));
    }

    #[test]
    fn test_arrays_and_word_ops() {
        let program = vec![
            store(0, word(1), rotl(xor(idx(0, word(0)), word(1)), word(4))),
            set(0, shr(word(0xF0), word(4))),
        ];
        let mut it = Interpreter::new(1, vec![Array::Word(vec![2, 0])]);
        it.run(&program).unwrap();
        assert_eq!(it.take_array(0).unwrap(), Array::Word(vec![2, 48]));
        assert_eq!(it.slot(0).unwrap(), Value::Word(0x0F));
    }

    #[test]
    fn test_type_and_bounds_errors_are_reported() {
        let mut it = Interpreter::new(1, vec![Array::Float(vec![0.0])]);
        assert!(it.run(&[set(0, lit(1.0) + word(1))]).is_err());
        assert!(it.run(&[set(0, idx(0, word(5)))]).is_err());
        assert!(it.run(&[store(0, word(0), word(3))]).is_err());
        assert!(it.run(&[when(lit(1.0), vec![], vec![])]).is_err());
        assert!(it.run(&[Stmt::Break]).is_err());
    }
}
