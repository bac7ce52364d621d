//! Interpreted variant: every algorithm run as a program on a dynamically typed
//! tree-walking interpreter, on the calling thread.

pub mod ast;
pub mod eval;
pub mod programs;

use tracing::debug;

pub use ast::{Expr, Stmt, Value};
pub use eval::{Array, Interpreter};

use crate::boundary::Output;
use crate::core::WorkloadSpec;
use crate::kernels::hash::HASH_BLOCK;
use crate::{BenchError, BenchResult};

fn word(n: usize, what: &str) -> BenchResult<Value> {
    u32::try_from(n)
        .map(Value::Word)
        .map_err(|_| BenchError::InvalidWorkload(format!("{what} {n} exceeds the interpreter word size")))
}

fn floats(array: Array) -> BenchResult<Vec<f64>> {
    match array {
        Array::Float(v) => Ok(v),
        Array::Word(_) => Err(BenchError::Message("interpreter: expected a float array".into())),
    }
}

fn words(array: Array) -> BenchResult<Vec<u32>> {
    match array {
        Array::Word(v) => Ok(v),
        Array::Float(_) => Err(BenchError::Message("interpreter: expected a word array".into())),
    }
}

/// Run `workload` through the interpreter.
pub fn run(workload: &WorkloadSpec) -> BenchResult<Output> {
    workload.validate()?;
    // Every index the programs compute must fit in a word.
    word(workload.output_len(), "output length")?;

    let (output, steps) = match workload {
        WorkloadSpec::MatrixMultiply { size, a, b } => {
            use programs::matrix::*;
            let mut it = Interpreter::new(
                SLOTS,
                vec![
                    Array::Float(a.clone()),
                    Array::Float(b.clone()),
                    Array::Float(vec![0.0; size * size]),
                ],
            );
            it.set_slot(N, word(*size, "matrix size")?)?;
            it.run(&program())?;
            (Output::F64(floats(it.take_array(C)?)?), it.steps())
        }
        WorkloadSpec::Mandelbrot {
            width,
            height,
            viewport,
            max_iter,
        } => {
            use programs::mandelbrot::*;
            let mut it = Interpreter::new(SLOTS, vec![Array::Word(vec![0; width * height])]);
            it.set_slot(W, word(*width, "width")?)?;
            it.set_slot(H, word(*height, "height")?)?;
            it.set_slot(XMIN, Value::Float(viewport.xmin))?;
            it.set_slot(XMAX, Value::Float(viewport.xmax))?;
            it.set_slot(YMIN, Value::Float(viewport.ymin))?;
            it.set_slot(YMAX, Value::Float(viewport.ymax))?;
            it.set_slot(MAX_ITER, Value::Word(*max_iter))?;
            it.run(&program())?;
            (Output::U32(words(it.take_array(OUT)?)?), it.steps())
        }
        WorkloadSpec::HashDiffusion { data, iterations } => {
            use programs::hash::*;
            let blocks = (*iterations as usize).div_ceil(HASH_BLOCK);
            let data: Vec<u32> = data.iter().copied().map(u32::from).collect();
            let len = data.len();
            let mut it = Interpreter::new(
                SLOTS,
                vec![Array::Word(data), Array::Word(vec![0; blocks])],
            );
            it.set_slot(LEN, word(len, "data length")?)?;
            it.set_slot(ITERATIONS, Value::Word(*iterations))?;
            it.set_slot(BLOCKS, word(blocks, "block count")?)?;
            it.run(&program())?;
            let Value::Word(digest) = it.slot(ACC)? else {
                return Err(BenchError::Message("interpreter: hash result is not a word".into()));
            };
            (Output::Hash(digest), it.steps())
        }
        WorkloadSpec::RayTrace {
            width,
            height,
            samples,
        } => {
            use programs::raytrace::*;
            let mut it = Interpreter::new(SLOTS, vec![Array::Float(vec![0.0; width * height * 3])]);
            it.set_slot(W, word(*width, "width")?)?;
            it.set_slot(H, word(*height, "height")?)?;
            it.set_slot(SAMPLES, Value::Word(*samples))?;
            it.run(&program())?;
            (Output::F64(floats(it.take_array(OUT)?)?), it.steps())
        }
    };

    debug!(algorithm = %workload.algorithm(), steps, "interpreted run finished");
    Ok(output)
}
