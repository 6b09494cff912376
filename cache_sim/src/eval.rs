//! Scores transpose routines by replaying their memory accesses through the
//! reference direct mapped cache.

use std::{cell::RefCell, fmt, rc::Rc};

use serde::Serialize;
use thiserror::Error;

use crate::{
    geometry::Geometry,
    matrix::{Matrix, TracedMatrix, ELEMENT_SIZE},
    sim::{Simulator, Summary},
    transpose::TransposeFn,
};

/// largest supported dimension, as in the grading driver's static buffers.
pub const MAX_DIM: usize = 256;
/// where `A` lives; `B` follows one full buffer later.
pub const MATRIX_A_BASE: u64 = 0x0010_0000;
pub const MATRIX_REGION: u64 = (MAX_DIM * MAX_DIM) as u64 * ELEMENT_SIZE as u64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EvalError {
    #[error("matrix dimension {m}x{n} exceeds {max}x{max}", max = MAX_DIM)]
    TooLarge { m: usize, n: usize },
    #[error("matrix dimension {m}x{n} is empty")]
    Empty { m: usize, n: usize },
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Clone, Serialize)]
pub struct TransposeReport {
    pub index: usize,
    pub desc: &'static str,
    pub m: usize,
    pub n: usize,
    pub correct: bool,
    #[serde(flatten)]
    pub summary: Summary,
}

impl fmt::Display for TransposeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "func {} ({}): correctness: {} hits:{}, misses:{}, evictions:{}",
            self.index,
            self.desc,
            self.correct as u8,
            self.summary.hits,
            self.summary.misses,
            self.summary.evictions
        )
    }
}

/// runs `func` on an `n x m` source matrix and counts what the reference cache sees.
pub fn evaluate(
    index: usize,
    desc: &'static str,
    func: TransposeFn,
    m: usize,
    n: usize,
) -> Result<TransposeReport> {
    if m > MAX_DIM || n > MAX_DIM {
        return Err(EvalError::TooLarge { m, n });
    }
    if m == 0 || n == 0 {
        return Err(EvalError::Empty { m, n });
    }
    let source = Matrix::from_fn(n, m, |r, c| (r * m + c) as i32);
    let sim = Rc::new(RefCell::new(Simulator::new(
        Geometry::REFERENCE_DIRECT_MAPPED,
    )));
    let mut a = TracedMatrix::new(source.clone(), MATRIX_A_BASE, Rc::clone(&sim));
    let mut b = TracedMatrix::new(
        Matrix::new(m, n),
        MATRIX_A_BASE + MATRIX_REGION,
        Rc::clone(&sim),
    );
    func(&mut a, &mut b);
    let b = b.into_inner();
    let correct = b.is_transpose_of(&source);
    if !correct {
        log::warn!("func {index} ({desc}) did not transpose {m}x{n} correctly");
    }
    let summary = sim.borrow().summary();
    Ok(TransposeReport {
        index,
        desc,
        m,
        n,
        correct,
        summary,
    })
}

/// evaluates every registered transpose on `m x n`.
pub fn evaluate_all(m: usize, n: usize) -> Result<Vec<TransposeReport>> {
    crate::transpose::TRANSPOSE_FUNCTIONS
        .iter()
        .enumerate()
        .map(|(i, e)| evaluate(i, e.desc, e.func, m, n))
        .collect()
}
