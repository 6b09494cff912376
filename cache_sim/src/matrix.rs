use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    sim::Simulator,
    trace::{Access, Operation},
};

/// bytes per element, matching a C `int`.
pub const ELEMENT_SIZE: u32 = 4;

/// element access used by the transpose routines.
///
/// `read` takes `&mut self` so that an instrumented matrix can observe it.
pub trait MatrixAccess {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    fn read(&mut self, row: usize, col: usize) -> i32;
    fn write(&mut self, row: usize, col: usize, v: i32);
}

/// row-major `rows x cols` matrix.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<i32>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> i32) -> Self {
        let data = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| f(r, c))
            .collect();
        Self { rows, cols, data }
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[self.index(row, col)]
    }
    pub fn set(&mut self, row: usize, col: usize, v: i32) {
        let i = self.index(row, col);
        self.data[i] = v;
    }
    /// whether `self[j][i] == a[i][j]` for every element of `a`.
    pub fn is_transpose_of(&self, a: &Matrix) -> bool {
        self.rows == a.cols
            && self.cols == a.rows
            && (0..a.rows).all(|i| (0..a.cols).all(|j| a.get(i, j) == self.get(j, i)))
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix {}x{} ", self.rows, self.cols)?;
        f.debug_list()
            .entries(self.data.chunks(self.cols.max(1)))
            .finish()
    }
}

impl MatrixAccess for Matrix {
    fn rows(&self) -> usize {
        self.rows
    }
    fn cols(&self) -> usize {
        self.cols
    }
    fn read(&mut self, row: usize, col: usize) -> i32 {
        self.get(row, col)
    }
    fn write(&mut self, row: usize, col: usize, v: i32) {
        self.set(row, col, v)
    }
}

/// a [`Matrix`] laid out at `base` whose every element access is fed to a
/// shared [`Simulator`] as a load or store.
pub struct TracedMatrix {
    inner: Matrix,
    base: u64,
    sim: Rc<RefCell<Simulator>>,
}

impl TracedMatrix {
    pub fn new(inner: Matrix, base: u64, sim: Rc<RefCell<Simulator>>) -> Self {
        Self { inner, base, sim }
    }
    pub fn into_inner(self) -> Matrix {
        self.inner
    }
    fn addr(&self, row: usize, col: usize) -> u64 {
        self.base + (row * self.inner.cols + col) as u64 * ELEMENT_SIZE as u64
    }
    fn touch(&self, op: Operation, row: usize, col: usize) {
        let access = Access::new(op, self.addr(row, col), ELEMENT_SIZE);
        self.sim.borrow_mut().step(&access);
    }
}

impl MatrixAccess for TracedMatrix {
    fn rows(&self) -> usize {
        self.inner.rows
    }
    fn cols(&self) -> usize {
        self.inner.cols
    }
    fn read(&mut self, row: usize, col: usize) -> i32 {
        self.touch(Operation::Load, row, col);
        self.inner.get(row, col)
    }
    fn write(&mut self, row: usize, col: usize, v: i32) {
        self.touch(Operation::Store, row, col);
        self.inner.set(row, col, v)
    }
}
