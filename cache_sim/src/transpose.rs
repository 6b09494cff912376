//! Blocked matrix transposes tuned for a 1KB direct mapped cache with 32-byte
//! blocks.
//!
//! Every routine computes `B = A^T` where `A` is `N x M` (`N` rows, `M`
//! columns) and `B` is `M x N`. Only the number of distinct cache blocks alive
//! at once differs between them.

use crate::matrix::{Matrix, MatrixAccess};

pub type TransposeFn = fn(&mut dyn MatrixAccess, &mut dyn MatrixAccess);

pub struct TransposeEntry {
    pub desc: &'static str,
    pub func: TransposeFn,
}

/// every transpose the evaluator knows about. the first one is graded.
pub static TRANSPOSE_FUNCTIONS: [TransposeEntry; 3] = [
    TransposeEntry {
        desc: "Transpose submission",
        func: transpose_submit,
    },
    TransposeEntry {
        desc: "4x4 blocked transpose",
        func: transpose_blocked_4x4,
    },
    TransposeEntry {
        desc: "Simple row-wise scan transpose",
        func: transpose_naive,
    },
];

/// `(M, N)`: columns and rows of `a`.
fn dims(a: &dyn MatrixAccess, b: &dyn MatrixAccess) -> (usize, usize) {
    debug_assert_eq!((b.rows(), b.cols()), (a.cols(), a.rows()));
    (a.cols(), a.rows())
}

fn read_row<const W: usize>(m: &mut dyn MatrixAccess, row: usize, col: usize) -> [i32; W] {
    std::array::from_fn(|k| m.read(row, col + k))
}

fn write_row<const W: usize>(m: &mut dyn MatrixAccess, row: usize, col: usize, v: [i32; W]) {
    for (k, v) in v.into_iter().enumerate() {
        m.write(row, col + k, v);
    }
}

fn write_col<const W: usize>(m: &mut dyn MatrixAccess, row: usize, col: usize, v: [i32; W]) {
    for (k, v) in v.into_iter().enumerate() {
        m.write(row + k, col, v);
    }
}

/// picks the routine tuned for `(M, N)`; unknown shapes get the plain scan.
pub fn transpose_submit(a: &mut dyn MatrixAccess, b: &mut dyn MatrixAccess) {
    match dims(a, b) {
        (32, 32) => transpose_32x32(a, b),
        (64, 64) => transpose_64x64(a, b),
        (61, 67) => transpose_61x67(a, b),
        (m, n) => {
            log::debug!("no tuned transpose for {m}x{n}, scanning row by row");
            transpose_naive(a, b)
        }
    }
}

/// 8x8 tiles. a diagonal tile maps onto the same sets in `a` and `b`, so each
/// of its rows is read out completely before anything is written back.
///
/// shapes that don't divide into 8x8 tiles are scanned row by row.
pub fn transpose_32x32(a: &mut dyn MatrixAccess, b: &mut dyn MatrixAccess) {
    let (m, n) = dims(a, b);
    if m % 8 != 0 || n % 8 != 0 {
        return transpose_naive(a, b);
    }
    for i in (0..n).step_by(8) {
        for j in (0..m).step_by(8) {
            if i == j {
                for x in i..i + 8 {
                    let row: [i32; 8] = read_row(a, x, j);
                    write_col(b, j, x, row);
                }
            } else {
                for x in i..i + 8 {
                    for y in j..j + 8 {
                        let tmp = a.read(x, y);
                        b.write(y, x, tmp);
                    }
                }
            }
        }
    }
}

/// 8x8 tiles handled as four 4x4 quadrants.
///
/// with 64 columns, rows four apart share a set, so a tile only ever has four
/// rows of `a` and four rows of `b` in flight. the top-right quadrant of `a` is
/// parked in the top-right quadrant of `b` and moved down while the
/// bottom-left quadrant is copied in.
///
/// shapes that don't divide into 8x8 tiles are scanned row by row.
pub fn transpose_64x64(a: &mut dyn MatrixAccess, b: &mut dyn MatrixAccess) {
    let (m, n) = dims(a, b);
    if m % 8 != 0 || n % 8 != 0 {
        return transpose_naive(a, b);
    }
    for i in (0..n).step_by(8) {
        for j in (0..m).step_by(8) {
            for x in i..i + 4 {
                let left: [i32; 4] = read_row(a, x, j);
                let right: [i32; 4] = read_row(a, x, j + 4);
                write_col(b, j, x, left);
                write_col(b, j, x + 4, right);
            }
            for y in j..j + 4 {
                let bottom_left: [i32; 4] = std::array::from_fn(|k| a.read(i + 4 + k, y));
                let parked: [i32; 4] = read_row(b, y, i + 4);
                write_row(b, y, i + 4, bottom_left);
                write_row(b, y + 4, i, parked);
            }
            for z in (i + 4..i + 8).step_by(2) {
                let upper: [i32; 4] = read_row(a, z, j + 4);
                let lower: [i32; 4] = read_row(a, z + 1, j + 4);
                write_col(b, j + 4, z, upper);
                write_col(b, j + 4, z + 1, lower);
            }
        }
    }
}

/// 17x17 tiles clamped at the ragged edges.
pub fn transpose_61x67(a: &mut dyn MatrixAccess, b: &mut dyn MatrixAccess) {
    const TILE: usize = 17;
    let (m, n) = dims(a, b);
    for i in (0..n).step_by(TILE) {
        for j in (0..m).step_by(TILE) {
            for x in i..n.min(i + TILE) {
                for y in j..m.min(j + TILE) {
                    let tmp = a.read(x, y);
                    b.write(y, x, tmp);
                }
            }
        }
    }
}

/// 4x4 tiles with the diagonal batched like [`transpose_32x32`].
/// shapes that don't divide into 4x4 tiles are scanned row by row.
pub fn transpose_blocked_4x4(a: &mut dyn MatrixAccess, b: &mut dyn MatrixAccess) {
    let (m, n) = dims(a, b);
    if m % 4 != 0 || n % 4 != 0 {
        return transpose_naive(a, b);
    }
    for i in (0..n).step_by(4) {
        for j in (0..m).step_by(4) {
            for x in i..i + 4 {
                if i == j {
                    let row: [i32; 4] = read_row(a, x, j);
                    write_col(b, j, x, row);
                } else {
                    for y in j..j + 4 {
                        let tmp = a.read(x, y);
                        b.write(y, x, tmp);
                    }
                }
            }
        }
    }
}

/// baseline, not blocked at all.
pub fn transpose_naive(a: &mut dyn MatrixAccess, b: &mut dyn MatrixAccess) {
    let (m, n) = dims(a, b);
    for i in 0..n {
        for j in 0..m {
            let tmp = a.read(i, j);
            b.write(j, i, tmp);
        }
    }
}

pub fn is_transpose(a: &Matrix, b: &Matrix) -> bool {
    b.is_transpose_of(a)
}
