// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Ground-truth ±1 matrix product.
//!
//! ```text
//! C[r, c] = sum_k sign(A[r, k]) * sign(B[k, c]),   sign(1) = +1, sign(0) = -1
//! ```
//!
//! Both operands are taken in plain row-major form. This is the oracle the
//! kernels are checked against, so it works on the unpacked bytes and does
//! not share any code path with the packed representation.

use super::types::{bit_sign, IntegerMatrix, UnpackedBitMatrix};
use crate::error::{BitGemmError, Result};

/// Compute the reference product of `a` (`m×k`) and `b` (`k×n`).
///
/// # Errors
///
/// Returns [`BitGemmError::ShapeMismatch`] if `a` is not `m×k` or `b` is not
/// `k×n`.
pub fn ground_truth(
    m: usize,
    n: usize,
    k: usize,
    a: &UnpackedBitMatrix,
    b: &UnpackedBitMatrix,
) -> Result<IntegerMatrix> {
    if a.dims() != (m, k) {
        return Err(BitGemmError::ShapeMismatch {
            expected: vec![m, k],
            actual: vec![a.rows(), a.cols()],
        });
    }
    if b.dims() != (k, n) {
        return Err(BitGemmError::ShapeMismatch {
            expected: vec![k, n],
            actual: vec![b.rows(), b.cols()],
        });
    }

    let a_bits = a.as_slice();
    let b_bits = b.as_slice();
    let mut output = vec![0i32; m * n];

    for r in 0..m {
        for c in 0..n {
            let mut sum = 0i32;
            for kk in 0..k {
                sum += bit_sign(a_bits[r * k + kk]) * bit_sign(b_bits[kk * n + c]);
            }
            output[r * n + c] = sum;
        }
    }

    IntegerMatrix::new(output, m, n)
}

/// Reference product taking dimensions from the operands.
///
/// # Errors
///
/// Returns [`BitGemmError::DimensionMismatch`] if `a.cols() != b.rows()`.
pub fn ground_truth_product(a: &UnpackedBitMatrix, b: &UnpackedBitMatrix) -> Result<IntegerMatrix> {
    if a.cols() != b.rows() {
        return Err(BitGemmError::DimensionMismatch {
            k_a: a.cols(),
            k_b: b.rows(),
        });
    }
    ground_truth(a.rows(), b.cols(), a.cols(), a, b)
}
