// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! XNOR-popcount binary matrix multiplication on the host.
//!
//! ## Algorithm
//!
//! With both operands packed as rows of `K` bits (A as-is, B transposed),
//! each output cell is a dot product of two bit rows:
//!
//! ```text
//! valid(w) = last_word_mask   if w == chunks - 1
//!          = 0xFFFF_FFFF      otherwise
//! agree(w) = popcount(!(a[w] ^ b[w]) & valid(w))
//! dot      = sum_w 2 * agree(w) - popcount(valid(w))
//! ```
//!
//! Equal bits contribute +1 and differing bits -1, which is exactly
//! `sign(a) * sign(b)`. Padding bits are zero in both operands and so
//! always "agree"; without the mask each of them adds a spurious +1.

use crate::error::Result;
use crate::kernels::backend::{BinaryMatmulKernel, KernelLaunch};

/// Dot product of two packed bit rows under `last_word_mask`.
///
/// # Panics
///
/// Panics if the rows have different lengths.
#[must_use]
pub fn xnor_popcount_dot(a_row: &[u32], b_row: &[u32], last_word_mask: u32) -> i32 {
    assert_eq!(a_row.len(), b_row.len(), "rows must have same word count");

    let chunks = a_row.len();
    let mut sum = 0i32;

    for (w, (&a, &b)) in a_row.iter().zip(b_row).enumerate() {
        let valid = if w + 1 == chunks {
            last_word_mask
        } else {
            u32::MAX
        };
        let agree = (!(a ^ b) & valid).count_ones().cast_signed();
        sum += 2 * agree - valid.count_ones().cast_signed();
    }

    sum
}

/// CPU implementation of the packed binary matmul contract.
///
/// Useful for validating the harness itself and as fallback when no
/// accelerator is available.
///
/// # Errors
///
/// Returns an error if the launch fails [`KernelLaunch::validate`].
pub fn binary_matmul_cpu(launch: &KernelLaunch) -> Result<Vec<i32>> {
    launch.validate()?;

    let mut output = vec![0i32; launch.output_len()];

    for (row, out_row) in output.chunks_mut(launch.n).enumerate() {
        let a_row = launch.packed_a.row_words(row);
        for (col, cell) in out_row.iter_mut().enumerate() {
            let b_row = launch.packed_b.row_words(col);
            *cell = xnor_popcount_dot(a_row, b_row, launch.last_word_mask);
        }
    }

    Ok(output)
}

/// [`BinaryMatmulKernel`] backed by [`binary_matmul_cpu`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuPopcountKernel;

impl BinaryMatmulKernel for CpuPopcountKernel {
    fn name(&self) -> &str {
        "cpu-popcount"
    }

    fn launch(&self, launch: &KernelLaunch) -> Result<Vec<i32>> {
        tracing::debug!(
            "CPU popcount matmul: m={}, n={}, k={}, chunks={}",
            launch.m,
            launch.n,
            launch.k,
            launch.chunks
        );
        binary_matmul_cpu(launch)
    }
}
