// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Host/device contract for binary matmul kernels.
//!
//! A kernel receives two packed operands and five scalars and produces an
//! `M×N` grid of `i32` sums:
//!
//! ```text
//! arg 0  A             [M * chunks] u32   packed RowMajor over (M, K)
//! arg 1  B             [N * chunks] u32   packed ColMajor over (N, K)
//! arg 2  C             [M * N]      i32   output, row-major
//! arg 3  M             ulong
//! arg 4  N             ulong
//! arg 5  K             ulong
//! arg 6  chunks        ulong              ceil(K / 32)
//! arg 7  lastWordMask  uint               valid bits of each row's last word
//! ```
//!
//! Work is one independent item per output cell. Any backend honoring this
//! layout can be swapped in behind [`BinaryMatmulKernel`].

use super::binary::pack::{bits_to_words, last_word_mask};
use super::binary::types::PackedBitMatrix;
use crate::error::{BitGemmError, Result};

/// Buffers and scalars for one kernel invocation.
#[derive(Debug, Clone)]
pub struct KernelLaunch {
    /// Packed A, `m` rows of `chunks` words.
    pub packed_a: PackedBitMatrix,
    /// Packed B (transposed), `n` rows of `chunks` words.
    pub packed_b: PackedBitMatrix,
    /// Rows of A and of the output.
    pub m: usize,
    /// Columns of B and of the output.
    pub n: usize,
    /// Shared dimension.
    pub k: usize,
    /// Words per packed row.
    pub chunks: usize,
    /// Valid bits of the last word in each packed row.
    pub last_word_mask: u32,
}

impl KernelLaunch {
    /// Assemble a launch from packed operands, deriving the scalars.
    ///
    /// # Errors
    ///
    /// Returns [`BitGemmError::DimensionMismatch`] if the operands disagree
    /// on `K`.
    pub fn new(packed_a: PackedBitMatrix, packed_b: PackedBitMatrix) -> Result<Self> {
        if packed_a.cols() != packed_b.cols() {
            return Err(BitGemmError::DimensionMismatch {
                k_a: packed_a.cols(),
                k_b: packed_b.cols(),
            });
        }
        let k = packed_a.cols();
        Ok(Self {
            m: packed_a.rows(),
            n: packed_b.rows(),
            k,
            chunks: bits_to_words(k),
            last_word_mask: last_word_mask(k),
            packed_a,
            packed_b,
        })
    }

    /// Check that buffers and scalars are mutually consistent.
    ///
    /// Backends call this before touching any buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BitGemmError::ShapeMismatch`] or
    /// [`BitGemmError::InvalidConfig`] describing the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        if self.chunks != bits_to_words(self.k) {
            return Err(BitGemmError::InvalidConfig(format!(
                "chunks {} does not cover K={}",
                self.chunks, self.k
            )));
        }
        if self.last_word_mask != last_word_mask(self.k) {
            return Err(BitGemmError::InvalidConfig(format!(
                "last word mask {:#010x} does not match K={}",
                self.last_word_mask, self.k
            )));
        }
        for (name, packed, rows) in [("A", &self.packed_a, self.m), ("B", &self.packed_b, self.n)]
        {
            if packed.rows() != rows || packed.cols() != self.k {
                tracing::debug!(operand = name, "packed operand shape disagrees with scalars");
                return Err(BitGemmError::ShapeMismatch {
                    expected: vec![rows, self.k],
                    actual: vec![packed.rows(), packed.cols()],
                });
            }
        }
        Ok(())
    }

    /// Number of output cells (`m * n`).
    #[must_use]
    pub const fn output_len(&self) -> usize {
        self.m * self.n
    }
}

/// A binary matmul kernel honoring the packed-buffer contract.
pub trait BinaryMatmulKernel {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;

    /// Run the kernel to completion and return the `m * n` row-major output.
    ///
    /// # Errors
    ///
    /// Returns an error if the launch is inconsistent or the backend fails.
    fn launch(&self, launch: &KernelLaunch) -> Result<Vec<i32>>;
}

impl<T: BinaryMatmulKernel + ?Sized> BinaryMatmulKernel for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn launch(&self, launch: &KernelLaunch) -> Result<Vec<i32>> {
        (**self).launch(launch)
    }
}
