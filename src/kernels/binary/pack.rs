// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Packing of 0/1 byte matrices into 32-bit words.
//!
//! ## Word Layout
//!
//! For a packed row of `dim1` bits:
//!
//! ```text
//! chunks        = ceil(dim1 / 32) = (dim1 + 31) >> 5
//! word(i, j)    = out[i * chunks + j / 32]
//! bit(i, j)     = (word(i, j) >> (j % 32)) & 1
//! ```
//!
//! Words are zero-initialized, so when `dim1 % 32 != 0` the high bits of the
//! last word in each row stay 0. Under the ±1 interpretation those padding
//! bits read as -1, and a consumer must mask them out with
//! [`last_word_mask`] before summing.

use super::types::{checked_len, BitLayout, PackedBitMatrix, UnpackedBitMatrix};
use crate::error::{BitGemmError, Result};

/// Bits per packed word.
pub const WORD_BITS: usize = 32;

/// Number of `u32` words needed to hold `bits` bits, rounded up.
#[inline]
#[must_use]
pub const fn bits_to_words(bits: usize) -> usize {
    (bits + 31) >> 5
}

/// Mask selecting the valid bits in the last word of a `k`-bit row.
///
/// All ones when `k` is a multiple of 32, otherwise the low `k % 32` bits.
#[inline]
#[must_use]
pub const fn last_word_mask(k: usize) -> u32 {
    let rem = k % WORD_BITS;
    if rem == 0 {
        u32::MAX
    } else {
        (1u32 << rem) - 1
    }
}

/// Pack a flat 0/1 slice into `dim0` rows of `dim1` bits.
///
/// # Arguments
///
/// * `bits` - `dim0 * dim1` entries, each 0 or 1
/// * `dim0` - Number of packed rows
/// * `dim1` - Bits per packed row
/// * `layout` - How `bits` is laid out (see [`BitLayout`])
///
/// # Errors
///
/// Returns an error if a dimension is zero, `bits.len() != dim0 * dim1`, or
/// an entry is not 0 or 1.
pub fn pack_bits(
    bits: &[u8],
    dim0: usize,
    dim1: usize,
    layout: BitLayout,
) -> Result<PackedBitMatrix> {
    let len = checked_len(dim0, dim1)?;
    if bits.len() != len {
        return Err(BitGemmError::ShapeMismatch {
            expected: vec![dim0, dim1],
            actual: vec![bits.len()],
        });
    }

    let mut packed = PackedBitMatrix::zeroed(dim0, dim1);
    let chunks = packed.chunks();

    for (i, row) in packed.words_mut().chunks_mut(chunks).enumerate() {
        for j in 0..dim1 {
            let index = match layout {
                BitLayout::RowMajor => i * dim1 + j,
                BitLayout::ColMajor => j * dim0 + i,
            };
            let value = bits[index];
            if value > 1 {
                return Err(BitGemmError::InvalidBit { index, value });
            }
            row[j / WORD_BITS] |= u32::from(value) << (j % WORD_BITS);
        }
    }

    tracing::trace!(dim0, dim1, chunks, ?layout, "packed bit matrix");
    Ok(packed)
}

/// Pack `matrix` as `dim0` rows of `dim1` bits.
///
/// Only the element count of `matrix` has to match `dim0 * dim1`; `layout`
/// decides how its storage is read. Packing a row-major `K×N` matrix with
/// `(N, K, ColMajor)` yields its transpose.
///
/// # Errors
///
/// See [`pack_bits`].
pub fn pack(
    matrix: &UnpackedBitMatrix,
    dim0: usize,
    dim1: usize,
    layout: BitLayout,
) -> Result<PackedBitMatrix> {
    pack_bits(matrix.as_slice(), dim0, dim1, layout)
}

/// Invert [`pack`], restoring the source storage order.
///
/// For `RowMajor` the result is `rows × cols`; for `ColMajor` it is
/// `cols × rows` (the shape the source had before packing). Padding bits
/// are ignored.
///
/// # Errors
///
/// Only fails if `packed` has zero dimensions, which [`PackedBitMatrix::new`]
/// already rules out.
pub fn unpack(packed: &PackedBitMatrix, layout: BitLayout) -> Result<UnpackedBitMatrix> {
    let (dim0, dim1) = (packed.rows(), packed.cols());
    let mut bits = vec![0u8; checked_len(dim0, dim1)?];

    for i in 0..dim0 {
        let row = packed.row_words(i);
        for j in 0..dim1 {
            let bit = ((row[j / WORD_BITS] >> (j % WORD_BITS)) & 1) as u8;
            let index = match layout {
                BitLayout::RowMajor => i * dim1 + j,
                BitLayout::ColMajor => j * dim0 + i,
            };
            bits[index] = bit;
        }
    }

    match layout {
        BitLayout::RowMajor => UnpackedBitMatrix::new(bits, dim0, dim1),
        BitLayout::ColMajor => UnpackedBitMatrix::new(bits, dim1, dim0),
    }
}
