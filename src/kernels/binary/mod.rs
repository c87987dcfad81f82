// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Packed 1-bit matrix operations.
//!
//! Matrices hold one bit per entry, read arithmetically as ±1
//! (`1 → +1`, `0 → -1`), and are packed 32 entries per `u32` word.
//!
//! ## Mathematical Foundation
//!
//! For two packed rows `a`, `b` of `K` bits:
//!
//! ```text
//! dot(a, b) = sum_k sign(a_k) * sign(b_k)
//!           = 2 * popcount(!(a ^ b) & valid) - K
//! ```
//!
//! `valid` excludes the zero padding bits in the last word of each row;
//! see [`pack::last_word_mask`].
//!
//! ## Module Structure
//!
//! - [`types`] - Unpacked, packed and integer matrix types
//! - [`pack`] - Row/column-major packing, word count and mask helpers
//! - [`reference`] - Ground-truth product on unpacked inputs
//! - [`matmul`] - XNOR-popcount kernel on packed inputs
//!
//! ## Usage
//!
//! ```rust
//! use bitgemm_rs::kernels::binary::{ground_truth_product, pack, BitLayout, UnpackedBitMatrix};
//!
//! let a = UnpackedBitMatrix::from_rows(&[[1u8, 0, 1], [0, 1, 1]])?;
//! let b = UnpackedBitMatrix::from_rows(&[[1u8, 1], [0, 1], [1, 0]])?;
//!
//! let truth = ground_truth_product(&a, &b)?;
//! assert_eq!(truth.as_slice(), &[3, -1, -1, -1]);
//!
//! // A packs as-is, B packs transposed so both are rows of K bits.
//! let packed_a = pack(&a, 2, 3, BitLayout::RowMajor)?;
//! let packed_b = pack(&b, 2, 3, BitLayout::ColMajor)?;
//! assert_eq!(packed_a.words(), &[0b101, 0b110]);
//! assert_eq!(packed_b.words(), &[0b101, 0b011]);
//! # Ok::<(), bitgemm_rs::BitGemmError>(())
//! ```

pub mod matmul;
pub mod pack;
pub mod reference;
pub mod types;

pub use matmul::{binary_matmul_cpu, xnor_popcount_dot, CpuPopcountKernel};
pub use pack::{bits_to_words, last_word_mask, pack, pack_bits, unpack, WORD_BITS};
pub use reference::{ground_truth, ground_truth_product};
pub use types::{bit_sign, BitLayout, IntegerMatrix, PackedBitMatrix, UnpackedBitMatrix};
