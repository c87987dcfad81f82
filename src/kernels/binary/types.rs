// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Core types for the 1-bit matrix representation.
//!
//! ## Representation
//!
//! Each entry is a single bit interpreted as a sign:
//!
//! ```text
//! Bit | Value
//! ----+------
//!  1  |  +1
//!  0  |  -1
//! ```
//!
//! Unpacked matrices spend one byte per entry; packed matrices store 32
//! entries per `u32` word, one word block of `ceil(cols / 32)` words per row.

use super::pack::{bits_to_words, last_word_mask};
use crate::error::{BitGemmError, Result};

/// Arithmetic value of a bit entry: `1 → +1`, `0 → -1`.
#[inline]
#[must_use]
pub const fn bit_sign(bit: u8) -> i32 {
    if bit != 0 {
        1
    } else {
        -1
    }
}

/// Memory layout of the source bits handed to the packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitLayout {
    /// Entry `(i, j)` lives at flattened index `i * dim1 + j`.
    #[default]
    RowMajor,
    /// Entry `(i, j)` lives at flattened index `j * dim0 + i`.
    ///
    /// A row-major `K×N` matrix read as `ColMajor` over `(N, K)` packs its
    /// columns as rows, i.e. the packer transposes on the fly.
    ColMajor,
}

/// Validate `rows × cols` and return the element count.
pub(crate) fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    if rows == 0 || cols == 0 {
        return Err(BitGemmError::InvalidDimensions { rows, cols });
    }
    rows.checked_mul(cols)
        .ok_or(BitGemmError::InvalidDimensions { rows, cols })
}

/// A rectangular matrix of 0/1 entries, one byte each, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedBitMatrix {
    bits: Vec<u8>,
    rows: usize,
    cols: usize,
}

impl UnpackedBitMatrix {
    /// Wrap row-major `bits` as a `rows × cols` matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero, `bits.len() != rows * cols`,
    /// or any entry is not 0 or 1.
    pub fn new(bits: Vec<u8>, rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        if bits.len() != len {
            return Err(BitGemmError::ShapeMismatch {
                expected: vec![rows, cols],
                actual: vec![bits.len()],
            });
        }
        if let Some((index, &value)) = bits.iter().enumerate().find(|(_, &b)| b > 1) {
            return Err(BitGemmError::InvalidBit { index, value });
        }
        Ok(Self { bits, rows, cols })
    }

    /// Build a matrix from a slice of equally long rows.
    ///
    /// # Errors
    ///
    /// Returns an error if rows are ragged, empty, or hold values other than 0/1.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut bits = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(BitGemmError::ShapeMismatch {
                    expected: vec![cols],
                    actual: vec![row.len()],
                });
            }
            bits.extend_from_slice(row);
        }
        Self::new(bits, rows.len(), cols)
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[must_use]
    pub const fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major entries.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// Consume the matrix, returning its row-major entries.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bits
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.bits[row * self.cols + col]
    }

    /// Arithmetic ±1 value at `(row, col)`.
    #[must_use]
    pub fn sign(&self, row: usize, col: usize) -> i32 {
        bit_sign(self.get(row, col))
    }

    /// Row `row` as a slice.
    #[must_use]
    pub fn row(&self, row: usize) -> &[u8] {
        &self.bits[row * self.cols..(row + 1) * self.cols]
    }

    /// Transposed copy.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut bits = vec![0u8; self.bits.len()];
        for r in 0..self.rows {
            for c in 0..self.cols {
                bits[c * self.rows + r] = self.bits[r * self.cols + c];
            }
        }
        Self {
            bits,
            rows: self.cols,
            cols: self.rows,
        }
    }
}

/// A bit matrix packed into 32-bit words, `chunks` words per row.
///
/// Bit `j % 32` of word `row * chunks + j / 32` holds column `j`. Bits past
/// `cols` in the last word of each row are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBitMatrix {
    words: Vec<u32>,
    rows: usize,
    cols: usize,
    chunks: usize,
}

impl PackedBitMatrix {
    /// Wrap packed `words` for a `rows × cols` bit matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero, the word count is not
    /// `rows * bits_to_words(cols)`, or a row has bits set past `cols`.
    pub fn new(words: Vec<u32>, rows: usize, cols: usize) -> Result<Self> {
        checked_len(rows, cols)?;
        let chunks = bits_to_words(cols);
        let expected = rows * chunks;
        if words.len() != expected {
            return Err(BitGemmError::ShapeMismatch {
                expected: vec![rows, chunks],
                actual: vec![words.len()],
            });
        }
        let padding = !last_word_mask(cols);
        if let Some((row, last)) = words
            .chunks_exact(chunks)
            .map(|row| row[chunks - 1])
            .enumerate()
            .find(|(_, last)| last & padding != 0)
        {
            return Err(BitGemmError::NonZeroPadding {
                row,
                bits: last & padding,
            });
        }
        Ok(Self {
            words,
            rows,
            cols,
            chunks,
        })
    }

    /// Zeroed matrix; used by the packer before OR-ing bits in.
    pub(crate) fn zeroed(rows: usize, cols: usize) -> Self {
        let chunks = bits_to_words(cols);
        Self {
            words: vec![0u32; rows * chunks],
            rows,
            cols,
            chunks,
        }
    }

    /// Number of packed rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of logical bits per row.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Words per row (`ceil(cols / 32)`).
    #[must_use]
    pub const fn chunks(&self) -> usize {
        self.chunks
    }

    /// All words, row blocks back to back.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Word block of `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows`.
    #[must_use]
    pub fn row_words(&self, row: usize) -> &[u32] {
        assert!(row < self.rows, "row out of bounds");
        &self.words[row * self.chunks..(row + 1) * self.chunks]
    }

    /// Bit at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn bit(&self, row: usize, col: usize) -> u8 {
        assert!(col < self.cols, "column out of bounds");
        let word = self.row_words(row)[col / 32];
        u8::from(word & (1u32 << (col % 32)) != 0)
    }

    /// Size of the word buffer in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u32>()
    }
}

/// A matrix of `i32` values, row-major. Holds ground truth and kernel output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerMatrix {
    data: Vec<i32>,
    rows: usize,
    cols: usize,
}

impl IntegerMatrix {
    /// Wrap row-major `data` as a `rows × cols` matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or `data.len() != rows * cols`.
    pub fn new(data: Vec<i32>, rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        if data.len() != len {
            return Err(BitGemmError::ShapeMismatch {
                expected: vec![rows, cols],
                actual: vec![data.len()],
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[must_use]
    pub const fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major values.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    /// Consume the matrix, returning its row-major values.
    #[must_use]
    pub fn into_vec(self) -> Vec<i32> {
        self.data
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col]
    }
}
