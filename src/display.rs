// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Text dumps of bit and integer matrices.

use std::fmt::Write;

use crate::kernels::binary::types::{IntegerMatrix, UnpackedBitMatrix};

/// `name (RxC) bits:` followed by one line of space-separated bits per row.
#[must_use]
pub fn format_bit_matrix(name: &str, matrix: &UnpackedBitMatrix) -> String {
    let mut out = format!("{name} ({}x{}) bits:\n", matrix.rows(), matrix.cols());
    for r in 0..matrix.rows() {
        for &bit in matrix.row(r) {
            let _ = write!(out, "{bit} ");
        }
        out.push('\n');
    }
    out
}

/// Values right-aligned in width 4, then the same matrix thresholded at zero
/// (`v >= 0 → 1`, else `0`).
#[must_use]
pub fn format_int_matrix(name: &str, matrix: &IntegerMatrix) -> String {
    let (rows, cols) = matrix.dims();
    let mut out = format!("{name} ({rows}x{cols}):\n");
    for r in 0..rows {
        for c in 0..cols {
            let _ = write!(out, "{:>4}", matrix.get(r, c));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{name} ({rows}x{cols}) bits:");
    for r in 0..rows {
        for c in 0..cols {
            let bit = u8::from(matrix.get(r, c) >= 0);
            let _ = write!(out, "{bit} ");
        }
        out.push('\n');
    }
    out
}
