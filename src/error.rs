// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Error types for bitgemm-rs.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for bitgemm-rs operations.
pub type Result<T> = std::result::Result<T, BitGemmError>;

/// Errors that can occur in bitgemm-rs operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BitGemmError {
    /// Shared dimension of A and B disagrees.
    #[error("Incompatible matrix dimensions. K_A={k_a}, K_B={k_b}")]
    DimensionMismatch {
        /// Column count of A
        k_a: usize,
        /// Row count of B
        k_b: usize,
    },

    /// Shape mismatch.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        actual: Vec<usize>,
    },

    /// A matrix dimension was zero or the element count overflowed.
    #[error("invalid dimensions {rows}x{cols}")]
    InvalidDimensions {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// An unpacked entry was neither 0 nor 1.
    #[error("invalid bit value {value} at index {index}")]
    InvalidBit {
        /// Flattened index of the entry
        index: usize,
        /// Offending value
        value: u8,
    },

    /// A packed row has bits set past its logical width.
    #[error("nonzero padding bits {bits:#010x} in packed row {row}")]
    NonZeroPadding {
        /// Packed row
        row: usize,
        /// Offending bits of the row's last word
        bits: u32,
    },

    /// Malformed persisted matrix record.
    #[error("malformed matrix file {path}: {reason}")]
    Format {
        /// File being read
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Kernel source failed to build for the target device.
    #[error("kernel build failed: {0}")]
    KernelBuild(String),

    /// Kernel enqueue, execution or readback failed.
    #[error("kernel error: {0}")]
    Kernel(String),

    /// Device not available.
    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    /// Out of memory.
    #[error("out of memory: required {required} bytes, available {available} bytes")]
    OutOfMemory {
        /// Required memory in bytes
        required: usize,
        /// Available memory in bytes
        available: usize,
    },

    /// Kernel output differs from the reference.
    #[error(
        "The output does not match with the ground truth! \
         {mismatches} mismatching cells, first at ({row}, {col}): expected {expected}, got {actual}"
    )]
    VerificationFailed {
        /// Number of differing cells
        mismatches: usize,
        /// Row of the first differing cell
        row: usize,
        /// Column of the first differing cell
        col: usize,
        /// Reference value at that cell
        expected: i32,
        /// Kernel value at that cell
        actual: i32,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Candle error.
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

impl BitGemmError {
    /// Build a [`BitGemmError::Format`] for `path`.
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a precondition violation detected before any
    /// kernel work was attempted.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::ShapeMismatch { .. }
                | Self::InvalidDimensions { .. }
                | Self::InvalidBit { .. }
                | Self::NonZeroPadding { .. }
                | Self::Format { .. }
                | Self::InvalidConfig(_)
                | Self::Io(_)
        )
    }

    /// Exit status for the command-line tools: `2` when the inputs were
    /// rejected, `1` for kernel failures and mismatches.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.is_precondition() {
            2
        } else {
            1
        }
    }
}
