// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Binary matmul through Candle tensors.
//!
//! Expands both packed operands back to ±1 `f32` matrices on a Candle
//! [`Device`] and multiplies them with the backend's GEMM. Every partial sum
//! is an integer of magnitude at most `K`, so the `f32` result is exact for
//! `K < 2^24`.
//!
//! The expansion reads only bits covered by `chunks` and `last_word_mask`,
//! so padding never reaches the product.

use candle_core::{Device, Tensor};

use crate::error::{BitGemmError, Result};
use crate::kernels::backend::{BinaryMatmulKernel, KernelLaunch};
use crate::kernels::binary::types::PackedBitMatrix;

/// Largest `K` for which `f32` accumulation stays exact.
pub const MAX_EXACT_K: usize = 1 << 24;

/// [`BinaryMatmulKernel`] running on a Candle device.
#[derive(Debug, Clone)]
pub struct CandleKernel {
    device: Device,
}

impl CandleKernel {
    /// Kernel on an explicit device.
    #[must_use]
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    /// Kernel on CUDA device 0 when available, CPU otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if CUDA is compiled in but device creation fails.
    pub fn cuda_if_available() -> Result<Self> {
        Ok(Self::new(Device::cuda_if_available(0)?))
    }

    /// The device this kernel runs on.
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }
}

/// Expand a packed operand into row-major ±1 values, honoring the mask.
fn expand_signs(packed: &PackedBitMatrix, chunks: usize, last_word_mask: u32) -> Vec<f32> {
    let k = packed.cols();
    let mut values = Vec::with_capacity(packed.rows() * k);

    for row in 0..packed.rows() {
        let words = packed.row_words(row);
        for col in 0..k {
            let w = col / 32;
            let mut word = words[w];
            if w + 1 == chunks {
                word &= last_word_mask;
            }
            let bit = (word >> (col % 32)) & 1;
            values.push(if bit == 1 { 1.0 } else { -1.0 });
        }
    }

    values
}

impl BinaryMatmulKernel for CandleKernel {
    fn name(&self) -> &str {
        if self.device.is_cuda() {
            "candle-cuda"
        } else {
            "candle-cpu"
        }
    }

    fn launch(&self, launch: &KernelLaunch) -> Result<Vec<i32>> {
        launch.validate()?;
        if launch.k >= MAX_EXACT_K {
            return Err(BitGemmError::InvalidConfig(format!(
                "K={} exceeds exact f32 range of the candle backend",
                launch.k
            )));
        }

        tracing::debug!(
            "Candle binary matmul on {:?}: m={}, n={}, k={}",
            self.device,
            launch.m,
            launch.n,
            launch.k
        );

        let a = expand_signs(&launch.packed_a, launch.chunks, launch.last_word_mask);
        let b = expand_signs(&launch.packed_b, launch.chunks, launch.last_word_mask);

        let a = Tensor::from_vec(a, (launch.m, launch.k), &self.device)?;
        let b = Tensor::from_vec(b, (launch.n, launch.k), &self.device)?;

        // [m, k] x [k, n]
        let product = a.matmul(&b.t()?.contiguous()?)?;
        let values: Vec<f32> = product.flatten_all()?.to_vec1()?;

        // Values are exact integers in [-K, K]
        #[allow(clippy::cast_possible_truncation)]
        let output = values.into_iter().map(|v| v.round() as i32).collect();
        Ok(output)
    }
}
