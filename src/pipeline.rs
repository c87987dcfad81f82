// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Verification of a binary matmul kernel against a stored test case.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. Check that A's column count equals B's row count and that the ground
//!    truth is `M×N`. Nothing is packed or launched if this fails.
//! 2. Derive `chunks` and the last-word mask from `K`.
//! 3. Pack A row-major over `(M, K)` and B column-major over `(N, K)`.
//! 4. Launch the kernel and wait for its `M×N` output.
//! 5. Compare the output with the ground truth cell by cell.
//!
//! B is stored as a row-major `K×N` matrix; only the packing step reads it
//! as column-major, which yields one packed row of `K` bits per output
//! column.

use std::time::{Duration, Instant};

use crate::config::HarnessConfig;
use crate::error::{BitGemmError, Result};
use crate::kernels::backend::{BinaryMatmulKernel, KernelLaunch};
use crate::kernels::binary::pack::pack;
use crate::kernels::binary::types::{BitLayout, IntegerMatrix};
use crate::memory::{format_bytes, LaunchFootprint};
use crate::test_case::TestCase;

/// Summary of a successful verification.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    /// Rows of A and of the output.
    pub m: usize,
    /// Columns of B and of the output.
    pub n: usize,
    /// Shared dimension.
    pub k: usize,
    /// Words per packed row.
    pub chunks: usize,
    /// Mask applied to the last word of each packed row.
    pub last_word_mask: u32,
    /// Name of the kernel that ran.
    pub kernel: String,
    /// Wall time of the kernel launch including readback.
    pub elapsed: Duration,
}

/// Output of a kernel run that has not been compared yet.
#[derive(Debug, Clone)]
pub struct KernelRun {
    /// Scalars and packed operands the kernel received.
    pub launch: KernelLaunch,
    /// Kernel output, `M×N`.
    pub output: IntegerMatrix,
    /// Wall time of the kernel launch including readback.
    pub elapsed: Duration,
}

/// Runs test cases through a kernel and checks the result.
#[derive(Debug, Clone)]
pub struct Verifier {
    mismatch_report_limit: usize,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(&HarnessConfig::default())
    }
}

impl Verifier {
    /// Verifier using the reporting settings of `config`.
    #[must_use]
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            mismatch_report_limit: config.mismatch_report_limit,
        }
    }

    /// Validate shapes and pack both operands.
    ///
    /// # Errors
    ///
    /// Returns [`BitGemmError::DimensionMismatch`] if A's columns differ from
    /// B's rows, or [`BitGemmError::ShapeMismatch`] if the ground truth is not
    /// `M×N`.
    pub fn prepare_launch(&self, case: &TestCase) -> Result<KernelLaunch> {
        let (m, k_a) = case.a().dims();
        let (k_b, n) = case.b().dims();
        if k_a != k_b {
            return Err(BitGemmError::DimensionMismatch { k_a, k_b });
        }
        let truth_dims = case.ground_truth().dims();
        if truth_dims != (m, n) {
            return Err(BitGemmError::ShapeMismatch {
                expected: vec![m, n],
                actual: vec![truth_dims.0, truth_dims.1],
            });
        }
        let k = k_a;

        let packed_a = pack(case.a(), m, k, BitLayout::RowMajor)?;
        let packed_b = pack(case.b(), n, k, BitLayout::ColMajor)?;
        let launch = KernelLaunch::new(packed_a, packed_b)?;

        tracing::debug!(
            "packed operands: m={}, n={}, k={}, chunks={}, mask={:#010x}, buffers={}",
            launch.m,
            launch.n,
            launch.k,
            launch.chunks,
            launch.last_word_mask,
            format_bytes(LaunchFootprint::of(&launch).total())
        );
        Ok(launch)
    }

    /// Prepare the launch and run `kernel` without comparing its output.
    ///
    /// # Errors
    ///
    /// Returns precondition errors from [`Self::prepare_launch`] and any
    /// error from [`Self::run_prepared`].
    pub fn run<K: BinaryMatmulKernel + ?Sized>(
        &self,
        case: &TestCase,
        kernel: &K,
    ) -> Result<KernelRun> {
        let launch = self.prepare_launch(case)?;
        self.run_prepared(launch, kernel)
    }

    /// Run `kernel` on an already packed launch.
    ///
    /// # Errors
    ///
    /// Returns any kernel error, or [`BitGemmError::ShapeMismatch`] if the
    /// kernel returned the wrong number of cells.
    pub fn run_prepared<K: BinaryMatmulKernel + ?Sized>(
        &self,
        launch: KernelLaunch,
        kernel: &K,
    ) -> Result<KernelRun> {
        tracing::info!(
            "launching kernel '{}' over {}x{} work items",
            kernel.name(),
            launch.m,
            launch.n
        );
        let start = Instant::now();
        let values = kernel.launch(&launch)?;
        let elapsed = start.elapsed();

        if values.len() != launch.output_len() {
            return Err(BitGemmError::ShapeMismatch {
                expected: vec![launch.output_len()],
                actual: vec![values.len()],
            });
        }
        let output = IntegerMatrix::new(values, launch.m, launch.n)?;
        tracing::info!("kernel '{}' completed in {:?}", kernel.name(), elapsed);

        Ok(KernelRun {
            launch,
            output,
            elapsed,
        })
    }

    /// Exact elementwise comparison of `output` against `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`BitGemmError::VerificationFailed`] carrying the number of
    /// differing cells and the first one in row-major order.
    pub fn compare(&self, expected: &IntegerMatrix, output: &IntegerMatrix) -> Result<()> {
        if expected.dims() != output.dims() {
            return Err(BitGemmError::ShapeMismatch {
                expected: vec![expected.rows(), expected.cols()],
                actual: vec![output.rows(), output.cols()],
            });
        }

        let cols = expected.cols();
        let mut first = None;
        let mut mismatches = 0usize;
        for (i, (&want, &got)) in expected
            .as_slice()
            .iter()
            .zip(output.as_slice())
            .enumerate()
        {
            if want == got {
                continue;
            }
            let (row, col) = (i / cols, i % cols);
            if mismatches < self.mismatch_report_limit {
                tracing::warn!("mismatch at ({row}, {col}): expected {want}, got {got}");
            }
            mismatches += 1;
            first.get_or_insert((row, col, want, got));
        }

        match first {
            None => Ok(()),
            Some((row, col, expected, actual)) => Err(BitGemmError::VerificationFailed {
                mismatches,
                row,
                col,
                expected,
                actual,
            }),
        }
    }

    /// Run `kernel` on `case` and require an exact match with the ground
    /// truth.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::run`] or [`Self::compare`].
    pub fn verify<K: BinaryMatmulKernel + ?Sized>(
        &self,
        case: &TestCase,
        kernel: &K,
    ) -> Result<VerificationReport> {
        let run = self.run(case, kernel)?;
        self.compare(case.ground_truth(), &run.output)?;

        let KernelRun {
            launch, elapsed, ..
        } = run;
        tracing::info!(
            "kernel '{}' matches ground truth ({}x{}, K={})",
            kernel.name(),
            launch.m,
            launch.n,
            launch.k
        );
        Ok(VerificationReport {
            m: launch.m,
            n: launch.n,
            k: launch.k,
            chunks: launch.chunks,
            last_word_mask: launch.last_word_mask,
            kernel: kernel.name().to_string(),
            elapsed,
        })
    }
}
