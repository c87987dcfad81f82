//! Test utilities and fixtures for binary matmul integration tests.
//!
//! This module provides reusable bit patterns, test case scenarios and
//! kernels with known faults.

#![allow(dead_code)]

use anyhow::Result;
use bitgemm_rs::generator::MatrixGenerator;
use bitgemm_rs::kernels::binary::{bit_sign, binary_matmul_cpu, UnpackedBitMatrix};
use bitgemm_rs::kernels::{BinaryMatmulKernel, KernelLaunch};
use bitgemm_rs::test_case::TestCase;
use std::cell::RefCell;

/// Shape and content of a generated test case.
#[derive(Debug, Clone)]
pub struct TestCaseConfig {
    /// Rows of A.
    pub m: usize,
    /// Columns of B.
    pub n: usize,
    /// Shared dimension.
    pub k: usize,
    /// Bit pattern for both operands.
    pub pattern: BitPattern,
}

/// Bit patterns for test matrices.
#[derive(Debug, Clone, Copy)]
pub enum BitPattern {
    /// Uniform random bits from a seeded generator.
    Random { seed: u64 },
    /// Every bit 0 (all -1).
    AllZeros,
    /// Every bit 1 (all +1).
    AllOnes,
    /// 1, 0, 1, 0, ... in storage order.
    Alternating,
}

impl Default for TestCaseConfig {
    fn default() -> Self {
        Self {
            m: 8,
            n: 8,
            k: 64,
            pattern: BitPattern::Random { seed: 42 },
        }
    }
}

/// Test fixture generators.
pub struct TestFixtures;

impl TestFixtures {
    /// Bit matrix following `pattern`.
    pub fn bit_matrix(
        pattern: BitPattern,
        generator: &mut MatrixGenerator,
        rows: usize,
        cols: usize,
    ) -> Result<UnpackedBitMatrix> {
        let bits = match pattern {
            BitPattern::Random { .. } => return Ok(generator.generate(rows, cols)?),
            BitPattern::AllZeros => vec![0u8; rows * cols],
            BitPattern::AllOnes => vec![1u8; rows * cols],
            BitPattern::Alternating => (0..rows * cols).map(|i| u8::from(i % 2 == 0)).collect(),
        };
        Ok(UnpackedBitMatrix::new(bits, rows, cols)?)
    }

    /// Complete test case with ground truth.
    pub fn test_case(config: &TestCaseConfig) -> Result<TestCase> {
        let seed = match config.pattern {
            BitPattern::Random { seed } => seed,
            _ => 0,
        };
        let mut generator = MatrixGenerator::from_seed(seed);
        let a = Self::bit_matrix(config.pattern, &mut generator, config.m, config.k)?;
        let b = Self::bit_matrix(config.pattern, &mut generator, config.k, config.n)?;
        let truth = bitgemm_rs::kernels::binary::ground_truth(config.m, config.n, config.k, &a, &b)?;
        Ok(TestCase::new(a, b, truth))
    }

    /// Scenarios around the 32-bit word boundary.
    pub fn word_boundary_scenarios() -> Vec<(&'static str, TestCaseConfig)> {
        [1, 31, 32, 33, 64, 65]
            .into_iter()
            .map(|k| {
                let name = match k {
                    1 => "k1_single_bit",
                    31 => "k31_one_short",
                    32 => "k32_full_word",
                    33 => "k33_one_over",
                    64 => "k64_two_words",
                    _ => "k65_three_words",
                };
                (
                    name,
                    TestCaseConfig {
                        m: 5,
                        n: 7,
                        k,
                        pattern: BitPattern::Random { seed: k as u64 },
                    },
                )
            })
            .collect()
    }

    /// Degenerate patterns with known results.
    pub fn edge_case_scenarios() -> Vec<(&'static str, TestCaseConfig)> {
        vec![
            (
                "all_zeros",
                TestCaseConfig {
                    m: 3,
                    n: 4,
                    k: 33,
                    pattern: BitPattern::AllZeros,
                },
            ),
            (
                "all_ones",
                TestCaseConfig {
                    m: 3,
                    n: 4,
                    k: 33,
                    pattern: BitPattern::AllOnes,
                },
            ),
            (
                "alternating",
                TestCaseConfig {
                    m: 4,
                    n: 3,
                    k: 47,
                    pattern: BitPattern::Alternating,
                },
            ),
            (
                "single_cell",
                TestCaseConfig {
                    m: 1,
                    n: 1,
                    k: 1,
                    pattern: BitPattern::Random { seed: 1 },
                },
            ),
        ]
    }

    /// The 2×3 by 3×2 case whose product is `[[3, -1], [-1, -1]]`.
    pub fn small_case() -> Result<TestCase> {
        let a = UnpackedBitMatrix::from_rows(&[[1u8, 0, 1], [0, 1, 1]])?;
        let b = UnpackedBitMatrix::from_rows(&[[1u8, 1], [0, 1], [1, 0]])?;
        let truth = bitgemm_rs::kernels::binary::ground_truth_product(&a, &b)?;
        Ok(TestCase::new(a, b, truth))
    }
}

/// Kernel that ignores the last-word mask, counting padding as matches.
pub struct UnmaskedKernel;

impl BinaryMatmulKernel for UnmaskedKernel {
    fn name(&self) -> &str {
        "unmasked"
    }

    fn launch(&self, launch: &KernelLaunch) -> bitgemm_rs::Result<Vec<i32>> {
        let chunks = launch.chunks;
        let total_bits = i32::try_from(chunks * 32).unwrap_or(i32::MAX);
        let mut out = Vec::with_capacity(launch.output_len());
        for r in 0..launch.m {
            let a = launch.packed_a.row_words(r);
            for c in 0..launch.n {
                let b = launch.packed_b.row_words(c);
                let matches: u32 = a.iter().zip(b).map(|(x, y)| (!(x ^ y)).count_ones()).sum();
                out.push(2 * matches as i32 - total_bits);
            }
        }
        Ok(out)
    }
}

/// Kernel that records every launch it receives and defers to the CPU kernel.
#[derive(Default)]
pub struct RecordingKernel {
    /// `(m, n, k, chunks, last_word_mask)` of each launch.
    pub launches: RefCell<Vec<(usize, usize, usize, usize, u32)>>,
}

impl BinaryMatmulKernel for RecordingKernel {
    fn name(&self) -> &str {
        "recording"
    }

    fn launch(&self, launch: &KernelLaunch) -> bitgemm_rs::Result<Vec<i32>> {
        self.launches.borrow_mut().push((
            launch.m,
            launch.n,
            launch.k,
            launch.chunks,
            launch.last_word_mask,
        ));
        binary_matmul_cpu(launch)
    }
}

/// Validation helpers.
pub struct ValidationUtils;

impl ValidationUtils {
    /// Every value lies in `[-k, k]` and has the parity of `k`.
    pub fn within_bounds_and_parity(values: &[i32], k: usize) -> bool {
        let k = k as i32;
        values
            .iter()
            .all(|&v| v.abs() <= k && (v - k).rem_euclid(2) == 0)
    }

    /// Naive ±1 dot product of row `r` of A and column `c` of B.
    pub fn naive_cell(a: &UnpackedBitMatrix, b: &UnpackedBitMatrix, r: usize, c: usize) -> i32 {
        (0..a.cols())
            .map(|k| bit_sign(a.get(r, k)) * bit_sign(b.get(k, c)))
            .sum()
    }
}
