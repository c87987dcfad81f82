// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Generated test cases and their on-disk layout.
//!
//! ```text
//! <base_dir>/
//!   test_1/
//!     a.bin             A, u8 record, M×K
//!     b.bin             B, u8 record, K×N
//!     ground_truth.bin  reference product, i32 record, M×N
//!   test_2/
//!   ...
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::generator::MatrixGenerator;
use crate::io::{load_bit_matrix, load_int_matrix, save_bit_matrix, save_int_matrix};
use crate::kernels::binary::reference::ground_truth;
use crate::kernels::binary::types::{IntegerMatrix, UnpackedBitMatrix};

/// File name of matrix A inside a test directory.
pub const MATRIX_A_FILE: &str = "a.bin";
/// File name of matrix B inside a test directory.
pub const MATRIX_B_FILE: &str = "b.bin";
/// File name of the ground truth inside a test directory.
pub const GROUND_TRUTH_FILE: &str = "ground_truth.bin";
/// Prefix of numbered test directories.
pub const TEST_DIR_PREFIX: &str = "test_";

/// Paths of the three records of a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCasePaths {
    /// Matrix A.
    pub a: PathBuf,
    /// Matrix B.
    pub b: PathBuf,
    /// Ground truth.
    pub ground_truth: PathBuf,
}

impl TestCasePaths {
    /// Record paths inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            a: dir.join(MATRIX_A_FILE),
            b: dir.join(MATRIX_B_FILE),
            ground_truth: dir.join(GROUND_TRUTH_FILE),
        }
    }
}

/// A freshly created, numbered test directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseDir {
    /// Test id, starting at 1.
    pub id: u32,
    /// Directory path.
    pub path: PathBuf,
}

impl TestCaseDir {
    /// Create `base_dir/test_<id>` for the first unused id ≥ 1.
    ///
    /// Ids are tried in order and claimed by the directory creation itself,
    /// so an id taken by another process in the meantime is skipped rather
    /// than shared.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_dir` cannot be created or creating a
    /// `test_<id>` directory fails for any reason other than it already
    /// existing.
    pub fn allocate(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir)?;

        let mut id = 1u32;
        loop {
            let path = base_dir.join(format!("{TEST_DIR_PREFIX}{id}"));
            match fs::create_dir(&path) {
                Ok(()) => {
                    tracing::debug!("allocated test directory {}", path.display());
                    return Ok(Self { id, path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => id += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Record paths inside this directory.
    #[must_use]
    pub fn paths(&self) -> TestCasePaths {
        TestCasePaths::in_dir(&self.path)
    }

    /// Save `case` into this directory. On failure the directory is removed
    /// so no partial test case is left behind.
    ///
    /// # Errors
    ///
    /// Returns the error from [`TestCase::save`].
    pub fn persist(&self, case: &TestCase) -> Result<TestCasePaths> {
        case.save(&self.path).inspect_err(|_| {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                tracing::warn!(
                    "failed to remove incomplete test directory {}: {e}",
                    self.path.display()
                );
            }
        })
    }
}

/// Inputs and reference output of one verification run.
///
/// Shapes are not cross-checked on construction or load; the verification
/// pipeline owns that check so a malformed case fails there, before any
/// kernel runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    a: UnpackedBitMatrix,
    b: UnpackedBitMatrix,
    ground_truth: IntegerMatrix,
}

impl TestCase {
    /// Bundle existing matrices.
    #[must_use]
    pub fn new(a: UnpackedBitMatrix, b: UnpackedBitMatrix, ground_truth: IntegerMatrix) -> Self {
        Self { a, b, ground_truth }
    }

    /// Generate random `A (m×k)` and `B (k×n)` and their reference product.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero.
    pub fn generate(generator: &mut MatrixGenerator, m: usize, n: usize, k: usize) -> Result<Self> {
        let a = generator.generate(m, k)?;
        let b = generator.generate(k, n)?;
        let ground_truth = ground_truth(m, n, k, &a, &b)?;
        Ok(Self { a, b, ground_truth })
    }

    /// Matrix A.
    #[must_use]
    pub const fn a(&self) -> &UnpackedBitMatrix {
        &self.a
    }

    /// Matrix B, row-major `K×N`.
    #[must_use]
    pub const fn b(&self) -> &UnpackedBitMatrix {
        &self.b
    }

    /// Reference product.
    #[must_use]
    pub const fn ground_truth(&self) -> &IntegerMatrix {
        &self.ground_truth
    }

    /// Write the three records into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if any record cannot be written.
    pub fn save(&self, dir: &Path) -> Result<TestCasePaths> {
        let paths = TestCasePaths::in_dir(dir);
        save_bit_matrix(&paths.a, &self.a)?;
        save_bit_matrix(&paths.b, &self.b)?;
        save_int_matrix(&paths.ground_truth, &self.ground_truth)?;
        Ok(paths)
    }

    /// Read the three records from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a record is missing or malformed.
    pub fn load(dir: &Path) -> Result<Self> {
        let paths = TestCasePaths::in_dir(dir);
        let a = load_bit_matrix(&paths.a)?;
        let b = load_bit_matrix(&paths.b)?;
        let ground_truth = load_int_matrix(&paths.ground_truth)?;
        Ok(Self { a, b, ground_truth })
    }
}
