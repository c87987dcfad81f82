//! # bitgemm-rs
//!
//! Test harness for binary (1-bit) matrix multiplication kernels.
//!
//! Matrices hold one bit per entry, read as `+1` for a set bit and `-1` for a
//! clear one. The crate provides:
//!
//! - Bit packing into `u32` words in row- or column-major order
//! - A ground-truth evaluator on unpacked inputs
//! - A little-endian on-disk matrix record format and test case layout
//! - A verification pipeline that packs inputs, launches a kernel and
//!   compares its output exactly with the ground truth
//! - Kernels behind one trait: a CPU XNOR-popcount kernel, a Candle kernel,
//!   and user-supplied OpenCL C source (`opencl` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use bitgemm_rs::generator::MatrixGenerator;
//! use bitgemm_rs::kernels::CpuPopcountKernel;
//! use bitgemm_rs::pipeline::Verifier;
//! use bitgemm_rs::test_case::TestCase;
//!
//! let mut gen = MatrixGenerator::from_seed(42);
//! let case = TestCase::generate(&mut gen, 8, 6, 45)?;
//!
//! let report = Verifier::default().verify(&case, &CpuPopcountKernel)?;
//! assert_eq!(report.chunks, 2);
//! # Ok::<(), bitgemm_rs::BitGemmError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod display;
pub mod error;
pub mod generator;
pub mod io;
pub mod kernels;
pub mod memory;
pub mod pipeline;
pub mod test_case;

pub use error::{BitGemmError, Result};
