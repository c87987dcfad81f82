//! Integration tests for the bitgemm-rs verification harness.
//!
//! ## Test Coverage
//!
//! - Generate, persist, reload and verify test cases on disk
//! - Word-boundary shapes (K = 1, 31, 32, 33, 64, 65)
//! - Dimension mismatches caught before any kernel runs
//! - A kernel that skips the last-word mask is rejected
//! - Candle and CPU kernels agree
//! - Malformed record files
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test integration
//! cargo test --test integration -- --nocapture
//! ```

use anyhow::Result;
use bitgemm_rs::config::HarnessConfig;
use bitgemm_rs::error::BitGemmError;
use bitgemm_rs::generator::MatrixGenerator;
use bitgemm_rs::io::{save_bit_matrix, write_matrix};
use bitgemm_rs::kernels::binary::{pack, BitLayout, UnpackedBitMatrix};
use bitgemm_rs::kernels::{BinaryMatmulKernel, CandleKernel, CpuPopcountKernel, KernelLaunch};
use bitgemm_rs::pipeline::Verifier;
use bitgemm_rs::test_case::{TestCase, TestCaseDir, TestCasePaths};
use candle_core::Device;

mod helpers;

use helpers::{RecordingKernel, TestFixtures, UnmaskedKernel, ValidationUtils};

// ============================================================================
// END-TO-END
// ============================================================================

/// The documented 2×2 example verifies through files on disk.
#[test]
fn test_small_case_end_to_end() -> Result<()> {
    let base = tempfile::tempdir()?;
    let dir = TestCaseDir::allocate(base.path())?;
    assert_eq!(dir.id, 1);

    let case = TestFixtures::small_case()?;
    assert_eq!(case.ground_truth().as_slice(), &[3, -1, -1, -1]);
    assert_eq!(dir.persist(&case)?, dir.paths());

    let loaded = TestCase::load(&dir.path)?;
    let report = Verifier::default().verify(&loaded, &CpuPopcountKernel)?;
    assert_eq!((report.m, report.n, report.k), (2, 2, 3));
    Ok(())
}

/// Generated cases round-trip through disk and verify at every word boundary.
#[test]
fn test_generate_save_load_verify() -> Result<()> {
    let base = tempfile::tempdir()?;
    let verifier = Verifier::new(&HarnessConfig {
        base_dir: base.path().to_path_buf(),
        ..HarnessConfig::default()
    });

    for (i, (name, config)) in TestFixtures::word_boundary_scenarios().into_iter().enumerate() {
        println!("  Testing scenario: {name}");
        let dir = TestCaseDir::allocate(base.path())?;
        assert_eq!(dir.id as usize, i + 1);

        let case = TestFixtures::test_case(&config)?;
        case.save(&dir.path)?;
        let loaded = TestCase::load(&dir.path)?;
        assert_eq!(loaded, case);

        let report = verifier.verify(&loaded, &CpuPopcountKernel)?;
        assert_eq!(report.k, config.k);
        assert_eq!(report.chunks, config.k.div_ceil(32));
        assert!(ValidationUtils::within_bounds_and_parity(
            loaded.ground_truth().as_slice(),
            config.k
        ));
    }
    Ok(())
}

/// Ground truth agrees with a naive per-cell dot product.
#[test]
fn test_ground_truth_matches_naive_cells() -> Result<()> {
    let mut gen = MatrixGenerator::from_seed(5);
    let case = TestCase::generate(&mut gen, 6, 5, 70)?;
    for r in 0..6 {
        for c in 0..5 {
            assert_eq!(
                case.ground_truth().get(r, c),
                ValidationUtils::naive_cell(case.a(), case.b(), r, c)
            );
        }
    }
    Ok(())
}

/// Degenerate patterns have closed-form results.
#[test]
fn test_edge_case_patterns() -> Result<()> {
    for (name, config) in TestFixtures::edge_case_scenarios() {
        println!("  Testing edge case: {name}");
        let case = TestFixtures::test_case(&config)?;
        Verifier::default().verify(&case, &CpuPopcountKernel)?;

        let k = config.k as i32;
        match name {
            // (-1)(-1) and (+1)(+1) both contribute +1
            "all_zeros" | "all_ones" => {
                assert!(case.ground_truth().as_slice().iter().all(|&v| v == k));
            }
            _ => {}
        }
    }
    Ok(())
}

// ============================================================================
// PRECONDITIONS
// ============================================================================

/// A and B disagreeing on K fails before the kernel is invoked.
#[test]
fn test_dimension_mismatch_from_files() -> Result<()> {
    let base = tempfile::tempdir()?;
    let paths = TestCasePaths::in_dir(base.path());

    save_bit_matrix(&paths.a, &UnpackedBitMatrix::new(vec![1; 2 * 3], 2, 3)?)?;
    save_bit_matrix(&paths.b, &UnpackedBitMatrix::new(vec![0; 4 * 2], 4, 2)?)?;
    write_matrix(&paths.ground_truth, &[0i32; 4], 2, 2)?;

    let case = TestCase::load(base.path())?;
    let kernel = RecordingKernel::default();
    let err = Verifier::default().verify(&case, &kernel).unwrap_err();

    assert!(matches!(err, BitGemmError::DimensionMismatch { k_a: 3, k_b: 4 }));
    assert_eq!(err.to_string(), "Incompatible matrix dimensions. K_A=3, K_B=4");
    assert_eq!(err.exit_code(), 2);
    assert!(kernel.launches.borrow().is_empty());
    Ok(())
}

/// Truncated or trailing record bytes are format errors.
#[test]
fn test_malformed_records_rejected() -> Result<()> {
    let base = tempfile::tempdir()?;
    let dir = TestCaseDir::allocate(base.path())?;
    TestFixtures::small_case()?.save(&dir.path)?;
    let paths = dir.paths();

    let mut bytes = std::fs::read(&paths.ground_truth)?;
    bytes.pop();
    std::fs::write(&paths.ground_truth, &bytes)?;
    assert!(matches!(
        TestCase::load(&dir.path),
        Err(BitGemmError::Format { .. })
    ));

    let mut bytes = std::fs::read(&paths.a)?;
    bytes.push(0);
    std::fs::write(&paths.a, &bytes)?;
    assert!(matches!(
        TestCase::load(&dir.path),
        Err(BitGemmError::Format { .. })
    ));
    Ok(())
}

// ============================================================================
// KERNEL CONTRACT
// ============================================================================

/// The kernel receives the scalars derived from K.
#[test]
fn test_launch_scalars_passed_to_kernel() -> Result<()> {
    let case = TestFixtures::test_case(&helpers::TestCaseConfig {
        m: 3,
        n: 2,
        k: 40,
        ..Default::default()
    })?;
    let kernel = RecordingKernel::default();
    Verifier::default().verify(&case, &kernel)?;

    assert_eq!(*kernel.launches.borrow(), vec![(3, 2, 40, 2, 0xFF)]);
    Ok(())
}

/// Without masking, K = 33 zero/zero padding pairs inflate every cell by 31.
#[test]
fn test_unmasked_kernel_fails_verification() -> Result<()> {
    let a = UnpackedBitMatrix::new(vec![0; 33], 1, 33)?;
    let b = UnpackedBitMatrix::new(vec![0; 33], 33, 1)?;
    let launch = KernelLaunch::new(
        pack(&a, 1, 33, BitLayout::RowMajor)?,
        pack(&b, 1, 33, BitLayout::ColMajor)?,
    )?;

    let masked = CpuPopcountKernel.launch(&launch)?;
    let unmasked = UnmaskedKernel.launch(&launch)?;
    assert_eq!(masked, vec![33]);
    assert_eq!(unmasked[0] - masked[0], 31);

    let mut gen = MatrixGenerator::from_seed(9);
    let case = TestCase::generate(&mut gen, 4, 4, 33)?;
    let err = Verifier::default().verify(&case, &UnmaskedKernel).unwrap_err();
    assert!(matches!(
        err,
        BitGemmError::VerificationFailed { mismatches: 16, .. }
    ));
    assert_eq!(err.exit_code(), 1);
    Ok(())
}

/// Unmasked kernels are still correct when K is a multiple of 32.
#[test]
fn test_unmasked_kernel_passes_full_words() -> Result<()> {
    let mut gen = MatrixGenerator::from_seed(10);
    let case = TestCase::generate(&mut gen, 4, 4, 64)?;
    Verifier::default().verify(&case, &UnmaskedKernel)?;
    Ok(())
}

/// Candle and CPU kernels produce identical output.
#[test]
fn test_candle_matches_cpu() -> Result<()> {
    let kernel = CandleKernel::new(Device::Cpu);
    for (name, config) in TestFixtures::word_boundary_scenarios() {
        println!("  Testing scenario: {name}");
        let case = TestFixtures::test_case(&config)?;
        let verifier = Verifier::default();

        let cpu = verifier.run(&case, &CpuPopcountKernel)?;
        let candle = verifier.run(&case, &kernel)?;
        assert_eq!(cpu.output, candle.output);
        verifier.compare(case.ground_truth(), &candle.output)?;
    }
    Ok(())
}

/// Kernels are usable as boxed trait objects.
#[test]
fn test_boxed_kernels() -> Result<()> {
    let kernels: Vec<Box<dyn BinaryMatmulKernel>> = vec![
        Box::new(CpuPopcountKernel),
        Box::new(CandleKernel::new(Device::Cpu)),
    ];
    let case = TestFixtures::small_case()?;
    for kernel in &kernels {
        let report = Verifier::default().verify(&case, kernel)?;
        assert_eq!(report.kernel, kernel.name());
    }
    Ok(())
}
