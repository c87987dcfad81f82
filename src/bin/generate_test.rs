//! Generate a binary matmul test case.
//!
//! Draws random 0/1 matrices `A (M×K)` and `B (K×N)`, computes their ±1
//! product and stores all three under a new `test_<id>` directory.
//!
//! ```bash
//! generate-test 64 48 100
//! generate-test 2 2 3 --seed 7 --print-matrices --base-dir /tmp/cases
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use bitgemm_rs::config::{HarnessConfig, DEFAULT_BASE_DIR, TEST_DIR_ENV};
use bitgemm_rs::display::{format_bit_matrix, format_int_matrix};
use bitgemm_rs::error::BitGemmError;
use bitgemm_rs::generator::MatrixGenerator;
use bitgemm_rs::test_case::{TestCase, TestCaseDir};

/// Binary matmul test case generator
#[derive(Parser, Debug)]
#[command(name = "generate-test")]
#[command(about = "Generate random 1-bit matrices and their ground-truth product")]
#[command(version)]
struct Args {
    /// Rows of A and of the result
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    m: u64,

    /// Columns of B and of the result
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    n: u64,

    /// Columns of A, rows of B
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    k: u64,

    /// Directory holding the test_<id> subdirectories
    #[arg(long, env = TEST_DIR_ENV, default_value = DEFAULT_BASE_DIR)]
    base_dir: PathBuf,

    /// Seed for reproducible matrices
    #[arg(long)]
    seed: Option<u64>,

    /// Print the generated matrices
    #[arg(long)]
    print_matrices: bool,
}

fn dim(value: u64, name: &str) -> Result<usize> {
    usize::try_from(value).with_context(|| format!("{name}={value} does not fit in memory"))
}

fn run(args: Args) -> Result<()> {
    let (m, n, k) = (dim(args.m, "M")?, dim(args.n, "N")?, dim(args.k, "K")?);

    let config = HarnessConfig {
        base_dir: args.base_dir,
        seed: args.seed,
        print_matrices: args.print_matrices,
        ..HarnessConfig::default()
    };
    config.validate()?;

    println!("Generating test matrices with dimensions:");
    println!("  M (rows of A, rows of C): {m}");
    println!("  N (cols of B, cols of C): {n}");
    println!("  K (cols of A, rows of B): {k}");

    let mut generator = MatrixGenerator::new(config.seed);
    if let Some(seed) = generator.seed() {
        tracing::info!("using seed {seed}");
    }
    let case = TestCase::generate(&mut generator, m, n, k)?;
    println!("Generated matrices A ({m}x{k}) and B ({k}x{n})");
    println!("Computed ground truth result ({m}x{n})");

    if config.print_matrices {
        print!("{}", format_bit_matrix("A", case.a()));
        print!("{}", format_bit_matrix("B", case.b()));
        print!("{}", format_int_matrix("ground truth", case.ground_truth()));
    }

    let dir = TestCaseDir::allocate(&config.base_dir).with_context(|| {
        format!(
            "Failed to create test directory under {}",
            config.base_dir.display()
        )
    })?;
    println!("Creating test directory: {}", dir.path.display());

    let paths = dir
        .persist(&case)
        .with_context(|| format!("Failed to write test case to {}", dir.path.display()))?;

    println!("Saved matrices to:");
    println!("  Matrix A: {}", paths.a.display());
    println!("  Matrix B: {}", paths.b.display());
    println!("  Ground Truth: {}", paths.ground_truth.display());
    println!("Test ID: {}", dir.id);

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(e.downcast_ref::<BitGemmError>().map_or(1, BitGemmError::exit_code))
        }
    }
}
