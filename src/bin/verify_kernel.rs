//! Verify a binary matmul kernel against a stored test case.
//!
//! ```bash
//! verify-kernel kernels/binary_matmul.cl tests/test_1
//! verify-kernel unused tests/test_1 --backend cpu
//! ```
//!
//! Exits with status 0 and prints `Success!` when the kernel output equals
//! the ground truth. Rejected inputs exit with 2, kernel failures and
//! mismatches with 1.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bitgemm_rs::config::{BackendKind, HarnessConfig, KernelBackendConfig, DEFAULT_ENTRY_POINT};
use bitgemm_rs::display::{format_bit_matrix, format_int_matrix};
use bitgemm_rs::error::BitGemmError;
use bitgemm_rs::kernels::{BinaryMatmulKernel, CandleKernel, CpuPopcountKernel};
use bitgemm_rs::pipeline::Verifier;
use bitgemm_rs::test_case::TestCase;

/// Binary matmul kernel verifier
#[derive(Parser, Debug)]
#[command(name = "verify-kernel")]
#[command(about = "Run a 1-bit matmul kernel on a test case and compare with the ground truth")]
#[command(version)]
struct Args {
    /// OpenCL C source of the kernel under test
    kernel_path: PathBuf,

    /// Test case directory containing a.bin, b.bin and ground_truth.bin
    test_dir: PathBuf,

    /// Kernel backend (opencl, cpu, candle)
    #[arg(long, default_value_t = BackendKind::OpenCl)]
    backend: BackendKind,

    /// Kernel function name
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    entry_point: String,

    /// Options passed to the OpenCL compiler
    #[arg(long, default_value = "")]
    build_options: String,

    /// Do not prefer GPU devices
    #[arg(long)]
    any_device: bool,

    /// Print input and output matrices
    #[arg(long)]
    print_matrices: bool,
}

fn open_kernel(
    kernel_path: &Path,
    config: &KernelBackendConfig,
) -> Result<Box<dyn BinaryMatmulKernel>> {
    match config.backend {
        BackendKind::Cpu => Ok(Box::new(CpuPopcountKernel)),
        BackendKind::Candle => Ok(Box::new(CandleKernel::cuda_if_available()?)),
        #[cfg(feature = "opencl")]
        BackendKind::OpenCl => {
            let kernel =
                bitgemm_rs::kernels::OpenClKernel::from_source_file(kernel_path, config)
                    .with_context(|| {
                        format!("Failed to build kernel {}", kernel_path.display())
                    })?;
            Ok(Box::new(kernel))
        }
        #[cfg(not(feature = "opencl"))]
        BackendKind::OpenCl => anyhow::bail!(
            "cannot run {}: built without the `opencl` feature",
            kernel_path.display()
        ),
    }
}

fn run(args: Args) -> Result<()> {
    let harness = HarnessConfig {
        print_matrices: args.print_matrices,
        ..HarnessConfig::from_env()
    };
    let backend = KernelBackendConfig {
        backend: args.backend,
        entry_point: args.entry_point,
        build_options: args.build_options,
        prefer_gpu: !args.any_device,
        ..KernelBackendConfig::default()
    };
    backend.validate()?;

    println!("Loading matrices from files...");
    let case = TestCase::load(&args.test_dir)
        .with_context(|| format!("Failed to load test case {}", args.test_dir.display()))?;
    let (m, k_a) = case.a().dims();
    let (k_b, n) = case.b().dims();
    println!("Loaded matrices:");
    println!("  Matrix A: {m}x{k_a}");
    println!("  Matrix B: {k_b}x{n}");
    println!("  Ground Truth: {m}x{n}");

    if harness.print_matrices {
        print!("{}", format_bit_matrix("A", case.a()));
        print!("{}", format_bit_matrix("B", case.b()));
    }

    let verifier = Verifier::new(&harness);
    // Shapes are checked before any device is touched.
    let launch = verifier.prepare_launch(&case)?;

    let kernel = open_kernel(&args.kernel_path, &backend)?;
    println!("Launching {} kernel...", kernel.name());
    let run = verifier.run_prepared(launch, &kernel)?;
    println!("Kernel execution completed successfully!");

    if harness.print_matrices {
        print!("{}", format_int_matrix("output GroundTruth", case.ground_truth()));
        print!("{}", format_int_matrix("output kernel", &run.output));
    }

    verifier.compare(case.ground_truth(), &run.output)?;
    tracing::info!("kernel time {:?}", run.elapsed);

    println!("Success!");
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
