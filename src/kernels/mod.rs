//! Binary matmul kernels and the contract they implement.

pub mod backend;
pub mod binary;
pub mod candle;
#[cfg(feature = "opencl")]
pub mod opencl;

pub use backend::{BinaryMatmulKernel, KernelLaunch};
pub use binary::CpuPopcountKernel;
pub use candle::CandleKernel;
#[cfg(feature = "opencl")]
pub use opencl::OpenClKernel;
