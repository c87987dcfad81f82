// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Configuration for test generation and kernel verification.
//!
//! [`HarnessConfig`] covers where test cases live and how they are reported;
//! [`KernelBackendConfig`] selects and tunes the kernel under test.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BitGemmError;

/// Environment variable overriding [`HarnessConfig::base_dir`].
pub const TEST_DIR_ENV: &str = "BITGEMM_TEST_DIR";

/// Default directory holding `test_<id>` subdirectories.
pub const DEFAULT_BASE_DIR: &str = "tests";

/// Default kernel entry point.
pub const DEFAULT_ENTRY_POINT: &str = "matmul";

/// Settings shared by the generation and verification tools.
///
/// # Example
///
/// ```rust
/// use bitgemm_rs::config::HarnessConfig;
///
/// let config = HarnessConfig {
///     seed: Some(7),
///     ..HarnessConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory under which test cases are created.
    pub base_dir: PathBuf,

    /// Seed for the matrix generator. `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Dump input and output matrices to stdout.
    pub print_matrices: bool,

    /// Maximum number of mismatching cells logged on verification failure.
    pub mismatch_report_limit: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            seed: None,
            print_matrices: false,
            mismatch_report_limit: 10,
        }
    }
}

impl HarnessConfig {
    /// Default configuration with `base_dir` taken from [`TEST_DIR_ENV`]
    /// when set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(TEST_DIR_ENV) {
            config.base_dir = PathBuf::from(dir);
        }
        config
    }

    /// Validate configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns error if `base_dir` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBaseDir);
        }
        Ok(())
    }
}

/// Which implementation executes the packed matmul.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// User-supplied OpenCL C source.
    #[default]
    OpenCl,
    /// Host XNOR-popcount reference kernel.
    Cpu,
    /// Candle tensors (CUDA when available).
    Candle,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCl => write!(f, "opencl"),
            Self::Cpu => write!(f, "cpu"),
            Self::Candle => write!(f, "candle"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opencl" | "cl" => Ok(Self::OpenCl),
            "cpu" => Ok(Self::Cpu),
            "candle" => Ok(Self::Candle),
            other => Err(format!(
                "unknown backend '{other}' (expected opencl, cpu or candle)"
            )),
        }
    }
}

/// Kernel selection and build settings.
#[derive(Debug, Clone)]
pub struct KernelBackendConfig {
    /// Backend to run.
    pub backend: BackendKind,

    /// Kernel function name inside the program source.
    pub entry_point: String,

    /// Options passed to the OpenCL compiler.
    pub build_options: String,

    /// Prefer GPU devices, falling back to any device.
    pub prefer_gpu: bool,

    /// Device memory cap in bytes. `None` uses what the device reports.
    pub memory_limit: Option<usize>,
}

impl Default for KernelBackendConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            build_options: String::new(),
            prefer_gpu: true,
            memory_limit: None,
        }
    }
}

impl KernelBackendConfig {
    /// Host reference backend, no device required.
    #[must_use]
    pub fn cpu_reference() -> Self {
        Self {
            backend: BackendKind::Cpu,
            ..Self::default()
        }
    }

    /// Candle backend.
    #[must_use]
    pub fn candle() -> Self {
        Self {
            backend: BackendKind::Candle,
            ..Self::default()
        }
    }

    /// Validate configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `entry_point` is not a valid C identifier
    /// - `memory_limit` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut chars = self.entry_point.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidEntryPoint(self.entry_point.clone()));
        }
        if self.memory_limit == Some(0) {
            return Err(ConfigError::ZeroMemoryLimit);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base directory must not be empty.
    EmptyBaseDir,
    /// Entry point must be a C identifier.
    InvalidEntryPoint(String),
    /// Memory limit must be positive.
    ZeroMemoryLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBaseDir => write!(f, "base_dir must not be empty"),
            Self::InvalidEntryPoint(v) => write!(f, "entry_point '{v}' is not a valid identifier"),
            Self::ZeroMemoryLimit => write!(f, "memory_limit must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for BitGemmError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
