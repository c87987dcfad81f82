//! Random bit matrix generation.
//!
//! The generator owns its random source; callers construct one per run and
//! thread it through every call, so a fixed seed reproduces a whole test
//! case.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::kernels::binary::types::{checked_len, UnpackedBitMatrix};

/// Uniform 0/1 matrix generator.
///
/// # Example
///
/// ```rust
/// use bitgemm_rs::generator::MatrixGenerator;
///
/// let mut gen = MatrixGenerator::from_seed(42);
/// let m = gen.generate(4, 40)?;
/// assert_eq!(m.dims(), (4, 40));
/// # Ok::<(), bitgemm_rs::BitGemmError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MatrixGenerator {
    rng: StdRng,
    distribution: Uniform<u8>,
    seed: Option<u64>,
}

impl MatrixGenerator {
    /// Deterministic generator.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            distribution: Uniform::new_inclusive(0, 1),
            seed: Some(seed),
        }
    }

    /// Generator seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            distribution: Uniform::new_inclusive(0, 1),
            seed: None,
        }
    }

    /// Seeded when `seed` is set, entropy-seeded otherwise.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    /// Seed this generator was built with, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Overwrite every entry of `bits` with a random 0 or 1.
    pub fn fill(&mut self, bits: &mut [u8]) {
        for bit in bits {
            *bit = self.distribution.sample(&mut self.rng);
        }
    }

    /// Random `rows × cols` bit matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero.
    pub fn generate(&mut self, rows: usize, cols: usize) -> Result<UnpackedBitMatrix> {
        let mut bits = vec![0u8; checked_len(rows, cols)?];
        self.fill(&mut bits);
        UnpackedBitMatrix::new(bits, rows, cols)
    }
}
