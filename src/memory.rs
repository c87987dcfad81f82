//! Device memory accounting for kernel launches.

use crate::error::{BitGemmError, Result};
use crate::kernels::backend::KernelLaunch;
use crate::kernels::binary::pack::bits_to_words;

/// Bytes a single launch needs on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchFootprint {
    /// Packed A: `m * chunks` words.
    pub packed_a_bytes: usize,
    /// Packed B: `n * chunks` words.
    pub packed_b_bytes: usize,
    /// Output: `m * n` i32 values.
    pub output_bytes: usize,
}

impl LaunchFootprint {
    /// Footprint of an `m×k` by `k×n` launch.
    #[must_use]
    pub fn estimate(m: usize, n: usize, k: usize) -> Self {
        let word = std::mem::size_of::<u32>();
        let chunks = bits_to_words(k);
        Self {
            packed_a_bytes: m * chunks * word,
            packed_b_bytes: n * chunks * word,
            output_bytes: m * n * std::mem::size_of::<i32>(),
        }
    }

    /// Footprint of the buffers `launch` actually carries.
    #[must_use]
    pub fn of(launch: &KernelLaunch) -> Self {
        Self {
            packed_a_bytes: launch.packed_a.size_bytes(),
            packed_b_bytes: launch.packed_b.size_bytes(),
            output_bytes: launch.output_len() * std::mem::size_of::<i32>(),
        }
    }

    /// Sum of all three buffers.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.packed_a_bytes + self.packed_b_bytes + self.output_bytes
    }

    /// Check the launch fits in `limit` bytes. `None` accepts any size.
    ///
    /// # Errors
    ///
    /// Returns [`BitGemmError::OutOfMemory`] if `total()` exceeds `limit`.
    pub fn check(&self, limit: Option<usize>) -> Result<()> {
        match limit {
            Some(available) if self.total() > available => Err(BitGemmError::OutOfMemory {
                required: self.total(),
                available,
            }),
            _ => Ok(()),
        }
    }
}

/// Human-readable byte count (`B`, `KiB`, `MiB`, `GiB`).
#[must_use]
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    // Precision loss is irrelevant for display
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}
