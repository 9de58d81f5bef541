//! Noise generation primitives.
//!
//! All noise is pure Rust and deterministic: the same seed and coordinates
//! always produce the same bits. The surface cache and the tests rely on it.

mod fbm;
mod permutation;
mod probe;
mod simplex;

pub use fbm::{fbm, Fbm};
pub use permutation::{PermutationCache, PermutationTable};
pub use probe::NoiseProbe;
pub use simplex::{evaluate, SimplexNoise};

/// Trait for 2D noise generators.
pub trait Noise2D {
    /// Sample the noise at a given 2D coordinate.
    /// Returns a value roughly in [-1, 1].
    fn sample(&self, x: f64, y: f64) -> f64;

    /// Sample the noise and normalize to [0, 1] range.
    fn sample_01(&self, x: f64, y: f64) -> f64 {
        ((self.sample(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}
