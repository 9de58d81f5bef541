//! Deterministic RNG wrapper using PCG32.
//!
//! Used for placement decisions (vein origins, headings, starting
//! thickness). The permutation table has its own LCG; see
//! [`crate::noise::PermutationTable`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Wrapper around PCG32 for deterministic random number generation.
#[derive(Clone)]
pub struct DeterministicRng {
    inner: Pcg32,
}

impl DeterministicRng {
    /// Create a new RNG from a 32-bit seed.
    ///
    /// The seed is expanded to 64 bits by duplicating the bits.
    pub fn new(seed: u32) -> Self {
        let seed64 = (seed as u64) | ((seed as u64) << 32);
        Self {
            inner: Pcg32::seed_from_u64(seed64),
        }
    }

    /// Create an RNG for a named stream derived from a base seed.
    pub fn for_stream(base_seed: u32, stream: &str) -> Self {
        Self::new(Self::derive_stream_seed(base_seed, stream))
    }

    /// Derive a seed for a named stream using BLAKE3.
    ///
    /// Separate streams keep, say, vein placement independent of the light
    /// pass even though both start from the request seed.
    pub fn derive_stream_seed(base_seed: u32, stream: &str) -> u32 {
        let mut input = Vec::with_capacity(4 + stream.len());
        input.extend_from_slice(&base_seed.to_le_bytes());
        input.extend_from_slice(stream.as_bytes());
        let hash = blake3::hash(&input);
        let b = hash.as_bytes();
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Generate a random f64 in the range [0.0, 1.0).
    #[inline]
    pub fn gen_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Generate a random value in the given range.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.inner.gen_range(range)
    }

    /// Generate a random f64 in the range [-1.0, 1.0).
    #[inline]
    pub fn gen_signed_f64(&mut self) -> f64 {
        self.gen_f64() * 2.0 - 1.0
    }
}
