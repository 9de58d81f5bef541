//! Fractal Brownian Motion (FBM) noise.
//!
//! FBM layers multiple octaves of noise to create natural-looking patterns.
//! Octave count is the main per-pixel cost lever.

use super::{evaluate, Noise2D, PermutationTable};

const MAX_OCTAVES: u8 = 8;

#[inline]
fn accumulate<F: Fn(f64, f64) -> f64>(
    x: f64,
    y: f64,
    octaves: u8,
    persistence: f64,
    lacunarity: f64,
    sample: F,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves.clamp(1, MAX_OCTAVES) {
        total += sample(x * frequency, y * frequency) * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    (total / max_value).clamp(-1.0, 1.0)
}

/// Sum `octaves` of simplex noise at doubling frequency and halving
/// amplitude, normalized by the total amplitude into `[-1, 1]`.
pub fn fbm(x: f64, y: f64, table: &PermutationTable, octaves: u8) -> f64 {
    accumulate(x, y, octaves, 0.5, 2.0, |sx, sy| evaluate(sx, sy, table))
}

/// Fractal Brownian Motion generator.
///
/// Combines multiple octaves of a base noise function to create
/// more complex, natural-looking patterns.
#[derive(Clone, Debug)]
pub struct Fbm<N: Noise2D + Clone> {
    /// The base noise function.
    noise: N,
    /// Number of octaves to combine.
    octaves: u8,
    /// How much each octave contributes relative to the previous.
    persistence: f64,
    /// How much detail increases with each octave.
    lacunarity: f64,
}

impl<N: Noise2D + Clone> Fbm<N> {
    /// Create a new FBM generator with default settings.
    ///
    /// Default: 4 octaves, 0.5 persistence, 2.0 lacunarity.
    pub fn new(noise: N) -> Self {
        Self {
            noise,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    /// Set the number of octaves (clamped to 1..=8).
    pub fn with_octaves(mut self, octaves: u8) -> Self {
        self.octaves = octaves.clamp(1, MAX_OCTAVES);
        self
    }

    /// Set the persistence (amplitude multiplier per octave).
    pub fn with_persistence(mut self, persistence: f64) -> Self {
        self.persistence = persistence;
        self
    }

    /// Set the lacunarity (frequency multiplier per octave).
    pub fn with_lacunarity(mut self, lacunarity: f64) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    /// Number of octaves in use.
    pub fn octaves(&self) -> u8 {
        self.octaves
    }
}

impl<N: Noise2D + Clone> Noise2D for Fbm<N> {
    fn sample(&self, x: f64, y: f64) -> f64 {
        accumulate(
            x,
            y,
            self.octaves,
            self.persistence,
            self.lacunarity,
            |sx, sy| self.noise.sample(sx, sy),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::SimplexNoise;

    #[test]
    fn test_fbm_deterministic() {
        let table = PermutationTable::new(42);
        for i in 0..100 {
            let x = i as f64 * 0.1;
            let y = i as f64 * 0.13;
            assert_eq!(fbm(x, y, &table, 4).to_bits(), fbm(x, y, &table, 4).to_bits());
        }
    }

    #[test]
    fn test_fbm_matches_generator() {
        let table = PermutationTable::new(42);
        let generator = Fbm::new(SimplexNoise::new(42)).with_octaves(5);
        for i in 0..50 {
            let x = i as f64 * 0.21;
            let y = i as f64 * 0.07;
            assert_eq!(fbm(x, y, &table, 5), generator.sample(x, y));
        }
    }

    #[test]
    fn test_fbm_bounded_for_any_octave_count() {
        let table = PermutationTable::new(9);
        for octaves in [0u8, 1, 3, 5, 8, 200] {
            for i in 0..200 {
                let v = fbm(i as f64 * 0.173, i as f64 * 0.091, &table, octaves);
                assert!((-1.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_single_octave_is_plain_noise() {
        let table = PermutationTable::new(11);
        assert_eq!(fbm(1.3, 2.7, &table, 1), evaluate(1.3, 2.7, &table).clamp(-1.0, 1.0));
    }
}
