//! 2D simplex noise over a seeded permutation table.
//!
//! Follows Stefan Gustavson's reference formulation with an 8-direction
//! gradient set selected by `hash & 7`.

use std::sync::Arc;

use super::{Noise2D, NoiseProbe, PermutationTable};

/// Skewing factor for 2D: (sqrt(3) - 1) / 2.
const F2: f64 = 0.3660254037844386;
/// Unskewing factor for 2D: (3 - sqrt(3)) / 6.
const G2: f64 = 0.21132486540518713;

/// Gradient directions, indexed by `hash & 7`.
const GRAD8: [[f64; 2]; 8] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < xi as f64 {
        xi - 1
    } else {
        xi
    }
}

#[inline]
fn corner(hash: usize, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        return 0.0;
    }
    let t2 = t * t;
    let g = &GRAD8[hash & 7];
    t2 * t2 * (g[0] * x + g[1] * y)
}

/// Evaluate simplex noise at `(x, y)`.
///
/// Returns a finite value in roughly `[-1, 1]`. Non-finite input is treated
/// as the origin so the result stays finite.
pub fn evaluate(x: f64, y: f64, table: &PermutationTable) -> f64 {
    let x = if x.is_finite() { x } else { 0.0 };
    let y = if y.is_finite() { y } else { 0.0 };

    // Skew onto the triangular lattice to find the enclosing cell
    let s = (x + y) * F2;
    let i = fast_floor(x + s);
    let j = fast_floor(y + s);

    let t = (i.wrapping_add(j)) as f64 * G2;
    let x0 = x - (i as f64 - t);
    let y0 = y - (j as f64 - t);

    // Lower or upper triangle of the cell
    let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

    let x1 = x0 - i1 as f64 + G2;
    let y1 = y0 - j1 as f64 + G2;
    let x2 = x0 - 1.0 + 2.0 * G2;
    let y2 = y0 - 1.0 + 2.0 * G2;

    let ii = (i & 255) as usize;
    let jj = (j & 255) as usize;

    let gi0 = table.at(ii + table.at(jj));
    let gi1 = table.at(ii + i1 + table.at(jj + j1));
    let gi2 = table.at(ii + 1 + table.at(jj + 1));

    70.0 * (corner(gi0, x0, y0) + corner(gi1, x1, y1) + corner(gi2, x2, y2))
}

/// Simplex noise generator bound to one permutation table.
#[derive(Clone, Debug)]
pub struct SimplexNoise {
    table: Arc<PermutationTable>,
    probe: Option<NoiseProbe>,
}

impl SimplexNoise {
    /// Create a generator with a freshly built table for `seed`.
    pub fn new(seed: u32) -> Self {
        Self::from_table(Arc::new(PermutationTable::new(seed)))
    }

    /// Create a generator over an existing (usually memoized) table.
    pub fn from_table(table: Arc<PermutationTable>) -> Self {
        Self { table, probe: None }
    }

    /// Count every evaluation on `probe`.
    pub fn with_probe(mut self, probe: NoiseProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// The permutation table in use.
    pub fn table(&self) -> &PermutationTable {
        &self.table
    }
}

impl Noise2D for SimplexNoise {
    #[inline]
    fn sample(&self, x: f64, y: f64) -> f64 {
        if let Some(probe) = &self.probe {
            probe.record();
        }
        evaluate(x, y, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplex_deterministic() {
        let noise1 = SimplexNoise::new(42);
        let noise2 = SimplexNoise::new(42);

        for i in 0..100 {
            let x = i as f64 * 0.1;
            let y = i as f64 * 0.13;
            assert_eq!(noise1.sample(x, y).to_bits(), noise2.sample(x, y).to_bits());
        }
    }

    #[test]
    fn test_simplex_range() {
        let noise = SimplexNoise::new(42);
        let mut min = f64::MAX;
        let mut max = f64::MIN;

        for i in 0..400 {
            for j in 0..400 {
                let v = noise.sample(i as f64 * 0.037 - 5.0, j as f64 * 0.041 - 5.0);
                min = min.min(v);
                max = max.max(v);
            }
        }

        assert!(min >= -1.2, "min {}", min);
        assert!(max <= 1.2, "max {}", max);
        // The field should actually vary
        assert!(max - min > 0.5);
    }

    #[test]
    fn test_lattice_origin_is_zero() {
        // Every corner contribution vanishes at a lattice point's own corner
        // and the others are out of reach.
        let table = PermutationTable::new(3);
        assert_eq!(evaluate(0.0, 0.0, &table), 0.0);
    }

    #[test]
    fn test_non_finite_input_stays_finite() {
        let table = PermutationTable::new(1);
        assert!(evaluate(f64::NAN, 3.0, &table).is_finite());
        assert!(evaluate(1e300, -1e300, &table).is_finite());
    }

    #[test]
    fn test_probe_counts_samples() {
        let probe = NoiseProbe::new();
        let noise = SimplexNoise::new(5).with_probe(probe.clone());
        for i in 0..10 {
            noise.sample(i as f64, 0.5);
        }
        assert_eq!(probe.count(), 10);
    }

    #[test]
    fn test_different_seeds() {
        let noise1 = SimplexNoise::new(42);
        let noise2 = SimplexNoise::new(43);

        let different = (0..10).any(|i| {
            let x = i as f64 * 0.1 + 0.05;
            let y = i as f64 * 0.13 + 0.05;
            noise1.sample(x, y) != noise2.sample(x, y)
        });
        assert!(different);
    }
}
