//! Tests for the noise stack: permutation tables, simplex noise, and fBm.
//!
//! These cover the determinism and boundedness guarantees the surface
//! cache and the vein grower depend on.

use std::sync::Arc;

use vivarium_texture::noise::{
    evaluate, fbm, Fbm, Noise2D, NoiseProbe, PermutationCache, PermutationTable, SimplexNoise,
};

// ============================================================================
// Permutation Table Tests
// ============================================================================

/// The first half of the table is a bijection of 0..256 and the second
/// half repeats it.
#[test]
fn test_permutation_is_duplicated_bijection() {
    for seed in [0u32, 1, 42, 0xDEAD_BEEF] {
        let table = PermutationTable::new(seed);
        let perm = table.as_slice();
        assert_eq!(perm.len(), 512);

        let mut seen = [false; 256];
        for &v in &perm[..256] {
            assert!(!seen[v as usize], "duplicate {} for seed {}", v, seed);
            seen[v as usize] = true;
        }
        assert_eq!(&perm[..256], &perm[256..]);
    }
}

/// Tables are bit-identical per seed and differ across seeds.
#[test]
fn test_permutation_determinism() {
    assert_eq!(PermutationTable::new(42), PermutationTable::new(42));
    assert_ne!(
        PermutationTable::new(42).as_slice(),
        PermutationTable::new(43).as_slice()
    );
}

/// The memo hands out the same table until invalidated.
#[test]
fn test_permutation_cache_shares_tables() {
    let mut cache = PermutationCache::new();
    let a = cache.get_or_create(7);
    let b = cache.get_or_create(7);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);

    assert!(cache.invalidate(7));
    let c = cache.get_or_create(7);
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(*a, *c);
}

// ============================================================================
// Simplex Tests
// ============================================================================

#[test]
fn test_evaluate_is_deterministic() {
    let table = PermutationTable::new(42);
    for i in 0..200 {
        let x = i as f64 * 0.37 - 20.0;
        let y = i as f64 * 0.11 + 3.0;
        assert_eq!(evaluate(x, y, &table), evaluate(x, y, &table));
    }
}

/// Output stays inside the documented range over a dense sweep.
#[test]
fn test_evaluate_bounded() {
    let table = PermutationTable::new(1234);
    for iy in 0..120 {
        for ix in 0..120 {
            let v = evaluate(ix as f64 * 0.173, iy as f64 * 0.191, &table);
            assert!(v.is_finite());
            assert!((-1.2..=1.2).contains(&v), "value {} out of range", v);
        }
    }
}

/// Nearby samples are close: the field is smooth.
#[test]
fn test_evaluate_is_continuous() {
    let table = PermutationTable::new(5);
    for i in 0..100 {
        let x = i as f64 * 0.31;
        let y = i as f64 * 0.17;
        let d = (evaluate(x, y, &table) - evaluate(x + 1e-4, y, &table)).abs();
        assert!(d < 0.01, "jump of {} at ({}, {})", d, x, y);
    }
}

#[test]
fn test_non_finite_input_gives_finite_output() {
    let table = PermutationTable::new(5);
    assert!(evaluate(f64::NAN, 1.0, &table).is_finite());
    assert!(evaluate(f64::INFINITY, f64::NEG_INFINITY, &table).is_finite());
}

#[test]
fn test_simplex_generator_matches_free_function() {
    let noise = SimplexNoise::new(99);
    let table = PermutationTable::new(99);
    assert_eq!(noise.sample(3.3, -4.4), evaluate(3.3, -4.4, &table));
}

// ============================================================================
// fBm Tests
// ============================================================================

/// seed 42, fbm(10, 10) is stable across calls.
#[test]
fn test_fbm_repeatable() {
    let table = PermutationTable::new(42);
    let a = fbm(10.0 * 0.05, 10.0 * 0.05, &table, 4);
    let b = fbm(10.0 * 0.05, 10.0 * 0.05, &table, 4);
    assert_eq!(a, b);
}

/// fBm stays normalized for every octave count.
#[test]
fn test_fbm_bounded_for_all_octaves() {
    let table = PermutationTable::new(42);
    for octaves in 0..=12u8 {
        for i in 0..300 {
            let v = fbm(i as f64 * 0.21, i as f64 * 0.13, &table, octaves);
            assert!((-1.0..=1.0).contains(&v), "octaves {} gave {}", octaves, v);
        }
    }
}

/// The generator form and the free function agree at default settings.
#[test]
fn test_fbm_generator_matches_free_function() {
    let table = Arc::new(PermutationTable::new(11));
    let generator = Fbm::new(SimplexNoise::from_table(Arc::clone(&table))).with_octaves(5);
    for i in 0..50 {
        let (x, y) = (i as f64 * 0.7, i as f64 * 0.3);
        assert!((generator.sample(x, y) - fbm(x, y, &table, 5)).abs() < 1e-12);
    }
}

/// Every octave is one evaluation.
#[test]
fn test_fbm_cost_is_one_evaluation_per_octave() {
    let probe = NoiseProbe::new();
    let generator = Fbm::new(SimplexNoise::new(3).with_probe(probe.clone())).with_octaves(4);
    for i in 0..10 {
        generator.sample(i as f64, 0.5);
    }
    assert_eq!(probe.count(), 40);
}
