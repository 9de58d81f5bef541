//! Seeded permutation tables.

use std::collections::HashMap;
use std::sync::Arc;

/// LCG multiplier (Numerical Recipes).
const LCG_MUL: u32 = 1_664_525;
/// LCG increment (Numerical Recipes).
const LCG_INC: u32 = 1_013_904_223;

/// A 256-entry permutation of `0..256`, stored twice so lattice hashing
/// never needs a wraparound check.
#[derive(Clone, PartialEq, Eq)]
pub struct PermutationTable {
    seed: u32,
    perm: [u8; 512],
}

impl PermutationTable {
    /// Build the table for a seed.
    ///
    /// A 32-bit LCG seeded with `seed` drives a Fisher-Yates shuffle of the
    /// identity sequence. The result is bit-for-bit stable per seed.
    pub fn new(seed: u32) -> Self {
        let mut source = [0u8; 256];
        for (i, slot) in source.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut state = seed;
        for i in (1..256usize).rev() {
            state = state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
            // Low LCG bits have short periods; index with the high half.
            let j = (state >> 16) as usize % (i + 1);
            source.swap(i, j);
        }

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&source);
        perm[256..].copy_from_slice(&source);

        Self { seed, perm }
    }

    /// The seed this table was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Entry at `index` (valid for `0..512`).
    #[inline]
    pub fn at(&self, index: usize) -> usize {
        self.perm[index] as usize
    }

    /// The full doubled table.
    pub fn as_slice(&self) -> &[u8] {
        &self.perm
    }
}

impl std::fmt::Debug for PermutationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationTable")
            .field("seed", &self.seed)
            .field("head", &&self.perm[..8])
            .finish()
    }
}

/// Memo of permutation tables keyed by seed.
///
/// Owned by the engine; wrap the engine in a mutex to share it.
#[derive(Debug, Default)]
pub struct PermutationCache {
    tables: HashMap<u32, Arc<PermutationTable>>,
}

impl PermutationCache {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table for `seed`, building it on first use.
    pub fn get_or_create(&mut self, seed: u32) -> Arc<PermutationTable> {
        self.tables
            .entry(seed)
            .or_insert_with(|| Arc::new(PermutationTable::new(seed)))
            .clone()
    }

    /// Drop the table for `seed`. Returns whether one was present.
    pub fn invalidate(&mut self, seed: u32) -> bool {
        self.tables.remove(&seed).is_some()
    }

    /// Drop every table.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// Number of memoized tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the memo is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_bijection() {
        let table = PermutationTable::new(42);
        let mut seen = [false; 256];
        for i in 0..256 {
            seen[table.at(i)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_table_is_doubled() {
        let table = PermutationTable::new(7);
        let slice = table.as_slice();
        assert_eq!(slice.len(), 512);
        assert_eq!(&slice[..256], &slice[256..]);
    }

    #[test]
    fn test_table_deterministic_per_seed() {
        assert_eq!(PermutationTable::new(42), PermutationTable::new(42));
        assert_ne!(
            PermutationTable::new(42).as_slice(),
            PermutationTable::new(43).as_slice()
        );
    }

    #[test]
    fn test_table_is_shuffled() {
        let table = PermutationTable::new(0);
        let fixed_points = (0..256).filter(|&i| table.at(i) == i).count();
        assert!(fixed_points < 32, "{} fixed points", fixed_points);
    }

    #[test]
    fn test_cache_memoizes() {
        let mut cache = PermutationCache::new();
        let a = cache.get_or_create(42);
        let b = cache.get_or_create(42);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(42));
        assert!(!cache.invalidate(42));
        let c = cache.get_or_create(42);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);

        cache.get_or_create(1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
