//! Evaluation counter for noise instrumentation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counter of noise evaluations.
///
/// Clones share the same count. Attach one to [`super::SimplexNoise`] to
/// observe how much noise work a render performed.
#[derive(Debug, Clone, Default)]
pub struct NoiseProbe {
    count: Arc<AtomicU64>,
}

impl NoiseProbe {
    /// Create a probe at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one evaluation.
    #[inline]
    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Evaluations recorded so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Reset the count to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}
