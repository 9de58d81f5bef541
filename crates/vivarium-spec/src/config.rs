//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

/// Hard ceiling on branch depth regardless of configuration.
pub const DEPTH_CEILING: u32 = 5;
/// Hard ceiling on fBm octaves regardless of configuration.
pub const OCTAVE_CEILING: u8 = 8;

/// How the texture cache picks a victim when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Evict the entry inserted first. Hits do not refresh position.
    #[default]
    Fifo,
    /// Evict the entry used least recently.
    Lru,
}

/// Tunables for the surface engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum surface width in pixels.
    pub max_width: u32,
    /// Maximum surface height in pixels.
    pub max_height: u32,
    /// Pixel count above which dimensions are scaled down proportionally.
    pub pixel_budget: u64,
    /// Optional byte cap on the synthesis working buffer.
    ///
    /// A buffer that would exceed it is treated exactly like a failed
    /// allocation and goes through the halving retry.
    pub working_memory_limit: Option<usize>,
    /// Upper bound on halving retries after an allocation failure.
    pub max_alloc_retries: u32,
    /// Maximum number of cached surfaces.
    pub cache_capacity: usize,
    /// Growth-level drift below which a cached surface is reused.
    pub growth_tolerance: f64,
    /// Cache eviction policy.
    pub eviction: EvictionPolicy,
    /// fBm octaves for the structure field.
    pub octaves: u8,
    /// Maximum branch depth (root veins are depth 0).
    pub max_branch_depth: u32,
    /// Cap on branches grown from a single root vein.
    pub max_branches_per_vein: usize,
    /// Branches thinner than this are not grown.
    pub thickness_floor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            pixel_budget: 1920 * 1080,
            working_memory_limit: None,
            max_alloc_retries: 6,
            cache_capacity: 10,
            growth_tolerance: 0.1,
            eviction: EvictionPolicy::Fifo,
            octaves: 4,
            max_branch_depth: 4,
            max_branches_per_vein: 256,
            thickness_floor: 0.8,
        }
    }
}

impl EngineConfig {
    /// Return a copy with every field forced into its working range.
    pub fn sanitized(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            max_width: self.max_width.max(1),
            max_height: self.max_height.max(1),
            pixel_budget: self.pixel_budget.max(1),
            working_memory_limit: self.working_memory_limit,
            max_alloc_retries: self.max_alloc_retries.min(32),
            cache_capacity: self.cache_capacity.max(1),
            growth_tolerance: if self.growth_tolerance.is_finite() && self.growth_tolerance >= 0.0
            {
                self.growth_tolerance
            } else {
                defaults.growth_tolerance
            },
            eviction: self.eviction,
            octaves: self.octaves.clamp(1, OCTAVE_CEILING),
            max_branch_depth: self.max_branch_depth.min(DEPTH_CEILING),
            max_branches_per_vein: self.max_branches_per_vein.max(1),
            thickness_floor: if self.thickness_floor.is_finite() {
                self.thickness_floor.clamp(0.5, 1.5)
            } else {
                defaults.thickness_floor
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_json_is_default() {
        let parsed: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, EngineConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let parsed: EngineConfig =
            serde_json::from_str(r#"{"cache_capacity": 3, "eviction": "lru"}"#).unwrap();
        assert_eq!(parsed.cache_capacity, 3);
        assert_eq!(parsed.eviction, EvictionPolicy::Lru);
        assert_eq!(parsed.max_width, 1920);
    }

    #[test]
    fn test_sanitized_enforces_ceilings() {
        let config = EngineConfig {
            octaves: 40,
            max_branch_depth: 99,
            thickness_floor: 0.0,
            growth_tolerance: f64::NAN,
            cache_capacity: 0,
            ..EngineConfig::default()
        }
        .sanitized();

        assert_eq!(config.octaves, OCTAVE_CEILING);
        assert_eq!(config.max_branch_depth, DEPTH_CEILING);
        assert_eq!(config.thickness_floor, 0.5);
        assert_eq!(config.growth_tolerance, 0.1);
        assert_eq!(config.cache_capacity, 1);
    }
}
