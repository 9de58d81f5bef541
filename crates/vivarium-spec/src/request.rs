//! Surface render requests.

use serde::{Deserialize, Serialize};

use crate::palette::DEFAULT_PALETTE_ID;
use crate::validation::{clamp_finite, clamp_unit, finite_or, is_finite_point};

/// Largest vein count a request may ask for.
pub const MAX_VEIN_COUNT: u32 = 64;
/// Noise scale used when a request carries a non-finite one.
pub const DEFAULT_NOISE_SCALE: f64 = 0.05;
/// Light radius used when a request carries a non-finite one.
pub const DEFAULT_LIGHT_RADIUS: f64 = 200.0;

const MIN_NOISE_SCALE: f64 = 1e-4;
const MAX_NOISE_SCALE: f64 = 2.0;
const MAX_LIGHT_RADIUS: f64 = 8192.0;
const MAX_LIGHT_INTENSITY: f64 = 4.0;

/// Branching character of the vein network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VeinStyle {
    /// Interior vasculature: moderate heading variation, no gravity.
    #[default]
    Vessel,
    /// Roots: strong variation and a downward pull, grown from the top edge.
    Root,
    /// Vines: gentle variation, curling tendrils and leaves, grown from the edges.
    Vine,
}

impl VeinStyle {
    fn tag(self) -> u8 {
        match self {
            VeinStyle::Vessel => 0,
            VeinStyle::Root => 1,
            VeinStyle::Vine => 2,
        }
    }
}

/// Interactive light used by the light-response pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSpec {
    /// Light position in surface pixels (may lie outside the surface).
    pub position: [f64; 2],
    /// Reach of the light in pixels.
    #[serde(default = "default_light_radius")]
    pub radius: f64,
    /// Overall strength multiplier.
    #[serde(default = "default_light_intensity")]
    pub intensity: f64,
}

fn default_light_radius() -> f64 {
    DEFAULT_LIGHT_RADIUS
}

fn default_light_intensity() -> f64 {
    1.0
}

impl LightSpec {
    /// Create a light at full intensity.
    pub fn new(position: [f64; 2], radius: f64) -> Self {
        Self {
            position,
            radius,
            intensity: 1.0,
        }
    }

    /// Set the strength multiplier.
    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = intensity;
        self
    }

    /// Clamp radius and intensity; `None` if the position is not finite.
    pub fn sanitized(&self) -> Option<LightSpec> {
        if !is_finite_point(self.position) {
            return None;
        }
        Some(LightSpec {
            position: self.position,
            radius: clamp_finite(self.radius, 1.0, MAX_LIGHT_RADIUS, DEFAULT_LIGHT_RADIUS),
            intensity: clamp_finite(self.intensity, 0.0, MAX_LIGHT_INTENSITY, 1.0),
        })
    }
}

/// A single surface render request.
///
/// All fields are plain numerics so a scene can rebuild one every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRequest {
    /// Requested width in pixels (clamped by the engine's safety plan).
    pub width: u32,
    /// Requested height in pixels (clamped by the engine's safety plan).
    pub height: u32,
    /// Palette id resolved against the engine's palette set.
    #[serde(default = "default_palette_id")]
    pub palette_id: String,
    /// Noise frequency per pixel.
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f64,
    /// Number of root veins to grow.
    #[serde(default)]
    pub vein_count: u32,
    /// Seed for the permutation table and vein placement.
    #[serde(default)]
    pub seed: u32,
    /// Time in seconds; drifts the noise sampling origin slowly.
    #[serde(default)]
    pub time: f64,
    /// Surface development in `[0, 1]`.
    #[serde(default = "default_growth_level")]
    pub growth_level: f64,
    /// Branching character.
    #[serde(default)]
    pub vein_style: VeinStyle,
    /// Force tendril tips on or off; `None` uses the style default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tendrils: Option<bool>,
    /// Force leaves on or off; `None` uses the style default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaves: Option<bool>,
    /// Point that branch headings are steered toward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<[f64; 2]>,
    /// Interactive light; `None` skips the light-response pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightSpec>,
}

fn default_palette_id() -> String {
    DEFAULT_PALETTE_ID.to_string()
}

fn default_noise_scale() -> f64 {
    DEFAULT_NOISE_SCALE
}

fn default_growth_level() -> f64 {
    1.0
}

impl SurfaceRequest {
    /// Create a request with default parameters.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            palette_id: default_palette_id(),
            noise_scale: DEFAULT_NOISE_SCALE,
            vein_count: 0,
            seed: 0,
            time: 0.0,
            growth_level: 1.0,
            vein_style: VeinStyle::default(),
            tendrils: None,
            leaves: None,
            target: None,
            light: None,
        }
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Set the palette id.
    pub fn with_palette(mut self, palette_id: impl Into<String>) -> Self {
        self.palette_id = palette_id.into();
        self
    }

    /// Set the noise scale.
    pub fn with_noise_scale(mut self, noise_scale: f64) -> Self {
        self.noise_scale = noise_scale;
        self
    }

    /// Set vein count and style.
    pub fn with_veins(mut self, vein_count: u32, style: VeinStyle) -> Self {
        self.vein_count = vein_count;
        self.vein_style = style;
        self
    }

    /// Set the time value.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Set the growth level.
    pub fn with_growth(mut self, growth_level: f64) -> Self {
        self.growth_level = growth_level;
        self
    }

    /// Force tendrils on or off.
    pub fn with_tendrils(mut self, enabled: bool) -> Self {
        self.tendrils = Some(enabled);
        self
    }

    /// Force leaves on or off.
    pub fn with_leaves(mut self, enabled: bool) -> Self {
        self.leaves = Some(enabled);
        self
    }

    /// Steer branches toward a point.
    pub fn with_target(mut self, target: [f64; 2]) -> Self {
        self.target = Some(target);
        self
    }

    /// Attach a light.
    pub fn with_light(mut self, light: LightSpec) -> Self {
        self.light = Some(light);
        self
    }

    /// Whether tendril tips are enabled for this request.
    pub fn tendrils_enabled(&self) -> bool {
        self.tendrils
            .unwrap_or(matches!(self.vein_style, VeinStyle::Vine))
    }

    /// Whether leaves are enabled for this request.
    pub fn leaves_enabled(&self) -> bool {
        self.leaves.unwrap_or(matches!(self.vein_style, VeinStyle::Vine))
    }

    /// Return a copy with every numeric field clamped into its working range.
    ///
    /// Dimensions are left alone; the engine clamps them as part of its
    /// allocation safety plan so it can report what it changed.
    pub fn sanitized(&self) -> SurfaceRequest {
        SurfaceRequest {
            width: self.width,
            height: self.height,
            palette_id: self.palette_id.clone(),
            noise_scale: clamp_finite(
                self.noise_scale.abs(),
                MIN_NOISE_SCALE,
                MAX_NOISE_SCALE,
                DEFAULT_NOISE_SCALE,
            ),
            vein_count: self.vein_count.min(MAX_VEIN_COUNT),
            seed: self.seed,
            time: finite_or(self.time, 0.0),
            growth_level: clamp_unit(self.growth_level, 1.0),
            vein_style: self.vein_style,
            tendrils: self.tendrils,
            leaves: self.leaves,
            target: self.target.filter(|t| is_finite_point(*t)),
            light: self.light.and_then(|l| l.sanitized()),
        }
    }

    /// BLAKE3 hex digest of the fields that shape the cached image.
    ///
    /// Time, growth level, and light are excluded: time drift and light move
    /// every frame, and growth has its own tolerance check in the cache.
    pub fn fingerprint(&self) -> String {
        let clean = self.sanitized();
        let mut hasher = blake3::Hasher::new();
        hasher.update(&clean.width.to_le_bytes());
        hasher.update(&clean.height.to_le_bytes());
        hasher.update(&(clean.palette_id.len() as u64).to_le_bytes());
        hasher.update(clean.palette_id.as_bytes());
        hasher.update(&clean.noise_scale.to_bits().to_le_bytes());
        hasher.update(&clean.vein_count.to_le_bytes());
        hasher.update(&clean.seed.to_le_bytes());
        hasher.update(&[
            clean.vein_style.tag(),
            clean.tendrils_enabled() as u8,
            clean.leaves_enabled() as u8,
        ]);
        match clean.target {
            Some([x, y]) => {
                hasher.update(&[1]);
                hasher.update(&x.to_bits().to_le_bytes());
                hasher.update(&y.to_bits().to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}
