//! Vein and root networks.
//!
//! A network is a handful of root veins, each grown by [`VeinGrower`] into a
//! lineage of tapering branches. Growth is an explicit work-list of
//! [`BranchTask`]s rather than call-stack recursion, so the depth ceiling
//! and the per-vein branch cap bound the work directly.
//!
//! Geometry and drawing are separate: [`VeinGrower::grow`] returns traces,
//! [`stroke::render_traces`] turns them into three-pass strokes on a
//! [`crate::canvas::Canvas`].

mod grower;
pub mod stroke;

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use vivarium_spec::{EngineConfig, SurfaceRequest, VeinStyle};

use crate::rng::DeterministicRng;

pub use grower::VeinGrower;

/// A sampled point along a branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VeinPoint {
    pub position: [f64; 2],
    pub thickness: f64,
}

/// A branch waiting to be grown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchTask {
    pub origin: [f64; 2],
    /// Initial heading in radians (0 = +x, `PI / 2` = down).
    pub angle: f64,
    pub thickness: f64,
    /// Root veins are depth 0.
    pub depth: u32,
    /// Offset into noise space that decorrelates sibling branches.
    pub seed_offset: f64,
}

/// Why a branch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchEnd {
    /// Ran through its segment count.
    Completed,
    /// Tapered below the thickness floor.
    Thinned,
    /// Drifted too far outside the surface.
    OutOfBounds,
}

/// A leaf attached beside a branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    pub position: [f64; 2],
    pub angle: f64,
    pub size: f64,
}

/// The geometry of one grown branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchTrace {
    pub depth: u32,
    /// Index of the parent trace and the parent point this branch left from.
    pub parent: Option<(usize, usize)>,
    /// Body points, starting at the task origin.
    pub points: Vec<VeinPoint>,
    /// Spiral tip appended after the body, if any.
    pub tendril: Vec<VeinPoint>,
    pub leaves: Vec<Leaf>,
    pub end: BranchEnd,
}

impl BranchTrace {
    /// Thinnest body point.
    pub fn min_thickness(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.thickness)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Everything grown from one root vein.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthReport {
    pub branches: Vec<BranchTrace>,
    /// Tasks discarded because the per-vein branch cap was reached.
    pub dropped_tasks: usize,
}

impl GrowthReport {
    /// Total body segments across all branches.
    pub fn segment_count(&self) -> usize {
        self.branches
            .iter()
            .map(|b| b.points.len().saturating_sub(1))
            .sum()
    }

    /// Deepest branch depth reached.
    pub fn max_depth(&self) -> u32 {
        self.branches.iter().map(|b| b.depth).max().unwrap_or(0)
    }
}

/// Growth tunables for one vein style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VeinProfile {
    /// Heading perturbation per segment, scaled by a noise sample.
    pub variation: f64,
    /// Fraction of the heading error toward straight down removed per segment.
    pub gravity: f64,
    /// Fraction of the heading error toward the target removed per segment.
    pub steering: f64,
    pub step_range: (f64, f64),
    pub segment_range: (u32, u32),
    pub taper: f64,
    /// Chance per segment of a bulge instead of pure taper.
    pub bulge_chance: f64,
    pub bulge_range: (f64, f64),
    /// Branch chance at depth 0.
    pub branch_chance: f64,
    /// Branch chance lost per depth level.
    pub branch_decay: f64,
    pub branch_angle: (f64, f64),
    pub child_thickness: (f64, f64),
    pub tendrils: bool,
    pub tendril_turns: (f64, f64),
    pub tendril_steps: u32,
    pub leaves: bool,
    /// Segments between leaves.
    pub leaf_cadence: u32,
}

impl VeinProfile {
    /// Defaults for a style, before request overrides.
    pub fn for_style(style: VeinStyle) -> Self {
        let base = Self {
            variation: 0.35,
            gravity: 0.0,
            steering: 0.15,
            step_range: (15.0, 30.0),
            segment_range: (5, 13),
            taper: 0.92,
            bulge_chance: 0.15,
            bulge_range: (1.12, 1.15),
            branch_chance: 0.30,
            branch_decay: 0.04,
            branch_angle: (0.4, 0.9),
            child_thickness: (0.55, 0.6),
            tendrils: false,
            tendril_turns: (2.0, 3.5),
            tendril_steps: 24,
            leaves: false,
            leaf_cadence: 3,
        };
        match style {
            VeinStyle::Vessel => base,
            VeinStyle::Root => Self {
                variation: 0.55,
                gravity: 0.12,
                ..base
            },
            VeinStyle::Vine => Self {
                variation: 0.25,
                branch_chance: 0.22,
                tendrils: true,
                leaves: true,
                ..base
            },
        }
    }

    /// Profile for a request: style defaults, toggles, and growth scaling.
    pub fn for_request(request: &SurfaceRequest) -> Self {
        let mut profile = Self::for_style(request.vein_style);
        profile.tendrils = request.tendrils_enabled();
        profile.leaves = request.leaves_enabled();
        profile.branch_chance *= 0.5 + 0.5 * request.growth_level;
        profile
    }

    /// Branch chance at a depth, never below zero.
    pub fn branch_chance_at(&self, depth: u32) -> f64 {
        (self.branch_chance - self.branch_decay * depth as f64).max(0.0)
    }
}

/// Pick origins, headings, and starting thickness for root veins.
///
/// Placement uses a PCG stream derived from the request seed, so it is
/// independent of the noise table but just as reproducible.
pub fn plant_roots(
    request: &SurfaceRequest,
    bounds: (f64, f64),
    config: &EngineConfig,
) -> Vec<BranchTask> {
    let mut rng = DeterministicRng::for_stream(request.seed, "veins");
    let (w, h) = bounds;
    let growth_scale = 0.5 + 0.5 * request.growth_level;

    (0..request.vein_count)
        .filter_map(|i| {
            let (origin, angle, thickness) = match request.vein_style {
                VeinStyle::Vessel => {
                    let x = w * rng.gen_range(0.1..0.9);
                    let y = h * rng.gen_range(0.1..0.9);
                    ([x, y], rng.gen_f64() * TAU, rng.gen_range(3.0..6.0))
                }
                VeinStyle::Root => {
                    let x = w * rng.gen_f64();
                    let angle = FRAC_PI_2 + rng.gen_signed_f64() * 0.4;
                    ([x, -2.0], angle, rng.gen_range(4.0..7.0))
                }
                VeinStyle::Vine => {
                    let jitter = rng.gen_signed_f64() * 0.5;
                    let t = rng.gen_f64();
                    let (origin, heading) = match i % 4 {
                        0 => ([0.0, h * t], 0.0),
                        1 => ([w, h * t], PI),
                        2 => ([w * t, h], -FRAC_PI_2),
                        _ => ([w * t, 0.0], FRAC_PI_2),
                    };
                    (origin, heading + jitter, rng.gen_range(2.5..4.5))
                }
            };
            let thickness = thickness * growth_scale;
            let seed_offset = i as f64 * 57.31 + rng.gen_f64() * 100.0;
            (thickness >= config.thickness_floor).then_some(BranchTask {
                origin,
                angle,
                thickness,
                depth: 0,
                seed_offset,
            })
        })
        .collect()
}
