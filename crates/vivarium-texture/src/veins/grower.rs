//! Noise-driven branch growth over an explicit work-list.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use vivarium_spec::config::DEPTH_CEILING;

use super::{BranchEnd, BranchTask, BranchTrace, GrowthReport, Leaf, VeinPoint, VeinProfile};
use crate::canvas::Canvas;
use crate::noise::{Noise2D, SimplexNoise};
use crate::veins::stroke::{render_traces, VeinPaint};

/// Noise channels; each decision reads its own slice of noise space.
mod channel {
    pub const SEGMENTS: f64 = 0.0;
    pub const HEADING: f64 = 1.0;
    pub const STEP: f64 = 2.0;
    pub const BULGE: f64 = 3.0;
    pub const BRANCH_GATE: f64 = 4.0;
    pub const BRANCH_ANGLE: f64 = 5.0;
    pub const BRANCH_SIDE: f64 = 6.0;
    pub const CHILD_THICKNESS: f64 = 7.0;
    pub const TENDRIL: f64 = 8.0;
}

/// Wrap an angle into `(-PI, PI]`.
fn wrap_angle(a: f64) -> f64 {
    let mut a = a % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// Grows branch lineages inside a bounded region.
pub struct VeinGrower {
    noise: SimplexNoise,
    profile: VeinProfile,
    bounds: (f64, f64),
    margin: f64,
    target: Option<[f64; 2]>,
    thickness_floor: f64,
    max_depth: u32,
    max_branches: usize,
}

impl VeinGrower {
    /// Create a grower for a `bounds` sized surface.
    pub fn new(noise: SimplexNoise, profile: VeinProfile, bounds: (f64, f64)) -> Self {
        Self {
            noise,
            profile,
            bounds,
            margin: bounds.0.max(bounds.1) * 0.1 + 30.0,
            target: None,
            thickness_floor: 0.8,
            max_depth: 4,
            max_branches: 256,
        }
    }

    /// Steer headings toward `target`.
    pub fn with_target(mut self, target: Option<[f64; 2]>) -> Self {
        self.target = target;
        self
    }

    /// Branches thinner than `floor` are not grown.
    pub fn with_thickness_floor(mut self, floor: f64) -> Self {
        self.thickness_floor = floor;
        self
    }

    /// Deepest allowed branch (never above the hard ceiling of 5).
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth.min(DEPTH_CEILING);
        self
    }

    /// Cap on branches grown from one root task.
    pub fn with_max_branches(mut self, max: usize) -> Self {
        self.max_branches = max.max(1);
        self
    }

    /// Noise in `[-1, 1]` for a decision on `channel` at step `k`.
    fn pulse(&self, task: &BranchTask, channel: f64, k: f64) -> f64 {
        self.noise.sample(
            task.seed_offset + k * 0.373 + channel * 31.71,
            task.seed_offset * 0.617 + channel * 17.29 + k * 0.231,
        )
    }

    /// Noise folded into `[0, 1)`.
    ///
    /// Raw simplex values cluster around zero; folding a stretched copy
    /// spreads them evenly enough to use as probabilities.
    fn unit(&self, task: &BranchTask, channel: f64, k: f64) -> f64 {
        let v = (self.pulse(task, channel, k) + 1.0) * 0.5 * 12.9898;
        v - v.floor()
    }

    fn in_bounds(&self, p: [f64; 2]) -> bool {
        p[0] >= -self.margin
            && p[1] >= -self.margin
            && p[0] <= self.bounds.0 + self.margin
            && p[1] <= self.bounds.1 + self.margin
    }

    /// Grow a root task and every branch it spawns.
    ///
    /// Terminates for any input: each branch has at most
    /// `segment_range.1` segments, children are strictly thinner and one
    /// level deeper, and the lineage is capped at `max_branches` traces.
    pub fn grow(&self, root: BranchTask) -> GrowthReport {
        let mut report = GrowthReport::default();
        let mut pending: Vec<(BranchTask, Option<(usize, usize)>)> = vec![(root, None)];

        while let Some((task, parent)) = pending.pop() {
            if task.depth > self.max_depth
                || !(task.thickness >= self.thickness_floor)
                || !task.origin[0].is_finite()
                || !task.origin[1].is_finite()
            {
                continue;
            }
            if report.branches.len() >= self.max_branches {
                report.dropped_tasks += 1 + pending.len();
                break;
            }

            let index = report.branches.len();
            let (trace, children) = self.grow_branch(&task, parent);
            report.branches.push(trace);
            for (child, spawn_point) in children {
                pending.push((child, Some((index, spawn_point))));
            }
        }

        report
    }

    /// Grow and draw a root task and its descendants.
    pub fn grow_and_draw<C: Canvas>(
        &self,
        root: BranchTask,
        paint: &VeinPaint,
        canvas: &mut C,
    ) -> GrowthReport {
        let report = self.grow(root);
        render_traces(&report.branches, paint, canvas);
        report
    }

    /// Grow a single branch; returns its trace and the child tasks it spawned
    /// (with the index of the point they leave from).
    fn grow_branch(
        &self,
        task: &BranchTask,
        parent: Option<(usize, usize)>,
    ) -> (BranchTrace, Vec<(BranchTask, usize)>) {
        let p = &self.profile;
        let (seg_min, seg_max) = p.segment_range;
        let seg_max = seg_max.max(seg_min);
        let span = (seg_max - seg_min + 1) as f64;
        let segments = (seg_min + (self.unit(task, channel::SEGMENTS, 0.0) * span) as u32)
            .min(seg_max);

        let mut position = task.origin;
        let mut heading = if task.angle.is_finite() { task.angle } else { 0.0 };
        let mut thickness = task.thickness;
        let mut points = vec![VeinPoint {
            position,
            thickness,
        }];
        let mut children = Vec::new();
        let mut leaves = Vec::new();
        let mut end = BranchEnd::Completed;

        for s in 0..segments {
            let k = s as f64 + 1.0;

            heading += self.pulse(task, channel::HEADING, k) * p.variation;
            if let Some([tx, ty]) = self.target {
                let desired = (ty - position[1]).atan2(tx - position[0]);
                heading += wrap_angle(desired - heading) * p.steering;
            }
            if p.gravity > 0.0 {
                heading += wrap_angle(FRAC_PI_2 - heading) * p.gravity;
            }

            let step = p.step_range.0
                + self.unit(task, channel::STEP, k) * (p.step_range.1 - p.step_range.0);
            position = [
                position[0] + heading.cos() * step,
                position[1] + heading.sin() * step,
            ];

            thickness *= p.taper;
            if self.unit(task, channel::BULGE, k) < p.bulge_chance {
                let t = self.unit(task, channel::BULGE, k + 0.5);
                thickness *= p.bulge_range.0 + t * (p.bulge_range.1 - p.bulge_range.0);
            }
            let thinned = thickness < self.thickness_floor;
            if thinned {
                thickness = self.thickness_floor;
            }

            points.push(VeinPoint {
                position,
                thickness,
            });
            let point_index = points.len() - 1;

            if !self.in_bounds(position) {
                end = BranchEnd::OutOfBounds;
                break;
            }
            if thinned {
                end = BranchEnd::Thinned;
                break;
            }

            if p.leaves && (s + 1) % p.leaf_cadence.max(1) == 0 {
                let side = if leaves.len() % 2 == 0 { 1.0 } else { -1.0 };
                let normal = heading + FRAC_PI_2 * side;
                let reach = thickness * 1.5 + 3.0;
                leaves.push(Leaf {
                    position: [
                        position[0] + normal.cos() * reach,
                        position[1] + normal.sin() * reach,
                    ],
                    angle: heading + 0.7 * side,
                    size: 4.0 + thickness * 2.0,
                });
            }

            if task.depth < self.max_depth
                && self.unit(task, channel::BRANCH_GATE, k) < p.branch_chance_at(task.depth)
            {
                let spread = p.branch_angle.0
                    + self.unit(task, channel::BRANCH_ANGLE, k)
                        * (p.branch_angle.1 - p.branch_angle.0);
                let side = if self.pulse(task, channel::BRANCH_SIDE, k) >= 0.0 {
                    1.0
                } else {
                    -1.0
                };
                let ratio = p.child_thickness.0
                    + self.unit(task, channel::CHILD_THICKNESS, k)
                        * (p.child_thickness.1 - p.child_thickness.0);
                let child = BranchTask {
                    origin: position,
                    angle: heading + spread * side,
                    thickness: thickness * ratio,
                    depth: task.depth + 1,
                    seed_offset: task.seed_offset + k * 17.3 + (task.depth + 1) as f64 * 101.9,
                };
                if child.thickness >= self.thickness_floor {
                    children.push((child, point_index));
                }
            }
        }

        let tendril = if p.tendrils
            && end != BranchEnd::OutOfBounds
            && thickness < task.thickness * 0.5
        {
            self.spiral_tip(task, position, heading, thickness)
        } else {
            Vec::new()
        };

        let trace = BranchTrace {
            depth: task.depth,
            parent,
            points,
            tendril,
            leaves,
            end,
        };
        (trace, children)
    }

    /// A logarithmic spiral curling off the branch tip.
    fn spiral_tip(
        &self,
        task: &BranchTask,
        tip: [f64; 2],
        heading: f64,
        thickness: f64,
    ) -> Vec<VeinPoint> {
        let p = &self.profile;
        let steps = p.tendril_steps.max(2);
        let turns = p.tendril_turns.0
            + self.unit(task, channel::TENDRIL, 0.0) * (p.tendril_turns.1 - p.tendril_turns.0);
        let side = if self.pulse(task, channel::TENDRIL, 1.0) >= 0.0 {
            1.0
        } else {
            -1.0
        };

        let r0 = (thickness * 3.0).max(6.0);
        let sweep = turns * TAU;
        // Radius shrinks to a sixth of r0 over the full sweep
        let decay = 6.0f64.ln() / sweep;
        let normal = heading + FRAC_PI_2 * side;
        let center = [tip[0] + normal.cos() * r0, tip[1] + normal.sin() * r0];
        let start = (tip[1] - center[1]).atan2(tip[0] - center[0]);

        let mut width = thickness;
        (1..=steps)
            .map(|i| {
                let theta = sweep * i as f64 / steps as f64;
                let r = r0 * (-decay * theta).exp();
                let a = start + theta * side;
                width *= 0.97;
                VeinPoint {
                    position: [center[0] + a.cos() * r, center[1] + a.sin() * r],
                    thickness: width,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vivarium_spec::VeinStyle;

    fn grower(style: VeinStyle) -> VeinGrower {
        VeinGrower::new(
            SimplexNoise::new(42),
            VeinProfile::for_style(style),
            (400.0, 300.0),
        )
    }

    fn root(thickness: f64) -> BranchTask {
        BranchTask {
            origin: [200.0, 150.0],
            angle: 0.3,
            thickness,
            depth: 0,
            seed_offset: 12.5,
        }
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-9);
        assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-12);
        assert!(wrap_angle(7.0).abs() <= PI);
    }

    #[test]
    fn test_segment_count_bounded() {
        let g = grower(VeinStyle::Vessel);
        for i in 0..50 {
            let task = BranchTask {
                seed_offset: i as f64 * 3.7,
                ..root(6.0)
            };
            for branch in g.grow(task).branches {
                assert!(branch.points.len() <= 14);
                assert!(branch.points.len() >= 2);
            }
        }
    }

    /// A hand-built profile with its range backwards grows the lower bound.
    #[test]
    fn test_inverted_segment_range() {
        let profile = VeinProfile {
            segment_range: (9, 4),
            ..VeinProfile::for_style(VeinStyle::Vessel)
        };
        let g = VeinGrower::new(SimplexNoise::new(42), profile, (400.0, 300.0));
        let report = g.grow(root(6.0));
        assert!(!report.branches.is_empty());
        for branch in &report.branches {
            assert!(branch.points.len() <= 10);
        }
    }

    #[test]
    fn test_thin_root_grows_nothing() {
        let report = grower(VeinStyle::Vessel).grow(root(0.5));
        assert!(report.branches.is_empty());
    }

    #[test]
    fn test_per_segment_growth_capped() {
        let g = grower(VeinStyle::Root);
        for i in 0..30 {
            let report = g.grow(BranchTask {
                seed_offset: i as f64 * 11.1,
                ..root(7.0)
            });
            for branch in &report.branches {
                for pair in branch.points.windows(2) {
                    assert!(pair[1].thickness <= pair[0].thickness * 1.15 + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_children_thinner_than_parent_lineage() {
        let g = grower(VeinStyle::Vessel);
        for i in 0..30 {
            let report = g.grow(BranchTask {
                seed_offset: i as f64 * 5.3,
                ..root(6.0)
            });
            for branch in &report.branches {
                if let Some((parent, at)) = branch.parent {
                    let parent = &report.branches[parent];
                    assert_eq!(branch.depth, parent.depth + 1);
                    let running_min = parent.points[..=at]
                        .iter()
                        .map(|p| p.thickness)
                        .fold(f64::INFINITY, f64::min);
                    assert!(branch.points[0].thickness < running_min);
                }
            }
        }
    }

    #[test]
    fn test_depth_ceiling_holds() {
        let g = grower(VeinStyle::Vessel).with_max_depth(99).with_thickness_floor(0.01);
        let report = g.grow(root(50.0));
        assert!(report.max_depth() <= DEPTH_CEILING);
    }

    #[test]
    fn test_branch_cap_bounds_work() {
        let g = grower(VeinStyle::Vessel)
            .with_thickness_floor(0.01)
            .with_max_depth(5)
            .with_max_branches(8);
        let report = g.grow(root(80.0));
        assert!(report.branches.len() <= 8);
    }

    #[test]
    fn test_far_outside_ends_early() {
        let g = grower(VeinStyle::Vessel);
        let task = BranchTask {
            origin: [5000.0, 5000.0],
            ..root(6.0)
        };
        let report = g.grow(task);
        assert_eq!(report.branches.len(), 1);
        assert_eq!(report.branches[0].end, BranchEnd::OutOfBounds);
        assert_eq!(report.branches[0].points.len(), 2);
    }

    #[test]
    fn test_roots_fall() {
        let g = grower(VeinStyle::Root);
        let task = BranchTask {
            origin: [200.0, 0.0],
            angle: FRAC_PI_2,
            ..root(6.0)
        };
        let report = g.grow(task);
        let trunk = &report.branches[0];
        assert!(trunk.points[1].position[1] > 0.0);
        assert!(trunk.points[trunk.points.len() - 1].position[1] > 0.0);
    }

    #[test]
    fn test_tendrils_curl_tapered_tips() {
        let g = grower(VeinStyle::Vine);
        let any_tendril = (0..40).any(|i| {
            g.grow(BranchTask {
                seed_offset: i as f64 * 7.7,
                ..root(4.0)
            })
            .branches
            .iter()
            .any(|b| !b.tendril.is_empty())
        });
        assert!(any_tendril);
    }

    #[test]
    fn test_vessel_has_no_tendrils_or_leaves() {
        let report = grower(VeinStyle::Vessel).grow(root(6.0));
        assert!(report
            .branches
            .iter()
            .all(|b| b.tendril.is_empty() && b.leaves.is_empty()));
    }

    #[test]
    fn test_growth_is_deterministic() {
        let g = grower(VeinStyle::Vine);
        assert_eq!(g.grow(root(5.0)), g.grow(root(5.0)));
    }

    #[test]
    fn test_non_finite_task_skipped() {
        let g = grower(VeinStyle::Vessel);
        let task = BranchTask {
            thickness: f64::NAN,
            ..root(6.0)
        };
        assert!(g.grow(task).branches.is_empty());
    }
}
