//! Turning branch traces into strokes.
//!
//! Every branch is drawn in three passes: a soft offset shadow, the body in
//! the vein color, and a thin highlight shifted up and to the left. Body
//! and tendril points are smoothed with a Catmull-Rom spline first.

use vivarium_spec::ColorPalette;

use super::{BranchTrace, Leaf, VeinPoint};
use crate::canvas::{Canvas, StrokePoint, StrokeStyle};
use crate::color::Color;

/// Spline samples per segment.
const SUBDIVISIONS: usize = 4;

const SHADOW_OPACITY: f64 = 0.35;
const SHADOW_OFFSET: f64 = 1.5;
const SHADOW_WIDTH: f64 = 1.3;
const BODY_OPACITY: f64 = 0.9;
const HIGHLIGHT_OPACITY: f64 = 0.55;
const HIGHLIGHT_WIDTH: f64 = 0.35;
/// Highlight shift as a fraction of the average branch thickness.
const HIGHLIGHT_SHIFT: f64 = 0.25;

/// Colors and coordinate scale for vein drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VeinPaint {
    pub shadow: Color,
    pub body: Color,
    pub highlight: Color,
    /// Output pixels per growth-space unit along each axis.
    pub scale: (f64, f64),
}

impl VeinPaint {
    pub fn from_palette(palette: &ColorPalette) -> Self {
        Self {
            shadow: Color::from_rgb8(palette.shadow).scale(0.5),
            body: Color::from_rgb8(palette.vein),
            highlight: Color::from_rgb8(palette.vein_highlight),
            scale: (1.0, 1.0),
        }
    }

    pub fn with_scale(mut self, scale: (f64, f64)) -> Self {
        self.scale = scale;
        self
    }

    /// Widths follow the smaller axis scale so thin veins stay visible.
    fn width_scale(&self) -> f64 {
        self.scale.0.min(self.scale.1)
    }
}

/// Catmull-Rom smoothing of `points` into stroke vertices at `scale`.
///
/// The curve passes through every input point; the ends are clamped by
/// repeating the first and last point. Widths are interpolated linearly.
pub fn smooth(points: &[VeinPoint], scale: (f64, f64)) -> Vec<StrokePoint> {
    let ws = scale.0.min(scale.1);
    let to_stroke = |p: [f64; 2], width: f64| {
        StrokePoint::new(p[0] * scale.0, p[1] * scale.1, width * ws)
    };

    match points.len() {
        0 => return Vec::new(),
        1 => return vec![to_stroke(points[0].position, points[0].thickness)],
        _ => {}
    }

    let last = points.len() - 1;
    let mut out = Vec::with_capacity(last * SUBDIVISIONS + 1);
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)].position;
        let p1 = points[i].position;
        let p2 = points[i + 1].position;
        let p3 = points[(i + 2).min(last)].position;
        let (w1, w2) = (points[i].thickness, points[i + 1].thickness);

        for s in 0..SUBDIVISIONS {
            let t = s as f64 / SUBDIVISIONS as f64;
            let pos = [
                catmull_rom(p0[0], p1[0], p2[0], p3[0], t),
                catmull_rom(p0[1], p1[1], p2[1], p3[1], t),
            ];
            out.push(to_stroke(pos, w1 + (w2 - w1) * t));
        }
    }
    out.push(to_stroke(points[last].position, points[last].thickness));
    out
}

#[inline]
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Draw one smoothed polyline in three passes.
fn draw_vein<C: Canvas>(canvas: &mut C, stroke: &[StrokePoint], paint: &VeinPaint) {
    if stroke.is_empty() {
        return;
    }
    let avg_width = stroke.iter().map(|p| p.width).sum::<f64>() / stroke.len() as f64;
    let ws = paint.width_scale();

    canvas.stroke(
        stroke,
        &StrokeStyle::solid(paint.shadow)
            .with_opacity(SHADOW_OPACITY)
            .with_offset(SHADOW_OFFSET * ws, SHADOW_OFFSET * ws)
            .with_width_scale(SHADOW_WIDTH),
    );
    canvas.stroke(stroke, &StrokeStyle::solid(paint.body).with_opacity(BODY_OPACITY));

    let shift = -HIGHLIGHT_SHIFT * avg_width;
    canvas.stroke(
        stroke,
        &StrokeStyle::solid(paint.highlight)
            .with_opacity(HIGHLIGHT_OPACITY)
            .with_offset(shift, shift)
            .with_width_scale(HIGHLIGHT_WIDTH),
    );
}

/// A leaf as a three-point stroke, widest in the middle.
fn leaf_stroke(leaf: &Leaf, scale: (f64, f64)) -> Vec<StrokePoint> {
    let (dx, dy) = (leaf.angle.cos() * leaf.size, leaf.angle.sin() * leaf.size);
    let [x, y] = leaf.position;
    let ws = scale.0.min(scale.1);
    [
        (x - dx * 0.5, y - dy * 0.5, 0.3),
        (x, y, leaf.size * 0.45),
        (x + dx * 0.5, y + dy * 0.5, 0.3),
    ]
    .into_iter()
    .map(|(px, py, w)| StrokePoint::new(px * scale.0, py * scale.1, w * ws))
    .collect()
}

/// Draw every trace, with its tendril and leaves.
pub fn render_traces<C: Canvas>(traces: &[BranchTrace], paint: &VeinPaint, canvas: &mut C) {
    for trace in traces {
        let mut path = trace.points.clone();
        path.extend_from_slice(&trace.tendril);
        let stroke = smooth(&path, paint.scale);
        draw_vein(canvas, &stroke, paint);

        for leaf in &trace.leaves {
            let shape = leaf_stroke(leaf, paint.scale);
            canvas.stroke(&shape, &StrokeStyle::solid(paint.body).with_opacity(BODY_OPACITY));
            canvas.stroke(
                &shape,
                &StrokeStyle::solid(paint.highlight)
                    .with_opacity(HIGHLIGHT_OPACITY)
                    .with_width_scale(HIGHLIGHT_WIDTH),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;
    use crate::canvas::{DrawCommand, RasterCanvas, RecordingCanvas};
    use crate::veins::BranchEnd;

    fn point(x: f64, y: f64, t: f64) -> VeinPoint {
        VeinPoint {
            position: [x, y],
            thickness: t,
        }
    }

    fn trace(points: Vec<VeinPoint>, leaves: Vec<Leaf>) -> BranchTrace {
        BranchTrace {
            depth: 0,
            parent: None,
            points,
            tendril: Vec::new(),
            leaves,
            end: BranchEnd::Completed,
        }
    }

    #[test]
    fn test_smooth_passes_through_points() {
        let pts = [point(0.0, 0.0, 4.0), point(10.0, 5.0, 3.0), point(20.0, 0.0, 2.0)];
        let out = smooth(&pts, (1.0, 1.0));
        assert_eq!(out.len(), 2 * SUBDIVISIONS + 1);
        assert_eq!(out[0], StrokePoint::new(0.0, 0.0, 4.0));
        let mid = out[SUBDIVISIONS];
        assert!((mid.x - 10.0).abs() < 1e-9 && (mid.y - 5.0).abs() < 1e-9);
        assert_eq!(out[out.len() - 1], StrokePoint::new(20.0, 0.0, 2.0));
    }

    #[test]
    fn test_smooth_applies_scale() {
        let pts = [point(10.0, 10.0, 4.0), point(20.0, 10.0, 4.0)];
        let out = smooth(&pts, (0.5, 0.25));
        assert_eq!(out[0], StrokePoint::new(5.0, 2.5, 1.0));
    }

    #[test]
    fn test_smooth_degenerate_inputs() {
        assert!(smooth(&[], (1.0, 1.0)).is_empty());
        assert_eq!(smooth(&[point(1.0, 2.0, 3.0)], (1.0, 1.0)).len(), 1);
    }

    #[test]
    fn test_three_passes_per_trace() {
        let paint = VeinPaint::from_palette(&ColorPalette::FLESH);
        let traces = vec![
            trace(vec![point(0.0, 0.0, 3.0), point(10.0, 0.0, 2.0)], Vec::new()),
            trace(
                vec![point(0.0, 5.0, 3.0), point(10.0, 5.0, 2.0)],
                vec![Leaf {
                    position: [5.0, 8.0],
                    angle: 0.5,
                    size: 6.0,
                }],
            ),
        ];
        let mut canvas = RecordingCanvas::new(20, 20);
        render_traces(&traces, &paint, &mut canvas);
        assert_eq!(canvas.stroke_count(), 3 + 3 + 2);

        let DrawCommand::Stroke { style, .. } = &canvas.commands[1] else {
            panic!("expected stroke");
        };
        assert_eq!(style.color, paint.body);
    }

    #[test]
    fn test_highlight_shifts_up_left() {
        let paint = VeinPaint::from_palette(&ColorPalette::FLESH);
        let mut canvas = RecordingCanvas::new(20, 20);
        render_traces(
            &[trace(vec![point(0.0, 0.0, 4.0), point(10.0, 0.0, 4.0)], Vec::new())],
            &paint,
            &mut canvas,
        );
        let DrawCommand::Stroke { style, .. } = &canvas.commands[2] else {
            panic!("expected stroke");
        };
        assert_eq!(style.offset, [-1.0, -1.0]);
        assert_eq!(style.width_scale, HIGHLIGHT_WIDTH);
    }

    #[test]
    fn test_rendered_vein_changes_pixels() {
        let mut buf = PixelBuffer::filled(40, 40, [28, 22, 26, 255]);
        let before = buf.clone();
        let paint = VeinPaint::from_palette(&ColorPalette::FLESH);
        render_traces(
            &[trace(vec![point(5.0, 20.0, 5.0), point(35.0, 20.0, 4.0)], Vec::new())],
            &paint,
            &mut RasterCanvas::new(&mut buf),
        );
        assert_ne!(buf.get(20, 20), before.get(20, 20));
        assert!(buf.alphas().all(|a| a == 255));
    }
}
