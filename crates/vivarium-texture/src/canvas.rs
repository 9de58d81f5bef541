//! Drawing-surface abstraction.
//!
//! The synthesis stages only talk to a [`Canvas`]: fill it with a pixel
//! buffer, stroke tapered polylines, and composite radial color ramps.
//! [`RasterCanvas`] rasterizes into a [`PixelBuffer`]; [`RecordingCanvas`]
//! keeps the commands for inspection.

use crate::buffer::PixelBuffer;
use crate::color::{BlendMode, Color};

/// One vertex of a stroked polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Full stroke width at this vertex.
    pub width: f64,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64, width: f64) -> Self {
        Self { x, y, width }
    }
}

/// Paint settings for a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub opacity: f64,
    /// Translation applied to every vertex.
    pub offset: [f64; 2],
    /// Multiplier applied to every vertex width.
    pub width_scale: f64,
    pub blend: BlendMode,
}

impl StrokeStyle {
    /// An opaque, unshifted source-over stroke.
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            offset: [0.0, 0.0],
            width_scale: 1.0,
            blend: BlendMode::Normal,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = [dx, dy];
        self
    }

    pub fn with_width_scale(mut self, scale: f64) -> Self {
        self.width_scale = scale;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
}

/// A color stop at an absolute distance from the gradient center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub radius: f64,
    pub color: Color,
}

/// A radial color ramp. Stops must be sorted by radius.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: [f64; 2],
    pub stops: Vec<GradientStop>,
    pub blend: BlendMode,
}

impl RadialGradient {
    pub fn new(center: [f64; 2], blend: BlendMode) -> Self {
        Self {
            center,
            stops: Vec::new(),
            blend,
        }
    }

    /// Append a stop; radii are kept non-decreasing.
    pub fn stop(mut self, radius: f64, color: Color) -> Self {
        let floor = self.stops.last().map_or(0.0, |s| s.radius);
        self.stops.push(GradientStop {
            radius: radius.max(floor),
            color,
        });
        self
    }

    /// Outermost stop radius (nothing is painted beyond it).
    pub fn extent(&self) -> f64 {
        self.stops.last().map_or(0.0, |s| s.radius)
    }

    /// Color at distance `d` from the center.
    pub fn color_at(&self, d: f64) -> Color {
        let Some(first) = self.stops.first() else {
            return Color::black().with_alpha(0.0);
        };
        if d <= first.radius {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if d <= b.radius {
                let span = b.radius - a.radius;
                let t = if span > 0.0 { (d - a.radius) / span } else { 1.0 };
                return a.color.lerp(&b.color, t);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

/// A drawing surface.
pub trait Canvas {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Replace the surface contents with `pixels`.
    fn put_pixels(&mut self, pixels: &PixelBuffer);

    /// Stroke a tapered polyline.
    fn stroke(&mut self, points: &[StrokePoint], style: &StrokeStyle);

    /// Composite a radial color ramp.
    fn fill_radial(&mut self, gradient: &RadialGradient);
}

/// Rasterizing canvas over a borrowed [`PixelBuffer`].
pub struct RasterCanvas<'a> {
    target: &'a mut PixelBuffer,
    /// Per-pixel stroke coverage, reused across strokes.
    mask: Vec<f32>,
    touched: Vec<usize>,
}

impl<'a> RasterCanvas<'a> {
    pub fn new(target: &'a mut PixelBuffer) -> Self {
        Self {
            target,
            mask: Vec::new(),
            touched: Vec::new(),
        }
    }

    fn cover_segment(&mut self, a: (f64, f64, f64), b: (f64, f64, f64)) {
        let (w, h) = (self.target.width as i64, self.target.height as i64);
        let reach = a.2.max(b.2) + 1.0;
        let min_x = ((a.0.min(b.0) - reach).floor() as i64).max(0);
        let max_x = ((a.0.max(b.0) + reach).ceil() as i64).min(w - 1);
        let min_y = ((a.1.min(b.1) - reach).floor() as i64).max(0);
        let max_y = ((a.1.max(b.1) + reach).ceil() as i64).min(h - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        let len_sq = dx * dx + dy * dy;

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let cx = px as f64 + 0.5;
                let cy = py as f64 + 0.5;
                let t = if len_sq < 1e-12 {
                    0.0
                } else {
                    (((cx - a.0) * dx + (cy - a.1) * dy) / len_sq).clamp(0.0, 1.0)
                };
                let qx = a.0 + t * dx - cx;
                let qy = a.1 + t * dy - cy;
                let dist = (qx * qx + qy * qy).sqrt();
                let radius = a.2 + (b.2 - a.2) * t;
                // One-pixel antialiased edge
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0) as f32;
                if coverage <= 0.0 {
                    continue;
                }
                let i = py as usize * w as usize + px as usize;
                if self.mask[i] == 0.0 {
                    self.touched.push(i);
                }
                if coverage > self.mask[i] {
                    self.mask[i] = coverage;
                }
            }
        }
    }
}

impl Canvas for RasterCanvas<'_> {
    fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    fn put_pixels(&mut self, pixels: &PixelBuffer) {
        if pixels.width == self.target.width && pixels.height == self.target.height {
            self.target.data.copy_from_slice(&pixels.data);
            return;
        }
        for y in 0..self.target.height.min(pixels.height) {
            for x in 0..self.target.width.min(pixels.width) {
                self.target.set(x, y, pixels.get(x, y));
            }
        }
    }

    fn stroke(&mut self, points: &[StrokePoint], style: &StrokeStyle) {
        if points.is_empty() || style.opacity <= 0.0 {
            return;
        }
        let pixels = self.target.pixel_count();
        if self.mask.len() != pixels {
            self.mask = vec![0.0; pixels];
        }

        let vertex = |p: &StrokePoint| {
            (
                p.x + style.offset[0],
                p.y + style.offset[1],
                (p.width * style.width_scale * 0.5).max(0.25),
            )
        };
        if points.len() == 1 {
            let v = vertex(&points[0]);
            self.cover_segment(v, v);
        }
        for pair in points.windows(2) {
            self.cover_segment(vertex(&pair[0]), vertex(&pair[1]));
        }

        // Each pixel is blended once with its peak coverage, so joints
        // between segments do not darken.
        let width = self.target.width as usize;
        for &i in &self.touched {
            let coverage = self.mask[i] as f64;
            self.mask[i] = 0.0;
            let x = (i % width) as i64;
            let y = (i / width) as i64;
            self.target
                .blend(x, y, &style.color, style.opacity * coverage, style.blend);
        }
        self.touched.clear();
    }

    fn fill_radial(&mut self, gradient: &RadialGradient) {
        let extent = gradient.extent();
        if extent <= 0.0 {
            return;
        }
        let (w, h) = (self.target.width as i64, self.target.height as i64);
        let [cx, cy] = gradient.center;
        let min_x = ((cx - extent).floor() as i64).max(0);
        let max_x = ((cx + extent).ceil() as i64).min(w - 1);
        let min_y = ((cy - extent).floor() as i64).max(0);
        let max_y = ((cy + extent).ceil() as i64).min(h - 1);

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if d > extent {
                    continue;
                }
                let color = gradient.color_at(d);
                self.target.blend(px, py, &color, 1.0, gradient.blend);
            }
        }
    }
}

/// A recorded draw command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    PutPixels { width: u32, height: u32 },
    Stroke {
        points: Vec<StrokePoint>,
        style: StrokeStyle,
    },
    Radial(RadialGradient),
}

/// Canvas that records commands instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Number of recorded strokes.
    pub fn stroke_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .count()
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn put_pixels(&mut self, pixels: &PixelBuffer) {
        self.commands.push(DrawCommand::PutPixels {
            width: pixels.width,
            height: pixels.height,
        });
    }

    fn stroke(&mut self, points: &[StrokePoint], style: &StrokeStyle) {
        self.commands.push(DrawCommand::Stroke {
            points: points.to_vec(),
            style: *style,
        });
    }

    fn fill_radial(&mut self, gradient: &RadialGradient) {
        self.commands.push(DrawCommand::Radial(gradient.clone()));
    }
}
