//! Light-response overlay.
//!
//! A light adds a broad warm scattering glow, a tight specular core, and a
//! few faint secondary veins inside the lit area. Everything is drawn into a
//! separate transparent layer and added on top of the base, so the base
//! buffer stays cacheable no matter where the light moves.

use std::f64::consts::TAU;

use vivarium_spec::{ColorPalette, LightSpec};

use crate::buffer::{PixelBuffer, BYTES_PER_PIXEL};
use crate::canvas::{Canvas, RadialGradient, RasterCanvas, StrokePoint, StrokeStyle};
use crate::color::{BlendMode, Color};
use crate::noise::{Noise2D, SimplexNoise};

/// Scattering falloff control points, in multiples of the light radius.
const SCATTER_RISE_END: f64 = 0.3;
const SCATTER_PLATEAU_END: f64 = 0.6;
const SCATTER_EXTENT: f64 = 1.3;
const SCATTER_CORE: f64 = 0.6;
const SCATTER_STRENGTH: f64 = 0.35;

const SPECULAR_EXTENT: f64 = 0.25;
const SPECULAR_STRENGTH: f64 = 0.5;

const SECONDARY_VEINS: usize = 3;
/// Secondary veins stay inside this fraction of the radius.
const SECONDARY_REACH: f64 = 0.6;
const SECONDARY_STRENGTH: f64 = 0.25;

const WARM_TINT: Color = Color::rgb(255.0, 140.0, 110.0);
const SPECULAR_TINT: Color = Color::rgb(255.0, 236.0, 226.0);

/// Relative scattering strength at `u` radii from the light.
///
/// Rises from 0.6 at the center to full strength at 0.3, holds until 0.6,
/// then fades linearly to nothing at 1.3.
pub fn scatter_profile(u: f64) -> f64 {
    if !(u >= 0.0) {
        return SCATTER_CORE;
    }
    if u < SCATTER_RISE_END {
        SCATTER_CORE + (1.0 - SCATTER_CORE) * u / SCATTER_RISE_END
    } else if u <= SCATTER_PLATEAU_END {
        1.0
    } else if u < SCATTER_EXTENT {
        1.0 - (u - SCATTER_PLATEAU_END) / (SCATTER_EXTENT - SCATTER_PLATEAU_END)
    } else {
        0.0
    }
}

/// Light-response pass for one light.
#[derive(Debug, Clone)]
pub struct LightResponse {
    light: LightSpec,
    warm: Color,
    vein: Color,
    noise: Option<SimplexNoise>,
    scale: (f64, f64),
}

impl LightResponse {
    /// `None` if the light position is not finite.
    pub fn new(light: &LightSpec, palette: &ColorPalette) -> Option<Self> {
        let light = light.sanitized()?;
        Some(Self {
            light,
            warm: Color::from_rgb8(palette.highlight).lerp(&WARM_TINT, 0.6),
            vein: Color::from_rgb8(palette.vein_highlight).lerp(&WARM_TINT, 0.3),
            noise: None,
            scale: (1.0, 1.0),
        })
    }

    /// Place secondary veins with `noise`. Without it none are drawn.
    pub fn with_noise(mut self, noise: SimplexNoise) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Map light coordinates onto a buffer of a different size.
    pub fn with_scale(mut self, scale: (f64, f64)) -> Self {
        self.scale = scale;
        self
    }

    /// Light center in buffer pixels.
    pub fn center(&self) -> [f64; 2] {
        [
            self.light.position[0] * self.scale.0,
            self.light.position[1] * self.scale.1,
        ]
    }

    /// Light radius in buffer pixels.
    pub fn radius(&self) -> f64 {
        self.light.radius * self.scale.0.min(self.scale.1)
    }

    /// Whether the glow touches a `width` x `height` buffer at all.
    pub fn reaches(&self, width: u32, height: u32) -> bool {
        let [cx, cy] = self.center();
        let extent = self.radius() * SCATTER_EXTENT;
        let nx = cx.clamp(0.0, width as f64);
        let ny = cy.clamp(0.0, height as f64);
        let (dx, dy) = (cx - nx, cy - ny);
        dx * dx + dy * dy <= extent * extent
    }

    fn scatter_gradient(&self) -> RadialGradient {
        let r = self.radius();
        let strength = SCATTER_STRENGTH * self.light.intensity;
        [0.0, SCATTER_RISE_END, SCATTER_PLATEAU_END, SCATTER_EXTENT]
            .into_iter()
            .fold(
                RadialGradient::new(self.center(), BlendMode::Add),
                |g, u| g.stop(u * r, self.warm.with_alpha(scatter_profile(u) * strength)),
            )
    }

    fn specular_gradient(&self) -> RadialGradient {
        let r = self.radius();
        let peak = SPECULAR_STRENGTH * self.light.intensity;
        RadialGradient::new(self.center(), BlendMode::Add)
            .stop(0.0, SPECULAR_TINT.with_alpha(peak))
            .stop(SPECULAR_EXTENT * 0.5 * r, SPECULAR_TINT.with_alpha(peak * 0.25))
            .stop(SPECULAR_EXTENT * r, SPECULAR_TINT.with_alpha(0.0))
    }

    /// Short strokes placed by noise around the light, inside the lit core.
    pub fn secondary_veins(&self) -> Vec<Vec<StrokePoint>> {
        let Some(noise) = &self.noise else {
            return Vec::new();
        };
        let [cx, cy] = self.center();
        let r = self.radius();
        // Noise coordinates follow the light slowly so veins do not flicker
        let (nx, ny) = (self.light.position[0] * 0.01, self.light.position[1] * 0.01);

        (0..SECONDARY_VEINS)
            .map(|i| {
                let k = i as f64 * 7.31;
                let unit = |ch: f64| noise.sample_01(nx + k + ch * 13.7, ny - k + ch * 5.3);
                let place = unit(0.0) * TAU;
                let dist = unit(1.0) * r * 0.35;
                let mut heading = unit(2.0) * TAU;
                let length = r * (0.08 + unit(3.0) * 0.12);

                let mut p = [cx + place.cos() * dist, cy + place.sin() * dist];
                let mut points = vec![StrokePoint::new(p[0], p[1], 1.6)];
                for s in 1..4 {
                    heading += (unit(4.0 + s as f64) - 0.5) * 0.8;
                    p = [
                        p[0] + heading.cos() * length / 3.0,
                        p[1] + heading.sin() * length / 3.0,
                    ];
                    if (p[0] - cx).hypot(p[1] - cy) > r * SECONDARY_REACH {
                        break;
                    }
                    points.push(StrokePoint::new(p[0], p[1], 1.6 - s as f64 * 0.35));
                }
                points
            })
            .collect()
    }

    /// Draw the overlay onto `canvas`.
    pub fn draw<C: Canvas>(&self, canvas: &mut C) {
        canvas.fill_radial(&self.scatter_gradient());
        canvas.fill_radial(&self.specular_gradient());
        let style = StrokeStyle::solid(self.vein)
            .with_opacity(SECONDARY_STRENGTH * self.light.intensity)
            .with_blend(BlendMode::Add);
        for vein in self.secondary_veins() {
            canvas.stroke(&vein, &style);
        }
    }

    /// Render the overlay into a fresh transparent `width` x `height` layer.
    pub fn render_layer(&self, width: u32, height: u32) -> PixelBuffer {
        let mut layer = PixelBuffer::filled(width, height, [0, 0, 0, 0]);
        if self.reaches(width, height) {
            self.draw(&mut RasterCanvas::new(&mut layer));
        }
        layer
    }
}

/// Add `layer` onto a copy of `base`. Base alpha is kept.
///
/// Layer color is already weighted by its coverage, so it is added as is.
pub fn composite(base: &PixelBuffer, layer: &PixelBuffer) -> PixelBuffer {
    let mut out = base.clone();
    if base.width == layer.width && base.height == layer.height {
        for (dst, src) in out
            .data
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .zip(layer.data.chunks_exact(BYTES_PER_PIXEL))
        {
            for c in 0..3 {
                dst[c] = dst[c].saturating_add(src[c]);
            }
        }
        return out;
    }
    for y in 0..base.height.min(layer.height) {
        for x in 0..base.width.min(layer.width) {
            let (mut dst, src) = (out.get(x, y), layer.get(x, y));
            for c in 0..3 {
                dst[c] = dst[c].saturating_add(src[c]);
            }
            out.set(x, y, dst);
        }
    }
    out
}
