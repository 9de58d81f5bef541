//! Mottled base layer.
//!
//! Two decorrelated fBm fields are sampled per pixel. The structure field
//! picks a color on a three-segment ramp (shadow, base, mid, damped
//! highlight); the finer detail field nudges every channel by a few levels
//! to break up banding.

use vivarium_spec::ColorPalette;

use crate::buffer::{PixelBuffer, BYTES_PER_PIXEL};
use crate::color::Color;
use crate::noise::{Fbm, Noise2D, SimplexNoise};

/// Upper end of the shadow→base segment.
const RAMP_SHADOW_END: f64 = 0.4;
/// Upper end of the base→mid segment.
const RAMP_MID_END: f64 = 0.7;
/// How far toward `highlight` the top segment may travel.
const HIGHLIGHT_REACH: f64 = 0.3;
/// Channel perturbation of the detail field, in 8-bit levels.
const DETAIL_LEVELS: f64 = 8.0;
/// Detail field frequency relative to the structure field.
const DETAIL_FREQUENCY: f64 = 2.7;
/// Detail field origin offset in noise space.
const DETAIL_ORIGIN: (f64, f64) = (173.31, -91.77);
/// Noise-space drift per second of request time.
const DRIFT_PER_SECOND: (f64, f64) = (0.021, 0.013);

/// Map a structure value in `[0, 1]` onto the palette ramp.
pub fn ramp(palette: &ColorPalette, t: f64) -> Color {
    let shadow = Color::from_rgb8(palette.shadow);
    let base = Color::from_rgb8(palette.base);
    let mid = Color::from_rgb8(palette.mid);
    let highlight = Color::from_rgb8(palette.highlight);

    let t = t.clamp(0.0, 1.0);
    if t < RAMP_SHADOW_END {
        shadow.lerp(&base, t / RAMP_SHADOW_END)
    } else if t < RAMP_MID_END {
        base.lerp(&mid, (t - RAMP_SHADOW_END) / (RAMP_MID_END - RAMP_SHADOW_END))
    } else {
        let u = (t - RAMP_MID_END) / (1.0 - RAMP_MID_END);
        mid.lerp(&highlight, u * HIGHLIGHT_REACH)
    }
}

/// Per-pixel shader for the mottled base.
#[derive(Clone, Debug)]
pub struct MottledSynthesizer {
    structure: Fbm<SimplexNoise>,
    detail: Fbm<SimplexNoise>,
    palette: ColorPalette,
    noise_scale: f64,
    drift: (f64, f64),
}

impl MottledSynthesizer {
    /// Build a shader over `noise`.
    ///
    /// `time` shifts the sampling origin slowly so a surface can breathe
    /// without changing its character.
    pub fn new(
        noise: SimplexNoise,
        palette: ColorPalette,
        noise_scale: f64,
        octaves: u8,
        time: f64,
    ) -> Self {
        let detail_octaves = octaves.saturating_sub(2).max(1);
        Self {
            structure: Fbm::new(noise.clone()).with_octaves(octaves),
            detail: Fbm::new(noise).with_octaves(detail_octaves),
            palette,
            noise_scale,
            drift: (time * DRIFT_PER_SECOND.0, time * DRIFT_PER_SECOND.1),
        }
    }

    /// Structure field in `[0, 1]` at logical pixel coordinates.
    pub fn structure_at(&self, x: f64, y: f64) -> f64 {
        let sx = x * self.noise_scale + self.drift.0;
        let sy = y * self.noise_scale + self.drift.1;
        self.structure.sample_01(sx, sy)
    }

    /// Detail field in `[-1, 1]` at logical pixel coordinates.
    pub fn detail_at(&self, x: f64, y: f64) -> f64 {
        let sx = x * self.noise_scale * DETAIL_FREQUENCY + DETAIL_ORIGIN.0 + self.drift.0;
        let sy = y * self.noise_scale * DETAIL_FREQUENCY + DETAIL_ORIGIN.1 + self.drift.1;
        self.detail.sample(sx, sy)
    }

    /// Shade one pixel at logical coordinates.
    pub fn shade(&self, x: f64, y: f64) -> [u8; 4] {
        let color = ramp(&self.palette, self.structure_at(x, y));
        color
            .offset(self.detail_at(x, y) * DETAIL_LEVELS)
            .with_alpha(1.0)
            .to_rgba8()
    }

    fn shade_row(&self, row: &mut [u8], y: u32, scale: (f64, f64)) {
        let ly = y as f64 * scale.1;
        for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            px.copy_from_slice(&self.shade(x as f64 * scale.0, ly));
        }
    }

    /// Fill `buffer`, mapping its pixels onto a `logical` sized surface.
    ///
    /// A buffer smaller than `logical` samples the same picture at a coarser
    /// grid, so a degraded render still looks like the full one.
    pub fn paint(&self, buffer: &mut PixelBuffer, logical: (u32, u32)) {
        let scale = (
            logical.0 as f64 / buffer.width.max(1) as f64,
            logical.1 as f64 / buffer.height.max(1) as f64,
        );
        let stride = buffer.width as usize * BYTES_PER_PIXEL;
        if stride == 0 {
            return;
        }
        self.paint_rows(&mut buffer.data, stride, scale);
    }

    #[cfg(not(feature = "parallel"))]
    fn paint_rows(&self, data: &mut [u8], stride: usize, scale: (f64, f64)) {
        for (y, row) in data.chunks_mut(stride).enumerate() {
            self.shade_row(row, y as u32, scale);
        }
    }

    /// Rows are independent, so the parallel split cannot change the output.
    #[cfg(feature = "parallel")]
    fn paint_rows(&self, data: &mut [u8], stride: usize, scale: (f64, f64)) {
        use rayon::prelude::*;
        data.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| self.shade_row(row, y as u32, scale));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseProbe;

    fn palette() -> ColorPalette {
        ColorPalette::from_base_highlight([28, 22, 26], [58, 48, 52])
    }

    #[test]
    fn test_ramp_segments() {
        let p = palette();
        assert_eq!(ramp(&p, 0.0).to_rgba8()[..3], p.shadow);
        assert_eq!(ramp(&p, 0.4).to_rgba8()[..3], p.base);
        assert_eq!(ramp(&p, 0.7).to_rgba8()[..3], p.mid);
    }

    #[test]
    fn test_ramp_highlight_is_damped() {
        let p = palette();
        let top = ramp(&p, 1.0);
        let mid = Color::from_rgb8(p.mid);
        let expected = mid.r + (p.highlight[0] as f64 - mid.r) * HIGHLIGHT_REACH;
        assert!((top.r - expected).abs() < 1e-9);
        assert!(top.r < p.highlight[0] as f64);
    }

    #[test]
    fn test_paint_is_opaque_and_deterministic() {
        let synth = MottledSynthesizer::new(SimplexNoise::new(42), palette(), 0.05, 4, 0.0);
        let mut a = PixelBuffer::try_new(32, 16).unwrap();
        let mut b = PixelBuffer::try_new(32, 16).unwrap();
        synth.paint(&mut a, (32, 16));
        synth.paint(&mut b, (32, 16));
        assert_eq!(a, b);
        assert!(a.alphas().all(|alpha| alpha == 255));
    }

    #[test]
    fn test_time_drifts_pattern() {
        let still = MottledSynthesizer::new(SimplexNoise::new(3), palette(), 0.05, 4, 0.0);
        let later = MottledSynthesizer::new(SimplexNoise::new(3), palette(), 0.05, 4, 60.0);
        let moved = (0..64).any(|i| {
            let x = i as f64 * 3.0;
            still.structure_at(x, 7.0) != later.structure_at(x, 7.0)
        });
        assert!(moved);
    }

    #[test]
    fn test_noise_cost_per_pixel() {
        let probe = NoiseProbe::new();
        let noise = SimplexNoise::new(1).with_probe(probe.clone());
        let synth = MottledSynthesizer::new(noise, palette(), 0.05, 4, 0.0);
        let mut buf = PixelBuffer::try_new(10, 10).unwrap();
        synth.paint(&mut buf, (10, 10));
        // 4 structure octaves + 2 detail octaves
        assert_eq!(probe.count(), 100 * 6);
    }
}
