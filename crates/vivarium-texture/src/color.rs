//! Color utilities for surface synthesis.

use vivarium_spec::Rgb;

/// RGBA color with f64 components.
///
/// RGB is in 0-255 units to match palette tables; alpha is 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    /// Create an opaque color.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color with alpha.
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black.
    pub const fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Create from a palette triple.
    pub fn from_rgb8(rgb: Rgb) -> Self {
        Self::rgb(rgb[0] as f64, rgb[1] as f64, rgb[2] as f64)
    }

    /// Create from an 8-bit RGBA pixel.
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        Self::rgba(
            rgba[0] as f64,
            rgba[1] as f64,
            rgba[2] as f64,
            rgba[3] as f64 / 255.0,
        )
    }

    /// Replace alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Linearly interpolate between two colors.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Add `amount` to every color channel.
    pub fn offset(&self, amount: f64) -> Color {
        Color {
            r: self.r + amount,
            g: self.g + amount,
            b: self.b + amount,
            a: self.a,
        }
    }

    /// Multiply color channels by a scalar.
    pub fn scale(&self, factor: f64) -> Color {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    /// Convert to 8-bit RGBA, clamping every channel.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a * 255.0),
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Round and clamp a 0-255 channel value. Non-finite values become 0.
#[inline]
pub fn channel(v: f64) -> u8 {
    if v.is_finite() {
        v.round().clamp(0.0, 255.0) as u8
    } else {
        0
    }
}

/// How a source color combines with the pixel beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over alpha compositing.
    #[default]
    Normal,
    /// Additive ("lighter") compositing weighted by source alpha.
    Add,
}

impl BlendMode {
    /// Blend `src` over an 8-bit destination pixel with extra `opacity`.
    pub fn blend(&self, dst: [u8; 4], src: &Color, opacity: f64) -> [u8; 4] {
        let sa = (src.a * opacity).clamp(0.0, 1.0);
        if sa <= 0.0 {
            return dst;
        }
        let d = Color::from_rgba8(dst);
        match self {
            BlendMode::Normal => {
                let out_a = sa + d.a * (1.0 - sa);
                if out_a <= 0.0 {
                    return [0, 0, 0, 0];
                }
                let mix = |s: f64, dc: f64| (s * sa + dc * d.a * (1.0 - sa)) / out_a;
                Color::rgba(mix(src.r, d.r), mix(src.g, d.g), mix(src.b, d.b), out_a).to_rgba8()
            }
            BlendMode::Add => Color::rgba(
                d.r + src.r * sa,
                d.g + src.g * sa,
                d.b + src.b * sa,
                (d.a + sa).min(1.0),
            )
            .to_rgba8(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        let black = Color::black();
        let white = Color::rgb(255.0, 255.0, 255.0);

        let mid = black.lerp(&white, 0.5);
        assert!((mid.r - 127.5).abs() < 1e-10);
        assert!((mid.g - 127.5).abs() < 1e-10);
        assert!((mid.b - 127.5).abs() < 1e-10);
    }

    #[test]
    fn test_channel_clamps() {
        assert_eq!(channel(-20.0), 0);
        assert_eq!(channel(300.0), 255);
        assert_eq!(channel(f64::NAN), 0);
        assert_eq!(channel(127.6), 128);
    }

    #[test]
    fn test_normal_blend_opaque_replaces() {
        let out = BlendMode::Normal.blend([10, 20, 30, 255], &Color::rgb(200.0, 100.0, 50.0), 1.0);
        assert_eq!(out, [200, 100, 50, 255]);
    }

    #[test]
    fn test_normal_blend_onto_transparent() {
        let out = BlendMode::Normal.blend([0, 0, 0, 0], &Color::rgb(200.0, 100.0, 50.0), 0.5);
        assert_eq!(out, [200, 100, 50, 128]);
    }

    #[test]
    fn test_add_blend_saturates() {
        let out = BlendMode::Add.blend([250, 10, 0, 255], &Color::rgb(100.0, 100.0, 100.0), 1.0);
        assert_eq!(out, [255, 110, 100, 255]);
    }

    #[test]
    fn test_zero_opacity_is_noop() {
        let dst = [1, 2, 3, 4];
        assert_eq!(BlendMode::Normal.blend(dst, &Color::rgb(255.0, 0.0, 0.0), 0.0), dst);
    }
}
