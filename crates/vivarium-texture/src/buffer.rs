//! RGBA8 pixel buffers.

use crate::color::{BlendMode, Color};
use crate::error::SurfaceError;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A contiguous, row-major RGBA8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Byte size of a `width` x `height` buffer.
    pub fn byte_len(width: u32, height: u32) -> Result<usize, SurfaceError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|p| p.checked_mul(BYTES_PER_PIXEL))
            .ok_or(SurfaceError::DimensionOverflow { width, height })
    }

    /// Allocate a transparent buffer, reporting allocation failure.
    pub fn try_new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Self::try_new_within(width, height, None)
    }

    /// Allocate a transparent buffer no larger than `limit` bytes.
    ///
    /// Exceeding `limit` is reported the same way as a failed reservation.
    pub fn try_new_within(
        width: u32,
        height: u32,
        limit: Option<usize>,
    ) -> Result<Self, SurfaceError> {
        let bytes = Self::byte_len(width, height)?;
        let failed = SurfaceError::Allocation {
            width,
            height,
            bytes,
        };
        if limit.is_some_and(|limit| bytes > limit) {
            return Err(failed);
        }

        let mut data = Vec::new();
        data.try_reserve_exact(bytes).map_err(|_| failed)?;
        data.resize(bytes, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Allocate a buffer filled with one pixel value.
    ///
    /// Aborts on allocation failure like any `Vec`; use [`PixelBuffer::try_new`]
    /// for caller-controlled sizes.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// Get a pixel at the given coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Set a pixel at the given coordinates.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Blend a color into a pixel; coordinates outside the buffer are ignored.
    #[inline]
    pub fn blend(&mut self, x: i64, y: i64, color: &Color, opacity: f64, mode: BlendMode) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let out = mode.blend(self.get(x, y), color, opacity);
        self.set(x, y, out);
    }

    /// Iterate over alpha values.
    pub fn alphas(&self) -> impl Iterator<Item = u8> + '_ {
        self.data.chunks_exact(BYTES_PER_PIXEL).map(|p| p[3])
    }

    /// Sample with bilinear interpolation at continuous pixel coordinates.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> [u8; 4] {
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let c00 = self.get(x0, y0);
        let c10 = self.get(x1, y0);
        let c01 = self.get(x0, y1);
        let c11 = self.get(x1, y1);

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = c00[c] as f64 + (c10[c] as f64 - c00[c] as f64) * fx;
            let bottom = c01[c] as f64 + (c11[c] as f64 - c01[c] as f64) * fx;
            out[c] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Bilinearly resample into a new `width` x `height` buffer.
    pub fn try_resample(&self, width: u32, height: u32) -> Result<PixelBuffer, SurfaceError> {
        let mut out = PixelBuffer::try_new(width, height)?;
        if self.width == 0 || self.height == 0 {
            return Ok(out);
        }
        let sx = self.width as f64 / width.max(1) as f64;
        let sy = self.height as f64 / height.max(1) as f64;
        for y in 0..height {
            let src_y = (y as f64 + 0.5) * sy - 0.5;
            for x in 0..width {
                let src_x = (x as f64 + 0.5) * sx - 0.5;
                out.set(x, y, self.sample_bilinear(src_x, src_y));
            }
        }
        Ok(out)
    }

    /// BLAKE3 hex digest of dimensions and pixel data.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.width.to_le_bytes());
        hasher.update(&self.height.to_le_bytes());
        hasher.update(&self.data);
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_is_transparent() {
        let buf = PixelBuffer::try_new(4, 3).unwrap();
        assert_eq!(buf.data.len(), 48);
        assert!(buf.alphas().all(|a| a == 0));
    }

    #[test]
    fn test_limit_reports_allocation_error() {
        let err = PixelBuffer::try_new_within(100, 100, Some(1000)).unwrap_err();
        assert_eq!(
            err,
            SurfaceError::Allocation {
                width: 100,
                height: 100,
                bytes: 40_000
            }
        );
        assert!(PixelBuffer::try_new_within(10, 10, Some(400)).is_ok());
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut buf = PixelBuffer::try_new(5, 5).unwrap();
        buf.set(4, 2, [1, 2, 3, 4]);
        assert_eq!(buf.get(4, 2), [1, 2, 3, 4]);
        assert_eq!(buf.get(2, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn test_blend_out_of_bounds_ignored() {
        let mut buf = PixelBuffer::filled(2, 2, [9, 9, 9, 255]);
        let before = buf.clone();
        buf.blend(-1, 0, &Color::rgb(255.0, 0.0, 0.0), 1.0, BlendMode::Normal);
        buf.blend(0, 2, &Color::rgb(255.0, 0.0, 0.0), 1.0, BlendMode::Normal);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_resample_uniform_stays_uniform() {
        let buf = PixelBuffer::filled(3, 2, [40, 50, 60, 255]);
        let up = buf.try_resample(12, 8).unwrap();
        assert_eq!((up.width, up.height), (12, 8));
        for y in 0..8 {
            for x in 0..12 {
                assert_eq!(up.get(x, y), [40, 50, 60, 255]);
            }
        }
    }

    #[test]
    fn test_content_hash_tracks_pixels() {
        let a = PixelBuffer::filled(2, 2, [1, 1, 1, 255]);
        let mut b = a.clone();
        assert_eq!(a.content_hash(), b.content_hash());
        b.set(0, 0, [2, 1, 1, 255]);
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
