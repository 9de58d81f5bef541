//! Dimension safety plan.
//!
//! Caller-supplied sizes are never trusted:
//!
//! 1. Dimensions are clamped to the configured ceiling.
//! 2. If the pixel count still exceeds the budget, both dimensions are
//!    scaled down by the same factor for painting.
//! 3. If the buffer still cannot be allocated, dimensions are halved and the
//!    allocation retried a bounded number of times.
//!
//! Whatever size was painted is resampled back up to the clamped size.
//!
//! Every fallback step logs a warning. None of them fail the render.

use log::warn;
use vivarium_spec::validation::clamp_dimension;
use vivarium_spec::EngineConfig;

use crate::buffer::PixelBuffer;

/// The sizes a render will work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePlan {
    /// Size the caller asked for.
    pub requested: (u32, u32),
    /// Size after the ceiling clamp; defines the sampling coordinate space.
    pub logical: (u32, u32),
    /// Size the base is painted at (logical, scaled to fit the pixel budget).
    pub output: (u32, u32),
}

impl SurfacePlan {
    /// Whether the ceiling clamp changed the requested size.
    pub fn clamped(&self) -> bool {
        self.requested != self.logical
    }

    /// Whether the pixel budget shrank the logical size.
    pub fn downscaled(&self) -> bool {
        self.logical != self.output
    }
}

/// Clamp and budget-scale requested dimensions.
pub fn plan_dimensions(width: u32, height: u32, config: &EngineConfig) -> SurfacePlan {
    let lw = clamp_dimension(width, config.max_width);
    let lh = clamp_dimension(height, config.max_height);
    if (lw, lh) != (width, height) {
        warn!(
            "surface {}x{} exceeds ceiling {}x{}, clamped to {}x{}",
            width, height, config.max_width, config.max_height, lw, lh
        );
    }

    let pixels = lw as u64 * lh as u64;
    let budget = config.pixel_budget.max(1);
    let (ow, oh) = if pixels > budget {
        let factor = (budget as f64 / pixels as f64).sqrt();
        let mut ow = ((lw as f64 * factor).floor() as u32).max(1);
        let mut oh = ((lh as f64 * factor).floor() as u32).max(1);
        // Floating point can leave us one row over budget
        while ow as u64 * oh as u64 > budget && (ow > 1 || oh > 1) {
            if ow >= oh {
                ow -= 1;
            } else {
                oh -= 1;
            }
        }
        warn!(
            "surface {}x{} exceeds pixel budget {}, scaled to {}x{}",
            lw, lh, budget, ow, oh
        );
        (ow, oh)
    } else {
        (lw, lh)
    };

    SurfacePlan {
        requested: (width, height),
        logical: (lw, lh),
        output: (ow, oh),
    }
}

/// A working buffer and how many halvings it took to get it.
#[derive(Debug)]
pub struct Allocation {
    pub buffer: PixelBuffer,
    pub retries: u32,
}

/// Allocate a `width` x `height` buffer, halving on failure.
///
/// The loop runs at most `max_alloc_retries + 1` times. If even that fails,
/// a single pixel is returned so the caller always has something to paint.
pub fn allocate_with_retry(width: u32, height: u32, config: &EngineConfig) -> Allocation {
    let (mut w, mut h) = (width.max(1), height.max(1));
    for attempt in 0..=config.max_alloc_retries {
        match PixelBuffer::try_new_within(w, h, config.working_memory_limit) {
            Ok(buffer) => {
                return Allocation {
                    buffer,
                    retries: attempt,
                }
            }
            Err(err) => {
                let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));
                warn!("{} [{}], retrying at {}x{}", err, err.code(), nw, nh);
                if (nw, nh) == (w, h) {
                    break;
                }
                w = nw;
                h = nh;
            }
        }
    }
    warn!(
        "surface allocation exhausted retries for {}x{}, using a single pixel",
        width, height
    );
    Allocation {
        buffer: PixelBuffer::filled(1, 1, [0, 0, 0, 0]),
        retries: config.max_alloc_retries,
    }
}

/// Resample `buffer` up to `target` if it came out smaller.
///
/// If the larger buffer cannot be allocated either, the small one is kept.
pub fn restore_size(buffer: PixelBuffer, target: (u32, u32)) -> PixelBuffer {
    if (buffer.width, buffer.height) == target {
        return buffer;
    }
    match buffer.try_resample(target.0, target.1) {
        Ok(resampled) => resampled,
        Err(err) => {
            warn!(
                "{} [{}], keeping {}x{} surface",
                err,
                err.code(),
                buffer.width,
                buffer.height
            );
            buffer
        }
    }
}
