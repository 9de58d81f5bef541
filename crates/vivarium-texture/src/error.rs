//! Error types for surface synthesis.
//!
//! These errors describe resource conditions. The render path recovers from
//! all of them locally (see [`crate::safety`]); they are public so callers of
//! the low-level buffer API can observe them.

use thiserror::Error;

/// Resource errors raised while preparing a surface buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// A buffer could not be reserved, or would exceed the working-memory limit.
    #[error("cannot allocate {width}x{height} surface ({bytes} bytes)")]
    Allocation {
        width: u32,
        height: u32,
        bytes: usize,
    },

    /// The byte size of the buffer does not fit in `usize`.
    #[error("surface dimensions {width}x{height} overflow the address space")]
    DimensionOverflow { width: u32, height: u32 },
}

impl SurfaceError {
    /// Stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            SurfaceError::Allocation { .. } => "SURFACE_001",
            SurfaceError::DimensionOverflow { .. } => "SURFACE_002",
        }
    }

    /// Error category for grouping related errors.
    pub fn category(&self) -> &'static str {
        "surface"
    }
}
