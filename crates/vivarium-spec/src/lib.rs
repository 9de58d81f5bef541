//! Vivarium Surface Spec Library
//!
//! Plain-data types describing what the surface engine should synthesize.
//! Nothing in this crate touches pixels; it only carries the numeric
//! parameters a scene layer hands to the engine each frame.
//!
//! # Overview
//!
//! - [`SurfaceRequest`]: size, palette id, noise scale, vein count, seed,
//!   time, growth level, and an optional light.
//! - [`ColorPalette`] / [`PaletteSet`]: caller-supplied color tables.
//! - [`EngineConfig`]: safety ceilings, cache policy, and growth limits.
//!
//! # Example
//!
//! ```
//! use vivarium_spec::{LightSpec, SurfaceRequest, VeinStyle};
//!
//! let request = SurfaceRequest::new(320, 240)
//!     .with_seed(42)
//!     .with_noise_scale(0.05)
//!     .with_veins(6, VeinStyle::Root)
//!     .with_light(LightSpec::new([160.0, 120.0], 90.0));
//!
//! let clean = request.sanitized();
//! assert_eq!(clean.vein_count, 6);
//! assert_eq!(request.fingerprint(), clean.fingerprint());
//! ```
//!
//! # Sanitizing
//!
//! Requests are never rejected. Every numeric field is clamped into its
//! working range and non-finite values fall back to defaults; see
//! [`SurfaceRequest::sanitized`].

pub mod config;
pub mod palette;
pub mod request;
pub mod validation;

pub use config::{EngineConfig, EvictionPolicy};
pub use palette::{ColorPalette, PaletteSet, Rgb, DEFAULT_PALETTE_ID};
pub use request::{LightSpec, SurfaceRequest, VeinStyle};
