//! Vivarium Surface Synthesis Engine
//!
//! This crate procedurally synthesizes organic surfaces (mottled tissue,
//! bark, flesh) and grows vein, root, and vine networks across them from a
//! handful of numbers: seed, noise scale, vein count, and growth level.
//! Output is byte-identical for identical requests.
//!
//! # Features
//!
//! - **Noise**: seeded permutation tables, 2D simplex noise, and fBm
//! - **Mottled base**: two fBm fields mapped through a palette ramp
//! - **Vein networks**: noise-driven tapering branches with tendrils and leaves
//! - **Light response**: additive scattering glow and specular core
//! - **Texture cache**: keyed reuse with growth-level invalidation
//! - **Dimension safety**: ceiling clamp, budget downscale, and allocation retry
//!
//! # Example
//!
//! ```
//! use vivarium_spec::{EngineConfig, LightSpec, SurfaceRequest, VeinStyle};
//! use vivarium_texture::SurfaceEngine;
//!
//! let mut engine = SurfaceEngine::new(EngineConfig::default());
//! let request = SurfaceRequest::new(128, 96)
//!     .with_seed(42)
//!     .with_veins(4, VeinStyle::Root)
//!     .with_light(LightSpec::new([64.0, 48.0], 60.0));
//!
//! let first = engine.render(Some("panel"), &request);
//! let again = engine.render(Some("panel"), &request);
//! assert!(!first.cache_hit);
//! assert!(again.cache_hit);
//! assert_eq!(first.image.width, 128);
//! ```
//!
//! # Determinism
//!
//! - Same request + same seed = byte-identical pixels
//! - The permutation table is built by a fixed LCG shuffle
//! - PCG32 drives vein placement through BLAKE3-derived stream seeds
//! - The `parallel` feature splits the base by rows and does not change output

pub mod buffer;
pub mod cache;
pub mod canvas;
pub mod color;
pub mod engine;
pub mod error;
pub mod light;
pub mod mottled;
pub mod noise;
pub mod rng;
pub mod safety;
pub mod veins;

// Re-export main types for convenience
pub use buffer::PixelBuffer;
pub use cache::{CacheStats, TextureCache};
pub use canvas::{Canvas, RasterCanvas, RecordingCanvas, StrokePoint, StrokeStyle};
pub use color::{BlendMode, Color};
pub use engine::{BaseRender, RenderOutcome, SurfaceEngine};
pub use error::SurfaceError;
pub use light::{composite, LightResponse};
pub use mottled::MottledSynthesizer;
pub use noise::{fbm, evaluate, Fbm, Noise2D, NoiseProbe, PermutationTable, SimplexNoise};
pub use rng::DeterministicRng;
pub use safety::{plan_dimensions, SurfacePlan};
pub use veins::{BranchTask, GrowthReport, VeinGrower, VeinProfile};
