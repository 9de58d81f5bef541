//! Main entry point for surface synthesis.
//!
//! [`SurfaceEngine`] owns the memoized permutation tables, the palette set,
//! and the texture cache, and runs the full pipeline:
//!
//! 1. Plan dimensions and allocate a working buffer ([`crate::safety`]).
//! 2. Paint the mottled base ([`crate::mottled`]) and resample it to the
//!    clamped size.
//! 3. Grow and stroke the vein network ([`crate::veins`]).
//! 4. Cache the result under the caller's key ([`crate::cache`]).
//! 5. Add the light response on top, every call ([`crate::light`]).
//!
//! Steps 1 to 3 are skipped on a cache hit. Light is never cached, so a
//! moving light costs one overlay per frame.

use std::sync::Arc;

use log::{debug, warn};
use vivarium_spec::validation::clamp_dimension;
use vivarium_spec::{ColorPalette, EngineConfig, PaletteSet, SurfaceRequest};

use crate::buffer::PixelBuffer;
use crate::cache::TextureCache;
use crate::canvas::RasterCanvas;
use crate::light::{composite, LightResponse};
use crate::mottled::MottledSynthesizer;
use crate::noise::{NoiseProbe, PermutationCache, PermutationTable, SimplexNoise};
use crate::safety::{allocate_with_retry, plan_dimensions, restore_size, SurfacePlan};
use crate::veins::stroke::VeinPaint;
use crate::veins::{plant_roots, VeinGrower, VeinProfile};

/// An uncached base render and what it took to produce it.
#[derive(Debug, Clone)]
pub struct BaseRender {
    pub buffer: PixelBuffer,
    pub plan: SurfacePlan,
    /// Allocation halvings before a buffer was obtained.
    pub alloc_retries: u32,
    pub branches: usize,
    pub segments: usize,
    /// Branch tasks dropped by the per-vein cap.
    pub dropped_tasks: usize,
}

/// The result of [`SurfaceEngine::render`].
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Final image, with the light response applied if any.
    pub image: Arc<PixelBuffer>,
    /// The cacheable base without light.
    pub base: Arc<PixelBuffer>,
    pub cache_hit: bool,
    /// Whether a light overlay was composited.
    pub lit: bool,
}

/// Everything one base render needs, borrowed apart from the cache.
struct Synthesis<'a> {
    config: &'a EngineConfig,
    noise: SimplexNoise,
    palette: ColorPalette,
}

impl Synthesis<'_> {
    fn run(&self, request: &SurfaceRequest) -> BaseRender {
        let plan = plan_dimensions(request.width, request.height, self.config);
        let mut alloc = allocate_with_retry(plan.output.0, plan.output.1, self.config);

        MottledSynthesizer::new(
            self.noise.clone(),
            self.palette,
            request.noise_scale,
            self.config.octaves,
            request.time,
        )
        .paint(&mut alloc.buffer, plan.logical);
        // Both budget and allocation fallbacks paint small, then resample up
        let mut buffer = restore_size(alloc.buffer, plan.logical);

        let (lw, lh) = (plan.logical.0 as f64, plan.logical.1 as f64);
        let (mut branches, mut segments, mut dropped_tasks) = (0, 0, 0);

        let roots = plant_roots(request, (lw, lh), self.config);
        if !roots.is_empty() {
            let grower = VeinGrower::new(self.noise.clone(), VeinProfile::for_request(request), (lw, lh))
                .with_target(request.target)
                .with_thickness_floor(self.config.thickness_floor)
                .with_max_depth(self.config.max_branch_depth)
                .with_max_branches(self.config.max_branches_per_vein);
            let paint = VeinPaint::from_palette(&self.palette)
                .with_scale((buffer.width as f64 / lw, buffer.height as f64 / lh));

            let mut canvas = RasterCanvas::new(&mut buffer);
            for root in roots {
                let report = grower.grow_and_draw(root, &paint, &mut canvas);
                branches += report.branches.len();
                segments += report.segment_count();
                dropped_tasks += report.dropped_tasks;
            }
        }

        debug!(
            "rendered {}x{} surface (logical {}x{}): {} branches, {} segments",
            buffer.width, buffer.height, plan.logical.0, plan.logical.1, branches, segments
        );
        BaseRender {
            buffer,
            plan,
            alloc_retries: alloc.retries,
            branches,
            segments,
            dropped_tasks,
        }
    }
}

/// The surface synthesis pipeline.
#[derive(Debug)]
pub struct SurfaceEngine {
    config: EngineConfig,
    palettes: PaletteSet,
    permutations: PermutationCache,
    cache: TextureCache,
    probe: NoiseProbe,
}

impl SurfaceEngine {
    /// Create an engine; `config` is sanitized first.
    pub fn new(config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            cache: TextureCache::from_config(&config),
            config,
            palettes: PaletteSet::default(),
            permutations: PermutationCache::new(),
            probe: NoiseProbe::new(),
        }
    }

    /// Replace the palette set.
    pub fn with_palettes(mut self, palettes: PaletteSet) -> Self {
        self.palettes = palettes;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn palettes_mut(&mut self) -> &mut PaletteSet {
        &mut self.palettes
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Noise evaluations performed by base renders so far.
    pub fn noise_evaluations(&self) -> u64 {
        self.probe.count()
    }

    /// Memoized permutation table for `seed`.
    pub fn permutation(&mut self, seed: u32) -> Arc<PermutationTable> {
        self.permutations.get_or_create(seed)
    }

    fn palette_for(&self, id: &str) -> ColorPalette {
        if !self.palettes.contains(id) {
            warn!("unknown palette {:?}, using fallback", id);
        }
        *self.palettes.resolve(id)
    }

    /// Render the base layer without touching the cache.
    pub fn render_base(&mut self, request: &SurfaceRequest) -> BaseRender {
        let request = request.sanitized();
        let palette = self.palette_for(&request.palette_id);
        let table = self.permutations.get_or_create(request.seed);
        Synthesis {
            config: &self.config,
            noise: SimplexNoise::from_table(table).with_probe(self.probe.clone()),
            palette,
        }
        .run(&request)
    }

    /// Render a surface.
    ///
    /// With a `key`, the base layer is cached and reused while the growth
    /// level stays within tolerance and the structural request is unchanged.
    /// Without one, every call renders from scratch.
    pub fn render(&mut self, key: Option<&str>, request: &SurfaceRequest) -> RenderOutcome {
        let request = request.sanitized();
        let palette = self.palette_for(&request.palette_id);
        let table = self.permutations.get_or_create(request.seed);
        let synthesis = Synthesis {
            config: &self.config,
            noise: SimplexNoise::from_table(Arc::clone(&table)).with_probe(self.probe.clone()),
            palette,
        };

        let (base, cache_hit) = match key {
            Some(key) => self.cache.get_or_render(
                key,
                request.growth_level,
                &request.fingerprint(),
                || synthesis.run(&request).buffer,
            ),
            None => (Arc::new(synthesis.run(&request).buffer), false),
        };

        let logical = (
            clamp_dimension(request.width, self.config.max_width),
            clamp_dimension(request.height, self.config.max_height),
        );
        let light = request.light.as_ref().and_then(|light| {
            LightResponse::new(light, &palette).map(|response| {
                response
                    // Unprobed: the overlay runs every frame, cached or not
                    .with_noise(SimplexNoise::from_table(Arc::clone(&table)))
                    .with_scale((
                        base.width as f64 / logical.0 as f64,
                        base.height as f64 / logical.1 as f64,
                    ))
            })
        });

        match light {
            Some(light) if light.reaches(base.width, base.height) => {
                let layer = light.render_layer(base.width, base.height);
                RenderOutcome {
                    image: Arc::new(composite(&base, &layer)),
                    base,
                    cache_hit,
                    lit: true,
                }
            }
            _ => RenderOutcome {
                image: Arc::clone(&base),
                base,
                cache_hit,
                lit: false,
            },
        }
    }

    /// Drop one cached surface.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.cache.invalidate(key)
    }

    /// Drop every cached surface and permutation table.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.permutations.clear();
    }
}

impl Default for SurfaceEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vivarium_spec::{LightSpec, VeinStyle};

    fn small_request() -> SurfaceRequest {
        SurfaceRequest::new(48, 32).with_seed(7)
    }

    #[test]
    fn test_render_without_key_never_hits() {
        let mut engine = SurfaceEngine::default();
        let a = engine.render(None, &small_request());
        let b = engine.render(None, &small_request());
        assert!(!a.cache_hit && !b.cache_hit);
        assert_eq!(a.image, b.image);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_base_render_reports_veins() {
        let mut engine = SurfaceEngine::default();
        let render = engine.render_base(&small_request().with_veins(3, VeinStyle::Vessel));
        assert!(render.branches >= 3);
        assert_eq!(render.plan.output, (48, 32));
        assert_eq!((render.buffer.width, render.buffer.height), (48, 32));
    }

    #[test]
    fn test_unknown_palette_falls_back() {
        let mut engine = SurfaceEngine::default();
        let a = engine.render(None, &small_request().with_palette("nope"));
        let b = engine.render(None, &small_request());
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_light_leaves_base_untouched() {
        let mut engine = SurfaceEngine::default();
        let lit = engine.render(
            Some("panel"),
            &small_request().with_light(LightSpec::new([24.0, 16.0], 20.0)),
        );
        assert!(lit.lit);
        assert_ne!(lit.image, lit.base);

        let dark = engine.render(Some("panel"), &small_request());
        assert!(dark.cache_hit);
        assert!(!dark.lit);
        assert_eq!(dark.image, lit.base);
    }

    #[test]
    fn test_clear_cache_forces_render() {
        let mut engine = SurfaceEngine::default();
        engine.render(Some("k"), &small_request());
        engine.clear_cache();
        assert!(!engine.render(Some("k"), &small_request()).cache_hit);
    }
}
