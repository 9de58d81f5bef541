//! Color palettes supplied by the caller.
//!
//! The engine never owns palette tables. A scene hands over a [`PaletteSet`]
//! and each request picks an entry by id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Palette id used when a request does not name one.
pub const DEFAULT_PALETTE_ID: &str = "default";

/// An 8-bit RGB triple.
pub type Rgb = [u8; 3];

/// The six colors a surface is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    /// Dominant tissue color.
    pub base: Rgb,
    /// Raised, lighter regions.
    pub mid: Rgb,
    /// Peaks of the structure field (reached at 30% strength only).
    pub highlight: Rgb,
    /// Troughs of the structure field.
    pub shadow: Rgb,
    /// Branch body color.
    pub vein: Rgb,
    /// Thin highlight pass along branches.
    pub vein_highlight: Rgb,
}

impl ColorPalette {
    /// Dark, slightly purple flesh tones.
    pub const FLESH: ColorPalette = ColorPalette {
        base: [28, 22, 26],
        mid: [44, 34, 38],
        highlight: [58, 48, 52],
        shadow: [14, 10, 12],
        vein: [72, 28, 34],
        vein_highlight: [120, 62, 66],
    };

    /// Build a palette from base and highlight, deriving the rest.
    ///
    /// `mid` sits halfway, `shadow` at half of `base`, and the vein colors
    /// are pushed toward red.
    pub fn from_base_highlight(base: Rgb, highlight: Rgb) -> Self {
        let mix = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;
        let mid = [
            mix(base[0], highlight[0]),
            mix(base[1], highlight[1]),
            mix(base[2], highlight[2]),
        ];
        let shadow = [base[0] / 2, base[1] / 2, base[2] / 2];
        let vein = [
            base[0].saturating_mul(2).saturating_add(16),
            base[1],
            base[2].saturating_add(4),
        ];
        let vein_highlight = [
            highlight[0].saturating_add(48),
            highlight[1].saturating_add(12),
            highlight[2].saturating_add(12),
        ];
        Self {
            base,
            mid,
            highlight,
            shadow,
            vein,
            vein_highlight,
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::FLESH
    }
}

/// Caller-owned palette registry keyed by palette id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteSet {
    /// Returned for ids that are not registered.
    #[serde(default)]
    pub fallback: ColorPalette,
    #[serde(default)]
    palettes: BTreeMap<String, ColorPalette>,
}

impl PaletteSet {
    /// Create an empty set with the given fallback palette.
    pub fn new(fallback: ColorPalette) -> Self {
        Self {
            fallback,
            palettes: BTreeMap::new(),
        }
    }

    /// Register (or replace) a palette.
    pub fn insert(&mut self, id: impl Into<String>, palette: ColorPalette) {
        self.palettes.insert(id.into(), palette);
    }

    /// Builder form of [`PaletteSet::insert`].
    pub fn with(mut self, id: impl Into<String>, palette: ColorPalette) -> Self {
        self.insert(id, palette);
        self
    }

    /// Look up a palette; `None` if the id is unknown.
    pub fn get(&self, id: &str) -> Option<&ColorPalette> {
        self.palettes.get(id)
    }

    /// Look up a palette, falling back to [`PaletteSet::fallback`].
    pub fn resolve(&self, id: &str) -> &ColorPalette {
        self.palettes.get(id).unwrap_or(&self.fallback)
    }

    /// Whether an id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.palettes.contains_key(id)
    }

    /// Number of registered palettes.
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Whether no palettes are registered.
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}

impl Default for PaletteSet {
    fn default() -> Self {
        Self::new(ColorPalette::FLESH).with(DEFAULT_PALETTE_ID, ColorPalette::FLESH)
    }
}
