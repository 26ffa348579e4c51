//! The decoded font view consumed by the renderer.
//!
//! Parsing font binaries is out of scope: a loader (or a test) decodes the
//! COLR, CPAL and fvar tables into [`ColorFont`] and supplies outlines
//! through [`OutlineSource`]. Everything here is read-only for the lifetime
//! of a render.

use crate::canvas::PathPen;
use crate::color::Palette;
use crate::paint::Paint;
use crate::variations::ItemVariationStore;
use kurbo::Rect;
use smol_str::SmolStr;
use std::collections::HashMap;

/// Glyph extents in the bearing form outline sources report: `y_bearing` is
/// the top of the glyph and `height` grows downward (negative for ink above
/// the baseline).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphExtents {
    pub x_bearing: f32,
    pub y_bearing: f32,
    pub width: f32,
    pub height: f32,
}

impl GlyphExtents {
    /// Converts to a min/max rectangle in font units.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.x_bearing as f64,
            (self.y_bearing + self.height) as f64,
            (self.x_bearing + self.width) as f64,
            self.y_bearing as f64,
        )
    }
}

/// One COLRv0 layer: an outline glyph filled with a palette color.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub glyph: SmolStr,
    pub palette_index: u16,
}

impl LayerRecord {
    pub fn new(glyph: impl Into<SmolStr>, palette_index: u16) -> LayerRecord {
        LayerRecord {
            glyph: glyph.into(),
            palette_index,
        }
    }
}

/// Supplies glyph outlines and extents at a normalized design-space
/// location. This is the seam where a font-parsing collaborator plugs in.
pub trait OutlineSource {
    /// Drives `glyph`'s outline into `pen`. Returns false when the glyph has
    /// no outline, in which case the pen must be left untouched.
    fn draw_outline(&self, glyph: &str, coords: &[f32], pen: &mut dyn PathPen) -> bool;

    /// The glyph's extents, or `None` when it has no outline.
    fn extents(&self, glyph: &str, coords: &[f32]) -> Option<GlyphExtents>;
}

/// A decoded view of one font's color tables.
pub struct ColorFont {
    pub units_per_em: u16,
    /// Glyph names in glyph-id order.
    pub glyph_order: Vec<SmolStr>,
    /// CPAL palettes; the active one is chosen per render.
    pub palettes: Vec<Palette>,
    /// fvar axis tags, in axis order. Empty for non-variable fonts.
    pub axes: Vec<SmolStr>,
    /// COLRv0 layer lists by base glyph name.
    pub colr_v0: HashMap<SmolStr, Vec<LayerRecord>>,
    /// COLRv1 root paints by base glyph name.
    pub colr_v1: HashMap<SmolStr, Paint>,
    /// The flat COLRv1 layer list addressed by `ColrLayers` paints.
    pub layer_list: Vec<Paint>,
    pub var_store: Option<ItemVariationStore>,
    outline_source: Box<dyn OutlineSource>,
}

impl ColorFont {
    pub fn new(outline_source: Box<dyn OutlineSource>) -> ColorFont {
        ColorFont {
            units_per_em: 1000,
            glyph_order: Vec::new(),
            palettes: Vec::new(),
            axes: Vec::new(),
            colr_v0: HashMap::new(),
            colr_v1: HashMap::new(),
            layer_list: Vec::new(),
            var_store: None,
            outline_source,
        }
    }

    pub fn glyph_name(&self, gid: u32) -> Option<&SmolStr> {
        self.glyph_order.get(gid as usize)
    }

    pub fn glyph_id(&self, name: &str) -> Option<u32> {
        self.glyph_order
            .iter()
            .position(|g| g == name)
            .map(|gid| gid as u32)
    }

    pub fn axis_index(&self, tag: &str) -> Option<usize> {
        self.axes.iter().position(|axis| axis == tag)
    }

    pub(crate) fn draw_outline(&self, glyph: &str, coords: &[f32], pen: &mut dyn PathPen) -> bool {
        self.outline_source.draw_outline(glyph, coords, pen)
    }

    fn outline_bounds(&self, glyph: &str, coords: &[f32]) -> Option<Rect> {
        self.outline_source
            .extents(glyph, coords)
            .map(GlyphExtents::to_rect)
    }

    /// The glyph's extent rectangle at `coords`.
    ///
    /// COLRv1 and plain glyphs report their own outline bounds; a COLRv0
    /// glyph reports the union over its layer outlines.
    pub fn glyph_bounds(&self, glyph: &str, coords: &[f32]) -> Option<Rect> {
        if self.colr_v1.contains_key(glyph) || !self.colr_v0.contains_key(glyph) {
            return self.outline_bounds(glyph, coords);
        }
        self.colr_v0[glyph]
            .iter()
            .filter_map(|layer| self.outline_bounds(&layer.glyph, coords))
            .reduce(|a, b| a.union(b))
    }
}
