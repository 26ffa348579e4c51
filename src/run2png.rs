//! Renders a pre-shaped glyph run into a PNG.

use crate::canvas::Canvas;
use crate::color::Color;
use crate::draw_glyph::{draw_glyph_run, glyph_run_bounds, GlyphRenderer, PositionedGlyph};
use crate::error::RenderError;
use crate::font::ColorFont;
use crate::raster::RasterCanvas;
use kurbo::{Affine, Rect};

/// Options for rendering a glyph run to PNG.
#[derive(Debug, Clone)]
pub struct Run2PngOptions {
    /// The size of the font in pixels.
    pub font_size: f32,
    /// Padding around the run's bounds, in pixels.
    pub margin: f64,
    /// The fill color for non-color glyphs and the foreground sentinel.
    pub foreground: Color,
    /// The background color; `None` leaves the surface transparent.
    pub background: Option<Color>,
    /// Which CPAL palette resolves color indices.
    pub palette_index: usize,
    /// Normalized variation coordinates, one per fvar axis. Missing
    /// trailing coordinates default to 0.
    pub location: Vec<f32>,
}

impl Run2PngOptions {
    pub fn new(font_size: f32) -> Run2PngOptions {
        Run2PngOptions {
            font_size,
            margin: 20.0,
            foreground: Color::BLACK,
            background: None,
            palette_index: 0,
            location: Vec::new(),
        }
    }
}

/// Renders `run` against `font` into PNG bytes.
///
/// The surface is sized from the run's bounds scaled to `font_size`, plus
/// the margin on every side.
pub fn run2png(
    font: &ColorFont,
    run: &[PositionedGlyph],
    options: &Run2PngOptions,
) -> Result<Vec<u8>, RenderError> {
    let mut renderer = GlyphRenderer::new(font);
    renderer.foreground = options.foreground;
    renderer.palette_index = options.palette_index;
    renderer.set_location(&options.location);

    let bounds = glyph_run_bounds(&renderer, run).ok_or(RenderError::NothingToRender)?;
    let scale = options.font_size as f64 / font.units_per_em.max(1) as f64;
    let bounds = Rect::new(
        bounds.x0 * scale,
        bounds.y0 * scale,
        bounds.x1 * scale,
        bounds.y1 * scale,
    )
    .inflate(options.margin, options.margin);

    let mut canvas = RasterCanvas::with_bounds(bounds)?;
    if let Some(background) = options.background {
        canvas.fill(background);
    }
    canvas.transform(Affine::scale(scale));
    draw_glyph_run(&mut renderer, run, &mut canvas)?;
    canvas.into_png()
}
