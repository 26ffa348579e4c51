//! Renders a pre-shaped glyph run into an SVG document.

use crate::canvas::Canvas;
use crate::color::Color;
use crate::draw_glyph::{draw_glyph_run, glyph_run_bounds, GlyphRenderer, PositionedGlyph};
use crate::error::RenderError;
use crate::font::ColorFont;
use crate::svg::SvgCanvas;
use kurbo::{Affine, Rect};

/// Options for rendering a glyph run to SVG.
#[derive(Debug, Clone)]
pub struct Run2SvgOptions {
    /// The size of the font in document units.
    pub font_size: f32,
    /// Padding around the run's bounds, in document units.
    pub margin: f64,
    /// The fill color for non-color glyphs and the foreground sentinel.
    pub foreground: Color,
    /// Which CPAL palette resolves color indices.
    pub palette_index: usize,
    /// Normalized variation coordinates, one per fvar axis.
    pub location: Vec<f32>,
}

impl Run2SvgOptions {
    pub fn new(font_size: f32) -> Run2SvgOptions {
        Run2SvgOptions {
            font_size,
            margin: 20.0,
            foreground: Color::BLACK,
            palette_index: 0,
            location: Vec::new(),
        }
    }
}

/// Renders `run` against `font` into an SVG document string.
pub fn run2svg(
    font: &ColorFont,
    run: &[PositionedGlyph],
    options: &Run2SvgOptions,
) -> Result<String, RenderError> {
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

    let mut canvas = SvgCanvas::new(bounds);
    canvas.transform(Affine::scale(scale));
    draw_glyph_run(&mut renderer, run, &mut canvas)?;
    Ok(canvas.finish())
}
