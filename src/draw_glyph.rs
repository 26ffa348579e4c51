//! Drawing color glyphs onto a canvas.
//!
//! [`GlyphRenderer::draw_glyph`] picks the richest description a glyph has:
//! a COLRv1 paint graph, a COLRv0 layer list, or the bare outline filled
//! with the foreground color. The COLRv1 interpreter walks the paint graph
//! recursively, carrying the ambient fill path and transform explicitly and
//! restoring both (plus the canvas state and the variation location) on
//! every exit path.

use crate::canvas::Canvas;
use crate::color::{normalize_stops, Color, ColorStop, ColorStops, FOREGROUND_COLOR_INDEX};
use crate::error::PaintError;
use crate::font::{ColorFont, LayerRecord};
use crate::paint::{ColorLineSpec, Paint, VarPoint};
use crate::variations::{DeltaFormat, Instancer, VarValue};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use smol_str::SmolStr;

/// Defensive bound on paint-graph recursion. Well-formed COLR tables are
/// acyclic, so any graph deeper than this is treated as malformed.
pub const MAX_PAINT_DEPTH: usize = 64;

/// Draws one font's color glyphs onto canvases.
///
/// Holds the per-render configuration (foreground color, active palette,
/// normalized variation location) and, during a single
/// [`draw_glyph`](Self::draw_glyph) walk, the ambient interpreter state.
pub struct GlyphRenderer<'a> {
    font: &'a ColorFont,
    /// Fill color for plain glyphs and the 0xFFFF palette sentinel.
    pub foreground: Color,
    /// Which CPAL palette resolves color indices.
    pub palette_index: usize,
    instancer: Instancer<'a>,
    current_path: Option<BezPath>,
    current_transform: Affine,
}

impl<'a> GlyphRenderer<'a> {
    pub fn new(font: &'a ColorFont) -> GlyphRenderer<'a> {
        GlyphRenderer {
            font,
            foreground: Color::BLACK,
            palette_index: 0,
            instancer: Instancer::new(font.var_store.as_ref(), font.axes.len()),
            current_path: None,
            current_transform: Affine::IDENTITY,
        }
    }

    pub fn font(&self) -> &ColorFont {
        self.font
    }

    /// The current normalized design-space location.
    pub fn location(&self) -> &[f32] {
        self.instancer.coords()
    }

    pub fn set_location(&mut self, coords: &[f32]) {
        self.instancer.set_coords(coords);
    }

    /// The glyph's extent rectangle at the current location.
    pub fn glyph_bounds(&self, glyph: &str) -> Option<Rect> {
        self.font.glyph_bounds(glyph, self.instancer.coords())
    }

    /// Draws `glyph`: COLRv1 if it has a paint graph, else COLRv0 layers,
    /// else the plain outline in the foreground color.
    pub fn draw_glyph<C: Canvas>(&mut self, glyph: &str, canvas: &mut C) -> Result<(), PaintError> {
        let font = self.font;
        if let Some(paint) = font.colr_v1.get(glyph) {
            self.current_transform = Affine::IDENTITY;
            self.current_path = None;
            let result = self.draw_paint(paint, canvas, 0);
            self.current_path = None;
            return result;
        }
        if let Some(layers) = font.colr_v0.get(glyph) {
            return self.draw_colr_v0(layers, canvas);
        }
        let path = self.outline_path(glyph);
        canvas.draw_path_solid(&path, self.foreground);
        Ok(())
    }

    /// COLRv0: back-to-front solid fills, no transforms, no clipping.
    fn draw_colr_v0<C: Canvas>(
        &mut self,
        layers: &[LayerRecord],
        canvas: &mut C,
    ) -> Result<(), PaintError> {
        for layer in layers {
            let path = self.outline_path(&layer.glyph);
            let color = self.palette_color(layer.palette_index, 1.0)?;
            canvas.draw_path_solid(&path, color);
        }
        Ok(())
    }

    // COLRv1 paint dispatch

    fn draw_paint<C: Canvas>(
        &mut self,
        paint: &Paint,
        canvas: &mut C,
        depth: usize,
    ) -> Result<(), PaintError> {
        if depth > MAX_PAINT_DEPTH {
            return Err(PaintError::PaintTooDeep(MAX_PAINT_DEPTH));
        }
        let font = self.font;
        match paint {
            Paint::ColrLayers {
                first_layer_index,
                num_layers,
            } => {
                let end = first_layer_index.saturating_add(*num_layers);
                for index in *first_layer_index..end {
                    let layer = font.layer_list.get(index).ok_or(PaintError::LayerOutOfBounds {
                        index,
                        len: font.layer_list.len(),
                    })?;
                    self.ensure_clip_and_push_path(canvas, None, |this, canvas| {
                        this.draw_paint(layer, canvas, depth + 1)
                    })?;
                }
                Ok(())
            }
            Paint::Solid {
                palette_index,
                alpha,
            } => {
                let alpha = self.resolve(*alpha, DeltaFormat::F2Dot14)?;
                let color = self.palette_color(*palette_index, alpha)?;
                let path = self.current_path.as_ref().ok_or(PaintError::NoActivePath)?;
                canvas.draw_path_solid(path, color);
                Ok(())
            }
            Paint::LinearGradient {
                color_line,
                p0,
                p1,
                p2,
            } => {
                let (min_stop, max_stop, stops) = self.resolve_color_line(color_line)?;
                let p0 = self.resolve_point(*p0)?;
                let p1 = self.resolve_point(*p1)?;
                let p2 = self.resolve_point(*p2)?;
                let (start, end) = reduce_three_anchors(p0, p1, p2);
                let (start, end) = (
                    start.lerp(end, min_stop as f64),
                    start.lerp(end, max_stop as f64),
                );
                let path = self.current_path.as_ref().ok_or(PaintError::NoActivePath)?;
                canvas.draw_path_linear_gradient(
                    path,
                    &stops,
                    start,
                    end,
                    color_line.extend,
                    self.current_transform,
                );
                Ok(())
            }
            Paint::RadialGradient {
                color_line,
                c0,
                r0,
                c1,
                r1,
            } => {
                let (min_stop, max_stop, stops) = self.resolve_color_line(color_line)?;
                let c0 = self.resolve_point(*c0)?;
                let c1 = self.resolve_point(*c1)?;
                let r0 = self.resolve(*r0, DeltaFormat::Integer)?;
                let r1 = self.resolve(*r1, DeltaFormat::Integer)?;
                let start_center = c0.lerp(c1, min_stop as f64);
                let end_center = c0.lerp(c1, max_stop as f64);
                let start_radius = lerp(r0, r1, min_stop) as f64;
                let end_radius = lerp(r0, r1, max_stop) as f64;
                let path = self.current_path.as_ref().ok_or(PaintError::NoActivePath)?;
                canvas.draw_path_radial_gradient(
                    path,
                    &stops,
                    start_center,
                    start_radius,
                    end_center,
                    end_radius,
                    color_line.extend,
                    self.current_transform,
                );
                Ok(())
            }
            Paint::SweepGradient {
                color_line,
                center,
                start_angle,
                end_angle,
            } => {
                let (min_stop, max_stop, stops) = self.resolve_color_line(color_line)?;
                let center = self.resolve_point(*center)?;
                let start = self.resolve(*start_angle, DeltaFormat::F2Dot14)?;
                let end = self.resolve(*end_angle, DeltaFormat::F2Dot14)?;
                let start_angle = lerp(start, end, min_stop) as f64;
                let end_angle = lerp(start, end, max_stop) as f64;
                let path = self.current_path.as_ref().ok_or(PaintError::NoActivePath)?;
                canvas.draw_path_sweep_gradient(
                    path,
                    &stops,
                    center,
                    start_angle,
                    end_angle,
                    color_line.extend,
                    self.current_transform,
                );
                Ok(())
            }
            Paint::Glyph { glyph, paint } => {
                // The referenced glyph must not itself be a COLR glyph.
                let path = self.outline_path(glyph);
                self.ensure_clip_and_push_path(canvas, Some(path), |this, canvas| {
                    this.draw_paint(paint, canvas, depth + 1)
                })
            }
            Paint::ColrGlyph { glyph } => {
                let root = font
                    .colr_v1
                    .get(glyph.as_str())
                    .ok_or_else(|| PaintError::MissingColrGlyph(glyph.clone()))?;
                self.ensure_clip_and_push_path(canvas, None, |this, canvas| {
                    this.draw_paint(root, canvas, depth + 1)
                })
            }
            Paint::Transform {
                xx,
                yx,
                xy,
                yy,
                dx,
                dy,
                paint,
            } => {
                let transform = Affine::new([
                    self.resolve(*xx, DeltaFormat::Fixed)? as f64,
                    self.resolve(*yx, DeltaFormat::Fixed)? as f64,
                    self.resolve(*xy, DeltaFormat::Fixed)? as f64,
                    self.resolve(*yy, DeltaFormat::Fixed)? as f64,
                    self.resolve(*dx, DeltaFormat::Fixed)? as f64,
                    self.resolve(*dy, DeltaFormat::Fixed)? as f64,
                ]);
                self.apply_transform(transform, paint, canvas, depth)
            }
            Paint::Translate { dx, dy, paint } => {
                let dx = self.resolve(*dx, DeltaFormat::Integer)? as f64;
                let dy = self.resolve(*dy, DeltaFormat::Integer)? as f64;
                self.apply_transform(Affine::translate((dx, dy)), paint, canvas, depth)
            }
            Paint::Rotate {
                center_x,
                center_y,
                angle,
                paint,
            } => {
                let center = self.resolve_center(*center_x, *center_y)?;
                let angle = (self.resolve(*angle, DeltaFormat::F2Dot14)? as f64).to_radians();
                self.apply_transform(pivot(center, Affine::rotate(angle)), paint, canvas, depth)
            }
            Paint::Skew {
                center_x,
                center_y,
                x_skew_angle,
                y_skew_angle,
                paint,
            } => {
                let center = self.resolve_center(*center_x, *center_y)?;
                let x_angle = (self.resolve(*x_skew_angle, DeltaFormat::F2Dot14)? as f64).to_radians();
                let y_angle = (self.resolve(*y_skew_angle, DeltaFormat::F2Dot14)? as f64).to_radians();
                let skew = Affine::skew(x_angle.tan(), y_angle.tan());
                self.apply_transform(pivot(center, skew), paint, canvas, depth)
            }
            Paint::Scale {
                center_x,
                center_y,
                x_scale,
                y_scale,
                paint,
            } => {
                let center = self.resolve_center(*center_x, *center_y)?;
                let x_scale = self.resolve(*x_scale, DeltaFormat::F2Dot14)? as f64;
                let y_scale = self.resolve(*y_scale, DeltaFormat::F2Dot14)? as f64;
                let scale = Affine::scale_non_uniform(x_scale, y_scale);
                self.apply_transform(pivot(center, scale), paint, canvas, depth)
            }
            Paint::Composite { mode, .. } => {
                log::warn!("PaintComposite ({mode:?}) is not supported; skipping");
                Ok(())
            }
            Paint::Location { coords, paint } => {
                let previous = self.instancer.coords().to_vec();
                let mut overlay = previous.clone();
                for coord in coords {
                    if let Some(slot) = overlay.get_mut(coord.axis_index as usize) {
                        *slot = coord.axis_value;
                    }
                }
                self.instancer.set_coords(&overlay);
                let result = self.draw_paint(paint, canvas, depth + 1);
                self.instancer.set_coords(&previous);
                result
            }
        }
    }

    // Utils

    /// Opens the scope shared by every paint that introduces a clip or a
    /// fresh coordinate frame: saves the canvas, bakes the accumulated
    /// ambient transform into it, installs the previous fill path as the
    /// clip, and runs `body` with `path` as the fill path and an identity
    /// ambient transform. All three unwind afterwards, errors included.
    fn ensure_clip_and_push_path<C: Canvas>(
        &mut self,
        canvas: &mut C,
        path: Option<BezPath>,
        body: impl FnOnce(&mut Self, &mut C) -> Result<(), PaintError>,
    ) -> Result<(), PaintError> {
        let transform = std::mem::replace(&mut self.current_transform, Affine::IDENTITY);
        let clip = std::mem::replace(&mut self.current_path, path);
        canvas.save_state();
        canvas.transform(transform);
        if let Some(clip_path) = &clip {
            canvas.clip_path(clip_path);
        }
        let result = body(self, canvas);
        canvas.restore_state();
        self.current_path = clip;
        self.current_transform = transform;
        result
    }

    /// Accumulates a local transform and recurses. No state is pushed here;
    /// the enclosing clip scope restores the transform on exit.
    fn apply_transform<C: Canvas>(
        &mut self,
        transform: Affine,
        paint: &Paint,
        canvas: &mut C,
        depth: usize,
    ) -> Result<(), PaintError> {
        self.current_transform = self.current_transform * transform;
        self.draw_paint(paint, canvas, depth + 1)
    }

    fn outline_path(&self, glyph: &str) -> BezPath {
        let mut path = BezPath::new();
        if !self.font.draw_outline(glyph, self.instancer.coords(), &mut path) {
            log::warn!("no outline for glyph '{glyph}'");
        }
        path
    }

    fn resolve(&mut self, value: VarValue, format: DeltaFormat) -> Result<f32, PaintError> {
        self.instancer.resolve(value, format)
    }

    fn resolve_point(&mut self, point: VarPoint) -> Result<Point, PaintError> {
        Ok(Point::new(
            self.resolve(point.x, DeltaFormat::Integer)? as f64,
            self.resolve(point.y, DeltaFormat::Integer)? as f64,
        ))
    }

    fn resolve_center(&mut self, x: VarValue, y: VarValue) -> Result<Point, PaintError> {
        self.resolve_point(VarPoint { x, y })
    }

    /// Resolves a palette reference, honoring the foreground sentinel. The
    /// paint alpha multiplies the color's own alpha in both cases.
    fn palette_color(&self, color_index: u16, alpha: f32) -> Result<Color, PaintError> {
        if color_index == FOREGROUND_COLOR_INDEX {
            return Ok(self.foreground.with_alpha_multiplied(alpha));
        }
        let palette = self
            .font
            .palettes
            .get(self.palette_index)
            .ok_or(PaintError::MissingPalette(self.palette_index))?;
        let color = palette
            .get(color_index as usize)
            .ok_or(PaintError::ColorIndexOutOfBounds {
                index: color_index,
                palette: self.palette_index,
                len: palette.len(),
            })?;
        Ok(color.with_alpha_multiplied(alpha))
    }

    /// Resolves and normalizes a color line; see
    /// [`normalize_stops`](crate::color::normalize_stops) for the bounds.
    fn resolve_color_line(
        &mut self,
        line: &ColorLineSpec,
    ) -> Result<(f32, f32, ColorStops), PaintError> {
        let mut stops = ColorStops::with_capacity(line.stops.len());
        for stop in &line.stops {
            let offset = self.resolve(stop.offset, DeltaFormat::F2Dot14)?;
            let alpha = self.resolve(stop.alpha, DeltaFormat::F2Dot14)?;
            let color = self.palette_color(stop.palette_index, alpha)?;
            stops.push(ColorStop::new(offset, color));
        }
        Ok(normalize_stops(stops))
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// `translate(center) ∘ transform ∘ translate(-center)`.
fn pivot(center: Point, transform: Affine) -> Affine {
    Affine::translate(center.to_vec2()) * transform * Affine::translate(-center.to_vec2())
}

/// Reduces a linear gradient's three anchors to two endpoints by projecting
/// `p1` onto the line through `p0` perpendicular to `p0p2`. Collinear
/// anchors (zero-length rotation vector) fall back to `(p0, p1)` unchanged.
pub(crate) fn reduce_three_anchors(p0: Point, p1: Point, p2: Point) -> (Point, Point) {
    let v02 = p2 - p0;
    let v01 = p1 - p0;
    let squared_norm = v02.dot(v02);
    if squared_norm == 0.0 {
        return (p0, p1);
    }
    let k = v01.dot(v02) / squared_norm;
    (p0, p1 - k * v02)
}

/// One glyph of a pre-shaped run, positioned in font units.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
    pub glyph: SmolStr,
    pub x_advance: f64,
    pub y_advance: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl PositionedGlyph {
    pub fn new(glyph: impl Into<SmolStr>, x_advance: f64) -> PositionedGlyph {
        PositionedGlyph {
            glyph: glyph.into(),
            x_advance,
            y_advance: 0.0,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }
}

/// Draws a pre-shaped run left to right on one canvas, advancing the pen
/// between glyphs. Glyphs are drawn sequentially; a failing glyph aborts
/// the run with whatever was already drawn left in place.
pub fn draw_glyph_run<C: Canvas>(
    renderer: &mut GlyphRenderer,
    run: &[PositionedGlyph],
    canvas: &mut C,
) -> Result<(), PaintError> {
    for glyph in run {
        canvas.save_state();
        canvas.transform(Affine::translate((glyph.x_offset, glyph.y_offset)));
        let result = renderer.draw_glyph(&glyph.glyph, canvas);
        canvas.restore_state();
        result?;
        canvas.transform(Affine::translate((glyph.x_advance, glyph.y_advance)));
    }
    Ok(())
}

/// Union of per-glyph bounds across the run, in font units. Glyphs without
/// outlines contribute nothing but still advance the pen.
pub fn glyph_run_bounds(renderer: &GlyphRenderer, run: &[PositionedGlyph]) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    let mut pen = Vec2::ZERO;
    for glyph in run {
        if let Some(b) = renderer.glyph_bounds(&glyph.glyph) {
            let b = b + pen + Vec2::new(glyph.x_offset, glyph.y_offset);
            bounds = Some(match bounds {
                Some(bounds) => bounds.union(b),
                None => b,
            });
        }
        pen += Vec2::new(glyph.x_advance, glyph.y_advance);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_matches;
    use crate::collector::{PathCollector, RecordedBrush};
    use crate::color::Extend;
    use crate::paint::{AxisOverride, ColorStopSpec, CompositeMode};
    use crate::test_utils::{rect_font, BLUE, GREEN, RED};
    use crate::variations::{
        AxisTent, DeltaSet, ItemVariationStore, VariationRegion,
    };
    use kurbo::Shape;

    const SQUARE: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    fn color_line(stops: &[(f32, u16)]) -> ColorLineSpec {
        ColorLineSpec {
            stops: stops
                .iter()
                .map(|(offset, palette_index)| ColorStopSpec::new(*offset, *palette_index))
                .collect(),
            extend: Extend::Pad,
        }
    }

    fn solid(palette_index: u16, alpha: f32) -> Paint {
        Paint::Solid {
            palette_index,
            alpha: VarValue::constant(alpha),
        }
    }

    fn glyph_paint(glyph: &str, paint: Paint) -> Paint {
        Paint::Glyph {
            glyph: glyph.into(),
            paint: Box::new(paint),
        }
    }

    #[test]
    fn plain_outline_fills_foreground() {
        let font = rect_font(&[("A", SQUARE)]);
        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].brush, RecordedBrush::Solid(Color::BLACK));
        assert_eq!(fills[0].path.bounding_box(), SQUARE);
    }

    #[test]
    fn missing_glyph_draws_nothing() {
        let font = rect_font(&[]);
        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("missing", &mut canvas).unwrap();
        assert!(canvas.fills().is_empty());
    }

    #[test]
    fn colr_v0_layers_draw_in_order() {
        let mut font = rect_font(&[
            ("A.base", SQUARE),
            ("A.dot", Rect::new(40.0, 40.0, 60.0, 60.0)),
        ]);
        font.palettes = vec![vec![RED, BLUE]];
        font.colr_v0.insert(
            "A".into(),
            vec![LayerRecord::new("A.base", 0), LayerRecord::new("A.dot", 1)],
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].brush, RecordedBrush::Solid(RED));
        assert_eq!(fills[1].brush, RecordedBrush::Solid(BLUE));
    }

    #[test]
    fn translate_glyph_solid() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED]];
        font.colr_v1.insert(
            "A".into(),
            Paint::Translate {
                dx: VarValue::constant(10.0),
                dy: VarValue::constant(20.0),
                paint: Box::new(glyph_paint("A.base", solid(0, 0.5))),
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].transform, Affine::translate((10.0, 20.0)));
        assert_eq!(
            fills[0].brush,
            RecordedBrush::Solid(Color::new(1.0, 0.0, 0.0, 0.5))
        );
    }

    #[test]
    fn linear_gradient_reparameterized() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED, BLUE]];
        font.colr_v1.insert(
            "A".into(),
            glyph_paint(
                "A.base",
                Paint::LinearGradient {
                    color_line: color_line(&[(0.25, 0), (0.75, 1)]),
                    p0: VarPoint::constant(0.0, 0.0),
                    p1: VarPoint::constant(10.0, 0.0),
                    p2: VarPoint::constant(0.0, 10.0),
                },
            ),
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 1);
        let RecordedBrush::Linear {
            stops, p0, p1, ..
        } = &fills[0].brush
        else {
            panic!("expected a linear gradient, got {:?}", fills[0].brush);
        };
        assert_eq!(*p0, Point::new(2.5, 0.0));
        assert_eq!(*p1, Point::new(7.5, 0.0));
        assert_eq!(
            stops.to_vec(),
            vec![ColorStop::new(0.0, RED), ColorStop::new(1.0, BLUE)]
        );
    }

    #[test]
    fn radial_gradient_reparameterized() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED, BLUE]];
        font.colr_v1.insert(
            "A".into(),
            glyph_paint(
                "A.base",
                Paint::RadialGradient {
                    color_line: color_line(&[(0.5, 0), (1.0, 1)]),
                    c0: VarPoint::constant(0.0, 0.0),
                    r0: VarValue::constant(0.0),
                    c1: VarPoint::constant(100.0, 0.0),
                    r1: VarValue::constant(50.0),
                },
            ),
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let RecordedBrush::Radial {
            c0, r0, c1, r1, ..
        } = &canvas.fills()[0].brush
        else {
            panic!("expected a radial gradient");
        };
        assert_eq!(*c0, Point::new(50.0, 0.0));
        assert_eq!(*r0, 25.0);
        assert_eq!(*c1, Point::new(100.0, 0.0));
        assert_eq!(*r1, 50.0);
    }

    #[test]
    fn sweep_gradient_angles_reparameterized() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED, BLUE]];
        font.colr_v1.insert(
            "A".into(),
            glyph_paint(
                "A.base",
                Paint::SweepGradient {
                    color_line: color_line(&[(0.25, 0), (0.75, 1)]),
                    center: VarPoint::constant(50.0, 50.0),
                    start_angle: VarValue::constant(0.0),
                    end_angle: VarValue::constant(360.0),
                },
            ),
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let RecordedBrush::Sweep {
            center,
            start_angle,
            end_angle,
            ..
        } = &canvas.fills()[0].brush
        else {
            panic!("expected a sweep gradient");
        };
        assert_eq!(*center, Point::new(50.0, 50.0));
        assert_eq!(*start_angle, 90.0);
        assert_eq!(*end_angle, 270.0);
    }

    #[test]
    fn layers_run_in_source_order_and_isolate_state() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED, GREEN, BLUE]];
        font.layer_list = vec![
            glyph_paint("A.base", solid(0, 1.0)),
            Paint::Translate {
                dx: VarValue::constant(5.0),
                dy: VarValue::constant(0.0),
                paint: Box::new(glyph_paint("A.base", solid(1, 1.0))),
            },
            glyph_paint("A.base", solid(2, 1.0)),
        ];
        font.colr_v1.insert(
            "A".into(),
            Paint::ColrLayers {
                first_layer_index: 0,
                num_layers: 3,
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 3);
        assert_eq!(fills[0].brush, RecordedBrush::Solid(RED));
        assert_eq!(fills[1].brush, RecordedBrush::Solid(GREEN));
        assert_eq!(fills[2].brush, RecordedBrush::Solid(BLUE));
        // The middle layer's translate must not leak into its sibling.
        assert_eq!(fills[1].transform, Affine::translate((5.0, 0.0)));
        assert_eq!(fills[2].transform, Affine::IDENTITY);
    }

    #[test]
    fn nested_glyph_clips_to_outer_path() {
        let mut font = rect_font(&[
            ("A.base", SQUARE),
            ("A.stripe", Rect::new(0.0, 40.0, 200.0, 60.0)),
        ]);
        font.palettes = vec![vec![RED]];
        font.colr_v1.insert(
            "A".into(),
            glyph_paint("A.base", glyph_paint("A.stripe", solid(0, 1.0))),
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].clips.len(), 1);
        assert_eq!(fills[0].clips[0].bounding_box(), SQUARE);
        assert_eq!(
            fills[0].path.bounding_box(),
            Rect::new(0.0, 40.0, 200.0, 60.0)
        );
    }

    #[test]
    fn empty_outline_suppresses_fill() {
        let mut font = rect_font(&[("A.empty", Rect::new(10.0, 10.0, 10.0, 10.0))]);
        font.palettes = vec![vec![RED]];
        font.colr_v1
            .insert("A".into(), glyph_paint("A.empty", solid(0, 1.0)));

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();
        assert!(canvas.fills().is_empty());
    }

    #[test]
    fn empty_clip_suppresses_nested_fills() {
        let mut font = rect_font(&[
            ("A.empty", Rect::new(10.0, 10.0, 10.0, 10.0)),
            ("A.base", SQUARE),
        ]);
        font.palettes = vec![vec![RED]];
        font.colr_v1.insert(
            "A".into(),
            glyph_paint("A.empty", glyph_paint("A.base", solid(0, 1.0))),
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();
        assert!(canvas.fills().is_empty());
    }

    #[test]
    fn rotate_pivots_around_center() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED]];
        font.colr_v1.insert(
            "A".into(),
            Paint::Rotate {
                center_x: VarValue::constant(50.0),
                center_y: VarValue::constant(50.0),
                angle: VarValue::constant(90.0),
                paint: Box::new(glyph_paint("A.base", solid(0, 1.0))),
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let expected = Affine::translate((50.0, 50.0))
            * Affine::rotate(std::f64::consts::FRAC_PI_2)
            * Affine::translate((-50.0, -50.0));
        let actual = canvas.fills()[0].transform.as_coeffs();
        for (a, e) in actual.iter().zip(expected.as_coeffs()) {
            assert!((a - e).abs() < 1e-12, "{actual:?}");
        }
    }

    #[test]
    fn colr_glyph_reenters_base() {
        let mut font = rect_font(&[("B.base", SQUARE), ("A.base", SQUARE)]);
        font.palettes = vec![vec![BLUE]];
        font.colr_v1
            .insert("B".into(), glyph_paint("B.base", solid(0, 1.0)));
        font.colr_v1.insert(
            "A".into(),
            glyph_paint("A.base", Paint::ColrGlyph { glyph: "B".into() }),
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].brush, RecordedBrush::Solid(BLUE));
        // Clipped by A.base's path from the outer scope.
        assert_eq!(fills[0].clips.len(), 1);
    }

    #[test]
    fn cyclic_colr_glyph_hits_depth_limit() {
        let mut font = rect_font(&[]);
        font.colr_v1
            .insert("A".into(), Paint::ColrGlyph { glyph: "A".into() });

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        assert_matches!(
            renderer.draw_glyph("A", &mut canvas),
            Err(PaintError::PaintTooDeep(_))
        );
    }

    #[test]
    fn solid_without_path_errors() {
        let mut font = rect_font(&[]);
        font.palettes = vec![vec![RED]];
        font.colr_v1.insert("A".into(), solid(0, 1.0));

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        assert_matches!(
            renderer.draw_glyph("A", &mut canvas),
            Err(PaintError::NoActivePath)
        );
    }

    #[test]
    fn missing_colr_glyph_errors() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.colr_v1.insert(
            "A".into(),
            glyph_paint("A.base", Paint::ColrGlyph { glyph: "Z".into() }),
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        assert_matches!(
            renderer.draw_glyph("A", &mut canvas),
            Err(PaintError::MissingColrGlyph(_))
        );
    }

    #[test]
    fn layer_index_out_of_bounds_errors() {
        let mut font = rect_font(&[]);
        font.colr_v1.insert(
            "A".into(),
            Paint::ColrLayers {
                first_layer_index: 0,
                num_layers: 1,
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        assert_matches!(
            renderer.draw_glyph("A", &mut canvas),
            Err(PaintError::LayerOutOfBounds { index: 0, len: 0 })
        );
    }

    #[test]
    fn foreground_sentinel_multiplies_alpha() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.colr_v1.insert(
            "A".into(),
            glyph_paint("A.base", solid(FOREGROUND_COLOR_INDEX, 0.5)),
        );

        let mut renderer = GlyphRenderer::new(&font);
        renderer.foreground = Color::new(0.2, 0.3, 0.4, 0.8);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        assert_eq!(
            canvas.fills()[0].brush,
            RecordedBrush::Solid(Color::new(0.2, 0.3, 0.4, 0.8 * 0.5))
        );
    }

    #[test]
    fn color_index_out_of_bounds_errors() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED]];
        font.colr_v0
            .insert("A".into(), vec![LayerRecord::new("A.base", 7)]);

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        assert_matches!(
            renderer.draw_glyph("A", &mut canvas),
            Err(PaintError::ColorIndexOutOfBounds {
                index: 7,
                palette: 0,
                len: 1
            })
        );
    }

    #[test]
    fn composite_draws_nothing() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED]];
        font.colr_v1.insert(
            "A".into(),
            Paint::Composite {
                source: Box::new(glyph_paint("A.base", solid(0, 1.0))),
                mode: CompositeMode::SrcOver,
                backdrop: Box::new(glyph_paint("A.base", solid(0, 1.0))),
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();
        assert!(canvas.fills().is_empty());
    }

    fn variable_alpha_font() -> ColorFont {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.axes = vec!["wght".into()];
        font.palettes = vec![vec![RED]];
        font.var_store = Some(ItemVariationStore {
            regions: vec![VariationRegion {
                axes: vec![AxisTent::new(0.0, 1.0, 1.0)],
            }],
            // -8192 raw F2Dot14 units = -0.5 at full weight.
            subtables: vec![DeltaSet {
                region_indices: vec![0],
                deltas: vec![vec![-8192.0]],
            }],
        });
        font
    }

    fn var_solid_paint() -> Paint {
        glyph_paint(
            "A.base",
            Paint::Solid {
                palette_index: 0,
                alpha: VarValue::variable(1.0, 0),
            },
        )
    }

    #[test]
    fn location_paint_scopes_variable_alpha() {
        let mut font = variable_alpha_font();
        font.colr_v1.insert(
            "A".into(),
            Paint::Location {
                coords: vec![AxisOverride {
                    axis_index: 0,
                    axis_value: 1.0,
                }],
                paint: Box::new(var_solid_paint()),
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();

        assert_eq!(
            canvas.fills()[0].brush,
            RecordedBrush::Solid(Color::new(1.0, 0.0, 0.0, 0.5))
        );
        // The location pushed by the paint must be popped again.
        assert_eq!(renderer.location(), &[0.0]);
    }

    #[test]
    fn variable_alpha_outside_location_scope() {
        let mut font = variable_alpha_font();
        font.colr_v1.insert("A".into(), var_solid_paint());

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();
        assert_eq!(canvas.fills()[0].brush, RecordedBrush::Solid(RED));
    }

    #[test]
    fn location_ignores_out_of_range_axes() {
        let mut font = variable_alpha_font();
        font.colr_v1.insert(
            "A".into(),
            Paint::Location {
                coords: vec![AxisOverride {
                    axis_index: 7,
                    axis_value: 1.0,
                }],
                paint: Box::new(var_solid_paint()),
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();
        assert_eq!(canvas.fills()[0].brush, RecordedBrush::Solid(RED));
    }

    #[test]
    fn renderer_location_applies_without_location_paint() {
        let mut font = variable_alpha_font();
        font.colr_v1.insert("A".into(), var_solid_paint());

        let mut renderer = GlyphRenderer::new(&font);
        renderer.set_location(&[1.0]);
        let mut canvas = PathCollector::new();
        renderer.draw_glyph("A", &mut canvas).unwrap();
        assert_eq!(
            canvas.fills()[0].brush,
            RecordedBrush::Solid(Color::new(1.0, 0.0, 0.0, 0.5))
        );
    }

    #[test]
    fn drawing_twice_is_idempotent() {
        let mut font = rect_font(&[("A.base", SQUARE)]);
        font.palettes = vec![vec![RED]];
        font.colr_v1.insert(
            "A".into(),
            Paint::Translate {
                dx: VarValue::constant(3.0),
                dy: VarValue::constant(4.0),
                paint: Box::new(glyph_paint("A.base", solid(0, 1.0))),
            },
        );

        let mut renderer = GlyphRenderer::new(&font);
        let mut first = PathCollector::new();
        renderer.draw_glyph("A", &mut first).unwrap();
        let mut second = PathCollector::new();
        renderer.draw_glyph("A", &mut second).unwrap();

        assert_eq!(first.fills().len(), second.fills().len());
        for (a, b) in first.fills().iter().zip(second.fills()) {
            assert_eq!(a.brush, b.brush);
            assert_eq!(a.transform, b.transform);
            assert_eq!(a.path.elements(), b.path.elements());
        }
    }

    #[test]
    fn reduce_three_anchors_projects_rotation() {
        let (start, end) = reduce_three_anchors(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        );
        assert_eq!(start, Point::new(0.0, 0.0));
        assert_eq!(end, Point::new(10.0, 0.0));

        // Slanted rotation vector strips the parallel component of p1.
        let (_, end) = reduce_three_anchors(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        );
        assert_eq!(end, Point::new(10.0, 0.0));
    }

    #[test]
    fn reduce_three_anchors_degenerate_falls_back() {
        let p0 = Point::new(1.0, 1.0);
        let p1 = Point::new(9.0, 1.0);
        assert_eq!(reduce_three_anchors(p0, p1, p0), (p0, p1));
    }

    #[test]
    fn run_draws_with_offsets_and_advances() {
        let mut font = rect_font(&[("A", SQUARE)]);
        font.palettes = vec![vec![RED]];

        let run = vec![
            PositionedGlyph::new("A", 120.0),
            PositionedGlyph {
                y_offset: 30.0,
                ..PositionedGlyph::new("A", 120.0)
            },
        ];

        let mut renderer = GlyphRenderer::new(&font);
        let mut canvas = PathCollector::new();
        draw_glyph_run(&mut renderer, &run, &mut canvas).unwrap();

        let fills = canvas.fills();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].transform, Affine::IDENTITY);
        assert_eq!(fills[1].transform, Affine::translate((120.0, 30.0)));
    }

    #[test]
    fn run_bounds_accumulate_advances() {
        let font = rect_font(&[("A", SQUARE)]);
        let renderer = GlyphRenderer::new(&font);

        let run = vec![
            PositionedGlyph::new("A", 120.0),
            PositionedGlyph::new("missing", 80.0),
            PositionedGlyph::new("A", 120.0),
        ];
        assert_eq!(
            glyph_run_bounds(&renderer, &run),
            Some(Rect::new(0.0, 0.0, 300.0, 100.0))
        );
        assert_eq!(glyph_run_bounds(&renderer, &[]), None);
    }
}
