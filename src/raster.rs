//! A raster backend over the tiny_skia pipeline.
//!
//! Clips are kept as device-space masks intersected per `clip_path`; fills
//! go through `Pixmap::fill_path` with the canvas transform applied to both
//! the path and the shader, so gradient geometry tracks the paint-time
//! transform the interpreter hands us.

use crate::canvas::{is_degenerate, Canvas};
use crate::color::{Color, ColorStop, Extend};
use crate::error::RenderError;
use kurbo::{Affine, BezPath, PathEl, Point, Rect};
use tiny_skia::{
    FillRule, GradientStop, LinearGradient, Mask, Paint as SkiaPaint, PathBuilder, Pixmap,
    Point as SkiaPoint, RadialGradient, Shader, SpreadMode, SweepGradient, Transform,
};

/// The fill rule used in tiny skia. COLR glyph outlines fill by winding.
const FILL_RULE: FillRule = FillRule::Winding;

#[derive(Clone, Debug)]
struct RasterState {
    transform: Affine,
    clip: Option<Mask>,
    clip_is_empty: bool,
}

/// Renders canvas operations into a [`Pixmap`].
#[derive(Debug)]
pub struct RasterCanvas {
    pixmap: Pixmap,
    state: RasterState,
    saved: Vec<RasterState>,
}

impl RasterCanvas {
    /// A pixel surface with an identity transform (Y-down device space).
    pub fn new(width: u32, height: u32) -> Result<RasterCanvas, RenderError> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::TooSmall)?;
        Ok(RasterCanvas {
            pixmap,
            state: RasterState {
                transform: Affine::IDENTITY,
                clip: None,
                clip_is_empty: false,
            },
            saved: Vec::new(),
        })
    }

    /// A surface covering `bounds` in Y-up font space, flipped to pixels.
    pub fn with_bounds(bounds: Rect) -> Result<RasterCanvas, RenderError> {
        let mut canvas = RasterCanvas::new(
            bounds.width().ceil() as u32,
            bounds.height().ceil() as u32,
        )?;
        canvas.state.transform = Affine::new([1.0, 0.0, 0.0, -1.0, -bounds.x0, bounds.y1]);
        Ok(canvas)
    }

    /// Fills the whole surface, typically with a background color.
    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(to_tinyskia_color(color));
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Encodes the surface as PNG bytes.
    pub fn into_png(self) -> Result<Vec<u8>, RenderError> {
        Ok(self.pixmap.encode_png()?)
    }

    fn fill_shader(&mut self, path: &BezPath, shader: Shader) {
        let Some(ts_path) = path.to_tinyskia() else {
            return;
        };
        let paint = SkiaPaint {
            shader,
            ..SkiaPaint::default()
        };
        self.pixmap.fill_path(
            &ts_path,
            &paint,
            FILL_RULE,
            self.state.transform.to_tinyskia(),
            self.state.clip.as_ref(),
        );
    }

    /// Gradient construction can fail on degenerate geometry; fall back to
    /// the first stop's color so the shape still shows.
    fn fill_gradient(&mut self, path: &BezPath, shader: Option<Shader>, stops: &[ColorStop]) {
        match shader {
            Some(shader) => self.fill_shader(path, shader),
            None => {
                if let Some(first) = stops.first() {
                    self.fill_shader(path, Shader::SolidColor(to_tinyskia_color(first.color)));
                }
            }
        }
    }
}

impl Canvas for RasterCanvas {
    fn save_state(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore_state(&mut self) {
        debug_assert!(!self.saved.is_empty(), "restore without matching save");
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn transform(&mut self, affine: Affine) {
        self.state.transform = self.state.transform * affine;
    }

    fn clip_path(&mut self, path: &BezPath) {
        if is_degenerate(path) {
            self.state.clip_is_empty = true;
            return;
        }
        let device = self.state.transform * path.clone();
        let Some(ts_path) = device.to_tinyskia() else {
            self.state.clip_is_empty = true;
            return;
        };
        match &mut self.state.clip {
            Some(mask) => {
                mask.intersect_path(&ts_path, FILL_RULE, true, Transform::identity());
            }
            None => {
                let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
                    self.state.clip_is_empty = true;
                    return;
                };
                mask.fill_path(&ts_path, FILL_RULE, true, Transform::identity());
                self.state.clip = Some(mask);
            }
        }
    }

    fn draw_path_solid(&mut self, path: &BezPath, color: Color) {
        if self.state.clip_is_empty || is_degenerate(path) {
            return;
        }
        self.fill_shader(path, Shader::SolidColor(to_tinyskia_color(color)));
    }

    fn draw_path_linear_gradient(
        &mut self,
        path: &BezPath,
        stops: &[ColorStop],
        p0: Point,
        p1: Point,
        extend: Extend,
        gradient_transform: Affine,
    ) {
        if self.state.clip_is_empty || is_degenerate(path) || stops.is_empty() {
            return;
        }
        let shader = LinearGradient::new(
            p0.to_tinyskia(),
            p1.to_tinyskia(),
            stops.to_tinyskia(),
            extend.to_tinyskia(),
            gradient_transform.to_tinyskia(),
        );
        self.fill_gradient(path, shader, stops);
    }

    fn draw_path_radial_gradient(
        &mut self,
        path: &BezPath,
        stops: &[ColorStop],
        c0: Point,
        r0: f64,
        c1: Point,
        r1: f64,
        extend: Extend,
        gradient_transform: Affine,
    ) {
        if self.state.clip_is_empty || is_degenerate(path) || stops.is_empty() {
            return;
        }
        let shader = RadialGradient::new(
            c0.to_tinyskia(),
            r0 as f32,
            c1.to_tinyskia(),
            r1 as f32,
            stops.to_tinyskia(),
            extend.to_tinyskia(),
            gradient_transform.to_tinyskia(),
        );
        self.fill_gradient(path, shader, stops);
    }

    fn draw_path_sweep_gradient(
        &mut self,
        path: &BezPath,
        stops: &[ColorStop],
        center: Point,
        start_angle: f64,
        end_angle: f64,
        extend: Extend,
        gradient_transform: Affine,
    ) {
        if self.state.clip_is_empty || is_degenerate(path) || stops.is_empty() {
            return;
        }
        let shader = SweepGradient::new(
            center.to_tinyskia(),
            start_angle as f32,
            end_angle as f32,
            stops.to_tinyskia(),
            extend.to_tinyskia(),
            gradient_transform.to_tinyskia(),
        );
        self.fill_gradient(path, shader, stops);
    }
}

fn to_tinyskia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        color.a.clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

trait ToTinySkia {
    type T;
    fn to_tinyskia(&self) -> Self::T;
}

impl ToTinySkia for BezPath {
    type T = Option<tiny_skia::Path>;

    fn to_tinyskia(&self) -> Option<tiny_skia::Path> {
        let mut pb = PathBuilder::new();
        for el in self.elements() {
            match el {
                PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
                PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
                PathEl::QuadTo(c0, p) => {
                    pb.quad_to(c0.x as f32, c0.y as f32, p.x as f32, p.y as f32)
                }
                PathEl::CurveTo(c0, c1, p) => pb.cubic_to(
                    c0.x as f32,
                    c0.y as f32,
                    c1.x as f32,
                    c1.y as f32,
                    p.x as f32,
                    p.y as f32,
                ),
                PathEl::ClosePath => pb.close(),
            }
        }
        pb.finish()
    }
}

impl ToTinySkia for Affine {
    type T = Transform;

    fn to_tinyskia(&self) -> Transform {
        let coeffs = self.as_coeffs();
        Transform {
            sx: coeffs[0] as f32,
            ky: coeffs[1] as f32,
            kx: coeffs[2] as f32,
            sy: coeffs[3] as f32,
            tx: coeffs[4] as f32,
            ty: coeffs[5] as f32,
        }
    }
}

impl ToTinySkia for Extend {
    type T = SpreadMode;

    fn to_tinyskia(&self) -> SpreadMode {
        match self {
            Extend::Pad => SpreadMode::Pad,
            Extend::Repeat => SpreadMode::Repeat,
            Extend::Reflect => SpreadMode::Reflect,
        }
    }
}

impl ToTinySkia for [ColorStop] {
    type T = Vec<GradientStop>;

    fn to_tinyskia(&self) -> Vec<GradientStop> {
        self.iter()
            .map(|s| GradientStop::new(s.offset.clamp(0.0, 1.0), to_tinyskia_color(s.color)))
            .collect()
    }
}

impl ToTinySkia for Point {
    type T = SkiaPoint;

    fn to_tinyskia(&self) -> SkiaPoint {
        SkiaPoint::from_xy(self.x as f32, self.y as f32)
    }
}
