//! The backend-agnostic drawing surface.
//!
//! Paths are [`BezPath`] values built through [`PathPen`]; backends convert
//! to their native form at draw time. Gradient operations receive an
//! already-normalized color line together with the gradient transform, and
//! are expected to draw the gradient clipped to the path with the gradient
//! transform composed into the current transform, extending before the start
//! and after the end of the parameter range.

use crate::color::{Color, ColorStop, Extend};
use kurbo::{Affine, BezPath, Point, Shape};

/// Receives outline drawing commands and accumulates a path.
pub trait PathPen {
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn quad_to(&mut self, c: Point, p: Point);
    fn curve_to(&mut self, c0: Point, c1: Point, p: Point);
    fn close(&mut self);
}

impl PathPen for BezPath {
    fn move_to(&mut self, p: Point) {
        BezPath::move_to(self, p);
    }

    fn line_to(&mut self, p: Point) {
        BezPath::line_to(self, p);
    }

    fn quad_to(&mut self, c: Point, p: Point) {
        BezPath::quad_to(self, c, p);
    }

    fn curve_to(&mut self, c0: Point, c1: Point, p: Point) {
        BezPath::curve_to(self, c0, c1, p);
    }

    fn close(&mut self) {
        self.close_path();
    }
}

/// True for paths whose bounding box has no area.
///
/// Installing such a path as a clip must mark the clip *empty* (suppressing
/// subsequent fills in the scope) rather than leaving the clip unchanged,
/// which would wrongly fill the whole surface. Filling such a path draws
/// nothing.
pub(crate) fn is_degenerate(path: &BezPath) -> bool {
    let bbox = path.bounding_box();
    bbox.width() <= 0.0 || bbox.height() <= 0.0
}

/// A 2D surface that renders filled paths under a transform and clip stack.
pub trait Canvas {
    /// Snapshots the transform and clip. Prefer [`Canvas::saved`], which
    /// restores on every exit path.
    fn save_state(&mut self);
    fn restore_state(&mut self);

    /// Right-multiplies `affine` onto the current transform.
    fn transform(&mut self, affine: Affine);

    /// Intersects the current clip with `path` under the current transform.
    fn clip_path(&mut self, path: &BezPath);

    fn draw_path_solid(&mut self, path: &BezPath, color: Color);

    #[allow(clippy::too_many_arguments)]
    fn draw_path_linear_gradient(
        &mut self,
        path: &BezPath,
        stops: &[ColorStop],
        p0: Point,
        p1: Point,
        extend: Extend,
        gradient_transform: Affine,
    );

    #[allow(clippy::too_many_arguments)]
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
    );

    /// Angles are in degrees. Backends without sweep support may fall back
    /// to a solid fill of the first stop.
    #[allow(clippy::too_many_arguments)]
    fn draw_path_sweep_gradient(
        &mut self,
        path: &BezPath,
        stops: &[ColorStop],
        center: Point,
        start_angle: f64,
        end_angle: f64,
        extend: Extend,
        gradient_transform: Affine,
    );

    /// A scoped snapshot of transform and clip, restored when dropped.
    fn saved(&mut self) -> SavedState<'_, Self>
    where
        Self: Sized,
    {
        SavedState::new(self)
    }
}

/// Guard returned by [`Canvas::saved`]; restores the canvas state on drop,
/// including error exits.
pub struct SavedState<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
}

impl<'a, C: Canvas + ?Sized> SavedState<'a, C> {
    pub fn new(canvas: &'a mut C) -> SavedState<'a, C> {
        canvas.save_state();
        SavedState { canvas }
    }
}

impl<C: Canvas + ?Sized> std::ops::Deref for SavedState<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.canvas
    }
}

impl<C: Canvas + ?Sized> std::ops::DerefMut for SavedState<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.canvas
    }
}

impl<C: Canvas + ?Sized> Drop for SavedState<'_, C> {
    fn drop(&mut self) {
        self.canvas.restore_state();
    }
}
