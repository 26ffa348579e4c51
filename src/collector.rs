//! A canvas that records fills instead of rendering them.
//!
//! Useful for geometric queries (what would this glyph draw, and where) and
//! as the test instrument for the paint interpreter.

use crate::canvas::{is_degenerate, Canvas};
use crate::color::{Color, ColorStop, ColorStops, Extend};
use kurbo::{Affine, BezPath, Point, Rect, Shape};

/// The brush a recorded fill would have been painted with. Gradient
/// geometry is recorded exactly as it was handed to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedBrush {
    Solid(Color),
    Linear {
        stops: ColorStops,
        extend: Extend,
        p0: Point,
        p1: Point,
        transform: Affine,
    },
    Radial {
        stops: ColorStops,
        extend: Extend,
        c0: Point,
        r0: f64,
        c1: Point,
        r1: f64,
        transform: Affine,
    },
    Sweep {
        stops: ColorStops,
        extend: Extend,
        center: Point,
        start_angle: f64,
        end_angle: f64,
        transform: Affine,
    },
}

/// One fill operation: the path in its local coordinates, the canvas
/// transform active at fill time, and the clip paths (already in device
/// coordinates) that were intersected around it.
#[derive(Debug, Clone)]
pub struct RecordedFill {
    pub path: BezPath,
    pub transform: Affine,
    pub clips: Vec<BezPath>,
    pub brush: RecordedBrush,
}

impl RecordedFill {
    /// Device-space bounding box of what this fill can touch: the
    /// transformed path box intersected with every clip box.
    pub fn bounds(&self) -> Option<Rect> {
        let mut bounds = (self.transform * self.path.clone()).bounding_box();
        for clip in &self.clips {
            bounds = bounds.intersect(clip.bounding_box());
        }
        (bounds.width() > 0.0 && bounds.height() > 0.0).then_some(bounds)
    }
}

#[derive(Clone, Default)]
struct CollectorState {
    transform: Affine,
    clips: Vec<BezPath>,
    clip_is_empty: bool,
}

/// Records paths without rendering.
#[derive(Default)]
pub struct PathCollector {
    fills: Vec<RecordedFill>,
    state: CollectorState,
    saved: Vec<CollectorState>,
}

impl PathCollector {
    pub fn new() -> PathCollector {
        PathCollector::default()
    }

    pub fn fills(&self) -> &[RecordedFill] {
        &self.fills
    }

    pub fn into_fills(self) -> Vec<RecordedFill> {
        self.fills
    }

    /// Union of the recorded fills' device-space bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.fills
            .iter()
            .filter_map(RecordedFill::bounds)
            .reduce(|a, b| a.union(b))
    }

    fn record(&mut self, path: &BezPath, brush: RecordedBrush) {
        if self.state.clip_is_empty || is_degenerate(path) {
            return;
        }
        self.fills.push(RecordedFill {
            path: path.clone(),
            transform: self.state.transform,
            clips: self.state.clips.clone(),
            brush,
        });
    }
}

impl Canvas for PathCollector {
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
        self.state.clips.push(device);
    }

    fn draw_path_solid(&mut self, path: &BezPath, color: Color) {
        self.record(path, RecordedBrush::Solid(color));
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
        self.record(
            path,
            RecordedBrush::Linear {
                stops: stops.iter().copied().collect(),
                extend,
                p0,
                p1,
                transform: gradient_transform,
            },
        );
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
        self.record(
            path,
            RecordedBrush::Radial {
                stops: stops.iter().copied().collect(),
                extend,
                c0,
                r0,
                c1,
                r1,
                transform: gradient_transform,
            },
        );
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
        self.record(
            path,
            RecordedBrush::Sweep {
                stops: stops.iter().copied().collect(),
                extend,
                center,
                start_angle,
                end_angle,
                transform: gradient_transform,
            },
        );
    }
}
