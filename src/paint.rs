//! The COLRv1 paint graph as a decoded, tagged variant tree.
//!
//! Every variable-capable numeric field is a [`VarValue`]; the `PaintVar*`
//! formats and their non-var counterparts collapse into one shape at decode
//! time, with non-var fields carrying [`VarValue::constant`] values. The
//! interpreter resolves fields against the live instancer on each access, so
//! a `Location` paint deeper in the graph is always honored.

use crate::color::Extend;
use crate::variations::VarValue;
use smol_str::SmolStr;

/// A possibly-variable point in font design units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarPoint {
    pub x: VarValue,
    pub y: VarValue,
}

impl VarPoint {
    pub const fn constant(x: f32, y: f32) -> VarPoint {
        VarPoint {
            x: VarValue::constant(x),
            y: VarValue::constant(y),
        }
    }
}

/// One unresolved gradient stop: offset plus a palette reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorStopSpec {
    pub offset: VarValue,
    pub palette_index: u16,
    pub alpha: VarValue,
}

impl ColorStopSpec {
    pub fn new(offset: f32, palette_index: u16) -> ColorStopSpec {
        ColorStopSpec {
            offset: VarValue::constant(offset),
            palette_index,
            alpha: VarValue::constant(1.0),
        }
    }
}

/// An unresolved color line: stops plus the extend mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLineSpec {
    pub stops: Vec<ColorStopSpec>,
    pub extend: Extend,
}

/// Composition modes carried by `PaintComposite`.
///
/// The interpreter accepts these nodes but does not blend; see
/// [`Paint::Composite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    Clear,
    Src,
    Dest,
    SrcOver,
    DestOver,
    SrcIn,
    DestIn,
    SrcOut,
    DestOut,
    SrcAtop,
    DestAtop,
    Xor,
    Plus,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Multiply,
    HslHue,
    HslSaturation,
    HslColor,
    HslLuminosity,
}

/// One axis override carried by a `Location` paint, in normalized
/// design-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisOverride {
    pub axis_index: u16,
    pub axis_value: f32,
}

/// A node in a color glyph's paint graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// A back-to-front slice of the font's flat layer list.
    ColrLayers {
        first_layer_index: usize,
        num_layers: usize,
    },
    /// Fills the enclosing glyph path with a palette color.
    Solid { palette_index: u16, alpha: VarValue },
    /// Linear gradient over three anchors; `p2` rotates the gradient line.
    LinearGradient {
        color_line: ColorLineSpec,
        p0: VarPoint,
        p1: VarPoint,
        p2: VarPoint,
    },
    /// Two-circle radial gradient.
    RadialGradient {
        color_line: ColorLineSpec,
        c0: VarPoint,
        r0: VarValue,
        c1: VarPoint,
        r1: VarValue,
    },
    /// Angular gradient around a center, angles in degrees.
    SweepGradient {
        color_line: ColorLineSpec,
        center: VarPoint,
        start_angle: VarValue,
        end_angle: VarValue,
    },
    /// Supplies a non-COLR outline as the fill path for `paint`.
    Glyph { glyph: SmolStr, paint: Box<Paint> },
    /// Re-enters another COLRv1 base glyph, clipped to the current path.
    ColrGlyph { glyph: SmolStr },
    /// A full 2x3 affine applied to `paint`.
    Transform {
        xx: VarValue,
        yx: VarValue,
        xy: VarValue,
        yy: VarValue,
        dx: VarValue,
        dy: VarValue,
        paint: Box<Paint>,
    },
    Translate {
        dx: VarValue,
        dy: VarValue,
        paint: Box<Paint>,
    },
    /// Rotation in degrees around a pivot.
    Rotate {
        center_x: VarValue,
        center_y: VarValue,
        angle: VarValue,
        paint: Box<Paint>,
    },
    /// Skew angles in degrees around a pivot.
    Skew {
        center_x: VarValue,
        center_y: VarValue,
        x_skew_angle: VarValue,
        y_skew_angle: VarValue,
        paint: Box<Paint>,
    },
    Scale {
        center_x: VarValue,
        center_y: VarValue,
        x_scale: VarValue,
        y_scale: VarValue,
        paint: Box<Paint>,
    },
    /// Source-over-backdrop composition. Accepted but not blended: the
    /// interpreter emits a diagnostic and draws neither sub-paint.
    Composite {
        source: Box<Paint>,
        mode: CompositeMode,
        backdrop: Box<Paint>,
    },
    /// Overlays normalized axis coordinates for the duration of `paint`.
    Location {
        coords: Vec<AxisOverride>,
        paint: Box<Paint>,
    },
}
