//! Colors, palettes and gradient color lines.

use smallvec::SmallVec;

/// Palette index reserved for the ambient foreground color.
pub const FOREGROUND_COLOR_INDEX: u16 = 0xFFFF;

/// An RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Color {
        let max = u8::MAX as f32;
        Color::new(r as f32 / max, g as f32 / max, b as f32 / max, a as f32 / max)
    }

    /// Returns the color with its alpha multiplied by `alpha`.
    pub fn with_alpha_multiplied(self, alpha: f32) -> Color {
        Color {
            a: self.a * alpha,
            ..self
        }
    }
}

/// An ordered sequence of colors addressed by color index.
pub type Palette = Vec<Color>;

/// Behavior of a gradient outside its `[0, 1]` parameter range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Extend {
    #[default]
    Pad,
    Repeat,
    Reflect,
}

/// A gradient transition point with its color already resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

impl ColorStop {
    pub fn new(offset: f32, color: Color) -> ColorStop {
        ColorStop { offset, color }
    }
}

/// Resolved color-line stops. Real color lines rarely have more than a
/// handful of stops, so they live inline.
pub type ColorStops = SmallVec<[ColorStop; 4]>;

/// Normalizes stop offsets to the unit interval.
///
/// Returns `(min_stop, max_stop, stops)` where the stops have been rewritten
/// to `(offset - min) / (max - min)`. The caller repositions the gradient's
/// geometry (endpoints, radii, angles) by interpolating with the returned
/// bounds, which preserves the parameter-to-color mapping.
///
/// When all offsets are equal the stops are returned untouched with sentinel
/// bounds `(0, 1)` so the geometry interpolation stays finite.
pub fn normalize_stops(stops: ColorStops) -> (f32, f32, ColorStops) {
    let Some(min_stop) = stops.iter().map(|s| s.offset).reduce(f32::min) else {
        return (0.0, 1.0, stops);
    };
    let max_stop = stops.iter().map(|s| s.offset).fold(min_stop, f32::max);
    if max_stop <= min_stop {
        return (0.0, 1.0, stops);
    }
    let extent = max_stop - min_stop;
    let stops = stops
        .into_iter()
        .map(|s| ColorStop::new((s.offset - min_stop) / extent, s.color))
        .collect();
    (min_stop, max_stop, stops)
}
