//! Shared helpers for in-crate tests: stub outline sources and assertions.

use crate::canvas::PathPen;
use crate::font::{ColorFont, GlyphExtents, OutlineSource};
use kurbo::{BezPath, Point, Rect};
use smol_str::SmolStr;
use std::collections::HashMap;

pub(crate) const RED: crate::color::Color = crate::color::Color::new(1.0, 0.0, 0.0, 1.0);
pub(crate) const GREEN: crate::color::Color = crate::color::Color::new(0.0, 1.0, 0.0, 1.0);
pub(crate) const BLUE: crate::color::Color = crate::color::Color::new(0.0, 0.0, 1.0, 1.0);

/// An outline source mapping glyph names to rectangles, ignoring the
/// variation location.
#[derive(Default)]
pub(crate) struct RectOutlines {
    rects: HashMap<SmolStr, Rect>,
}

impl RectOutlines {
    pub(crate) fn new(entries: &[(&str, Rect)]) -> RectOutlines {
        RectOutlines {
            rects: entries
                .iter()
                .map(|(name, rect)| (SmolStr::from(*name), *rect))
                .collect(),
        }
    }
}

impl OutlineSource for RectOutlines {
    fn draw_outline(&self, glyph: &str, _coords: &[f32], pen: &mut dyn PathPen) -> bool {
        let Some(rect) = self.rects.get(glyph) else {
            return false;
        };
        pen.move_to(Point::new(rect.x0, rect.y0));
        pen.line_to(Point::new(rect.x1, rect.y0));
        pen.line_to(Point::new(rect.x1, rect.y1));
        pen.line_to(Point::new(rect.x0, rect.y1));
        pen.close();
        true
    }

    fn extents(&self, glyph: &str, _coords: &[f32]) -> Option<GlyphExtents> {
        let rect = self.rects.get(glyph)?;
        Some(GlyphExtents {
            x_bearing: rect.x0 as f32,
            y_bearing: rect.y1 as f32,
            width: rect.width() as f32,
            height: -rect.height() as f32,
        })
    }
}

/// A bare font whose glyphs are the given rectangles.
pub(crate) fn rect_font(entries: &[(&str, Rect)]) -> ColorFont {
    ColorFont::new(Box::new(RectOutlines::new(entries)))
}

pub(crate) fn rect_path(rect: Rect) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((rect.x0, rect.y0));
    path.line_to((rect.x1, rect.y0));
    path.line_to((rect.x1, rect.y1));
    path.line_to((rect.x0, rect.y1));
    path.close_path();
    path
}

/// Asserts that an expression matches a pattern.
///
/// ## Example
///
/// ```ignore
/// let result = Ok(1);
/// assert_matches!(result, Ok(_));
/// ```
///
/// TODO: Remove this macro once std::assert_matches! is stable.
/// See: https://doc.rust-lang.org/std/assert_matches/macro.assert_matches.html
#[macro_export]
macro_rules! assert_matches {
    ($expression:expr, $pattern:pat) => {
        // We allow redundant pattern matching since the debug output is sometimes more useful. We
        // want "Got <error> and expected .." instead of "failed val.is_ok()".
        #[allow(clippy::redundant_pattern_matching)]
        if !(matches!($expression, $pattern)) {
            let res = $expression;
            panic!(
                "assertion failed: {expr} result {res:?} does not match {pattern}",
                expr = stringify!($expression),
                pattern = stringify!($pattern)
            );
        }
    };
}
