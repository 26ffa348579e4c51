//! An SVG document backend.
//!
//! Paths are baked to document coordinates before serialization; gradients
//! use `gradientUnits="userSpaceOnUse"` with the canvas transform folded
//! into `gradientTransform`. Clips become `<clipPath>` defs referenced by
//! nested groups, so intersecting clips nest naturally. Sweep gradients have
//! no SVG primitive and fall back to a solid fill of the first stop.

use crate::canvas::{is_degenerate, Canvas};
use crate::color::{Color, ColorStop, Extend};
use crate::xml_element::XmlElement;
use kurbo::{Affine, BezPath, PathEl, Point, Rect};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Finer rounding for transform and gradient numbers, where two decimals
/// would visibly distort small scale factors.
fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

fn coord_string(p: Point) -> String {
    format!("{},{}", round2(p.x), round2(p.y))
}

/// Serializes a path to SVG `d` syntax, closing subpaths back to their
/// start point the way outline pens expect.
fn write_svg_path(path: &BezPath) -> String {
    let mut svg = String::new();
    let mut subpath_start = Point::default();
    let mut curr = Point::default();
    for el in path.elements() {
        match el {
            PathEl::MoveTo(p) => {
                svg.push('M');
                svg.push_str(&coord_string(*p));
                subpath_start = *p;
                curr = *p;
            }
            PathEl::LineTo(p) => {
                svg.push('L');
                svg.push_str(&coord_string(*p));
                curr = *p;
            }
            PathEl::QuadTo(p1, p2) => {
                svg.push('Q');
                svg.push_str(&coord_string(*p1));
                svg.push(' ');
                svg.push_str(&coord_string(*p2));
                curr = *p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                svg.push('C');
                svg.push_str(&coord_string(*p1));
                svg.push(' ');
                svg.push_str(&coord_string(*p2));
                svg.push(' ');
                svg.push_str(&coord_string(*p3));
                curr = *p3;
            }
            PathEl::ClosePath => {
                if curr != subpath_start {
                    svg.push('L');
                    svg.push_str(&coord_string(subpath_start));
                }
                svg.push('Z');
            }
        }
    }
    svg
}

fn matrix_attr(affine: Affine) -> String {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        round6(a),
        round6(b),
        round6(c),
        round6(d),
        round6(e),
        round6(f)
    )
}

fn css_color(color: Color) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgb({},{},{})",
        channel(color.r),
        channel(color.g),
        channel(color.b)
    )
}

fn spread_method(extend: Extend) -> Option<&'static str> {
    match extend {
        Extend::Pad => None,
        Extend::Repeat => Some("repeat"),
        Extend::Reflect => Some("reflect"),
    }
}

fn stop_elements(stops: &[ColorStop]) -> Vec<XmlElement> {
    stops
        .iter()
        .map(|stop| {
            let mut el = XmlElement::new("stop")
                .with_attribute("offset", round6(stop.offset as f64))
                .with_attribute("stop-color", css_color(stop.color));
            if stop.color.a < 1.0 {
                el.add_attribute("stop-opacity", round6(stop.color.a as f64));
            }
            el
        })
        .collect()
}

#[derive(Clone)]
struct SvgState {
    transform: Affine,
    clip_is_empty: bool,
}

struct SvgSaved {
    state: SvgState,
    group_depth: usize,
}

/// Renders canvas operations into an SVG document string.
pub struct SvgCanvas {
    width: f64,
    height: f64,
    defs: Vec<XmlElement>,
    content: Vec<XmlElement>,
    group_stack: Vec<XmlElement>,
    state: SvgState,
    saved: Vec<SvgSaved>,
    next_id: usize,
}

impl SvgCanvas {
    /// A canvas covering `bounds` in Y-up font space; the document flips to
    /// SVG's Y-down coordinates.
    pub fn new(bounds: Rect) -> SvgCanvas {
        let transform = Affine::new([1.0, 0.0, 0.0, -1.0, -bounds.x0, bounds.y1]);
        SvgCanvas {
            width: bounds.width(),
            height: bounds.height(),
            defs: Vec::new(),
            content: Vec::new(),
            group_stack: Vec::new(),
            state: SvgState {
                transform,
                clip_is_empty: false,
            },
            saved: Vec::new(),
            next_id: 0,
        }
    }

    /// Assembles the document. Any groups still open (unbalanced saves) are
    /// closed.
    pub fn finish(mut self) -> String {
        while let Some(group) = self.group_stack.pop() {
            self.append_to(group);
        }
        let mut svg = XmlElement::new("svg")
            .with_attribute("xmlns", "http://www.w3.org/2000/svg")
            .with_attribute(
                "viewBox",
                format!("0 0 {} {}", round2(self.width), round2(self.height)),
            )
            .with_attribute("width", round2(self.width))
            .with_attribute("height", round2(self.height));
        if !self.defs.is_empty() {
            let mut defs = XmlElement::new("defs");
            for def in self.defs {
                defs.add_child(def);
            }
            svg.add_child(defs);
        }
        for el in self.content {
            svg.add_child(el);
        }
        svg.to_string()
    }

    fn append_to(&mut self, el: XmlElement) {
        match self.group_stack.last_mut() {
            Some(group) => group.add_child(el),
            None => self.content.push(el),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }

    fn fill_element(&mut self, path: &BezPath, fill: &str, opacity: f32) {
        let device = self.state.transform * path.clone();
        let mut el = XmlElement::new("path")
            .with_attribute("d", write_svg_path(&device))
            .with_attribute("fill", fill);
        if opacity < 1.0 {
            el.add_attribute("fill-opacity", round6(opacity as f64));
        }
        self.append_to(el);
    }

    fn skip_fill(&self, path: &BezPath) -> bool {
        self.state.clip_is_empty || is_degenerate(path)
    }

    fn fill_first_stop(&mut self, path: &BezPath, stops: &[ColorStop]) {
        if let Some(first) = stops.first() {
            self.fill_element(path, &css_color(first.color), first.color.a);
        }
    }
}

impl Canvas for SvgCanvas {
    fn save_state(&mut self) {
        self.saved.push(SvgSaved {
            state: self.state.clone(),
            group_depth: self.group_stack.len(),
        });
    }

    fn restore_state(&mut self) {
        debug_assert!(!self.saved.is_empty(), "restore without matching save");
        let Some(saved) = self.saved.pop() else {
            return;
        };
        while self.group_stack.len() > saved.group_depth {
            if let Some(group) = self.group_stack.pop() {
                self.append_to(group);
            }
        }
        self.state = saved.state;
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
        let id = self.next_id("clip");
        self.defs.push(
            XmlElement::new("clipPath")
                .with_attribute("id", id.clone())
                .with_child(XmlElement::new("path").with_attribute("d", write_svg_path(&device))),
        );
        self.group_stack
            .push(XmlElement::new("g").with_attribute("clip-path", format!("url(#{})", id)));
    }

    fn draw_path_solid(&mut self, path: &BezPath, color: Color) {
        if self.skip_fill(path) {
            return;
        }
        self.fill_element(path, &css_color(color), color.a);
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
        if self.skip_fill(path) {
            return;
        }
        if stops.is_empty() {
            return;
        }
        let id = self.next_id("grad");
        let mut gradient = XmlElement::new("linearGradient")
            .with_attribute("id", id.clone())
            .with_attribute("gradientUnits", "userSpaceOnUse")
            .with_attribute("x1", round6(p0.x))
            .with_attribute("y1", round6(p0.y))
            .with_attribute("x2", round6(p1.x))
            .with_attribute("y2", round6(p1.y))
            .with_attribute(
                "gradientTransform",
                matrix_attr(self.state.transform * gradient_transform),
            );
        if let Some(method) = spread_method(extend) {
            gradient.add_attribute("spreadMethod", method);
        }
        for stop in stop_elements(stops) {
            gradient.add_child(stop);
        }
        self.defs.push(gradient);

        // The d attribute is in device space, so the element itself carries
        // no transform; the gradient mapping lives on the def.
        let device = self.state.transform * path.clone();
        self.append_to(
            XmlElement::new("path")
                .with_attribute("d", write_svg_path(&device))
                .with_attribute("fill", format!("url(#{})", id)),
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
        if self.skip_fill(path) {
            return;
        }
        if stops.is_empty() {
            return;
        }
        let id = self.next_id("grad");
        let mut gradient = XmlElement::new("radialGradient")
            .with_attribute("id", id.clone())
            .with_attribute("gradientUnits", "userSpaceOnUse")
            .with_attribute("fx", round6(c0.x))
            .with_attribute("fy", round6(c0.y))
            .with_attribute("fr", round6(r0))
            .with_attribute("cx", round6(c1.x))
            .with_attribute("cy", round6(c1.y))
            .with_attribute("r", round6(r1))
            .with_attribute(
                "gradientTransform",
                matrix_attr(self.state.transform * gradient_transform),
            );
        if let Some(method) = spread_method(extend) {
            gradient.add_attribute("spreadMethod", method);
        }
        for stop in stop_elements(stops) {
            gradient.add_child(stop);
        }
        self.defs.push(gradient);

        let device = self.state.transform * path.clone();
        self.append_to(
            XmlElement::new("path")
                .with_attribute("d", write_svg_path(&device))
                .with_attribute("fill", format!("url(#{})", id)),
        );
    }

    fn draw_path_sweep_gradient(
        &mut self,
        path: &BezPath,
        stops: &[ColorStop],
        _center: Point,
        _start_angle: f64,
        _end_angle: f64,
        _extend: Extend,
        _gradient_transform: Affine,
    ) {
        // SVG has no sweep primitive; approximate with the first stop.
        if self.skip_fill(path) {
            return;
        }
        self.fill_first_stop(path, stops);
    }
}
