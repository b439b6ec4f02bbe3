//! Shape paths and their rasterization onto a scratch raster.
//!
//! Shapes are not written as PDF vectors. Each one is painted onto a
//! page-sized pixmap that the assembler stacks as an image layer, so opacity
//! and rounded corners come out exactly as on the editor canvas.

use canvas_scene::{Element, ElementKind, ElementStyle, Transform};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke};

use crate::color::Rgba;

/// Hexagon vertices as fractions of the element box.
const HEXAGON: [(f32, f32); 6] = [
    (0.5, 0.05),
    (0.95, 0.25),
    (0.95, 0.75),
    (0.5, 0.95),
    (0.05, 0.75),
    (0.05, 0.25),
];

/// Star vertices (outer and inner alternating) as fractions of the element box.
const STAR: [(f32, f32); 10] = [
    (0.5, 0.1),
    (0.61, 0.35),
    (0.88, 0.35),
    (0.67, 0.52),
    (0.78, 0.78),
    (0.5, 0.6),
    (0.22, 0.78),
    (0.33, 0.52),
    (0.12, 0.35),
    (0.39, 0.35),
];

/// Paint settings for one draw, resolved from an element's style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    /// Opacity factor applied to fill and stroke.
    pub opacity: f32,
    /// Fill color, if any.
    pub fill: Option<Rgba>,
    /// Stroke color and width, if any.
    pub stroke: Option<(Rgba, f32)>,
}

impl ShapeStyle {
    /// Resolve paints from an element style.
    ///
    /// Unparseable colors are dropped with a warning; transparent ones are
    /// dropped silently.
    #[must_use]
    pub fn from_style(style: &ElementStyle) -> Self {
        let fill = style.background_color.as_deref().and_then(parse_paint);
        let stroke = style
            .border()
            .and_then(|(color, width)| parse_paint(color).map(|c| (c, width)));
        Self {
            opacity: style.opacity_factor(),
            fill,
            stroke,
        }
    }

    /// Same opacity and stroke, without a fill.
    #[must_use]
    pub fn stroke_only(self) -> Self {
        Self { fill: None, ..self }
    }

    /// Whether drawing with this style can change any pixel.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && (self.fill.is_some() || self.stroke.is_some())
    }
}

fn parse_paint(color: &str) -> Option<Rgba> {
    match Rgba::parse(color) {
        Some(c) if c.is_transparent() => None,
        Some(c) => Some(c),
        None => {
            tracing::warn!(color, "Ignoring unsupported color");
            None
        }
    }
}

/// Axis-aligned rectangle covering the box.
#[must_use]
pub fn rect_path(t: &Transform) -> Option<Path> {
    Rect::from_xywh(t.x, t.y, t.width, t.height).map(PathBuilder::from_rect)
}

/// Rectangle with quadratic corners of `radius`.
///
/// The radius is used as given, even when it exceeds half the box.
#[must_use]
pub fn rounded_rect_path(t: &Transform, radius: f32) -> Option<Path> {
    let (x, y, w, h, r) = (t.x, t.y, t.width, t.height, radius);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Ellipse inscribed in the box, with independent radii.
#[must_use]
pub fn ellipse_path(t: &Transform) -> Option<Path> {
    Rect::from_xywh(t.x, t.y, t.width, t.height).and_then(PathBuilder::from_oval)
}

/// Closed polygon through points given as fractions of the box.
fn polygon_path(t: &Transform, points: &[(f32, f32)]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(t.x + t.width * first.0, t.y + t.height * first.1);
    for (fx, fy) in rest {
        pb.line_to(t.x + t.width * fx, t.y + t.height * fy);
    }
    pb.close();
    pb.finish()
}

/// Triangle through top-middle, bottom-right and bottom-left.
#[must_use]
pub fn triangle_path(t: &Transform) -> Option<Path> {
    polygon_path(t, &[(0.5, 0.0), (1.0, 1.0), (0.0, 1.0)])
}

/// Six-point hexagon inscribed in the box.
#[must_use]
pub fn hexagon_path(t: &Transform) -> Option<Path> {
    polygon_path(t, &HEXAGON)
}

/// Five-armed star inscribed in the box.
#[must_use]
pub fn star_path(t: &Transform) -> Option<Path> {
    polygon_path(t, &STAR)
}

/// Outline of a vector shape element, or `None` for text, images and boxes
/// without area.
#[must_use]
pub fn shape_path(kind: &ElementKind, t: &Transform) -> Option<Path> {
    if t.is_degenerate() {
        return None;
    }
    match kind {
        ElementKind::Rectangle {
            border_radius: Some(radius),
        } if *radius > 0.0 => rounded_rect_path(t, *radius),
        ElementKind::Rectangle { .. } => rect_path(t),
        ElementKind::Circle => ellipse_path(t),
        ElementKind::Triangle => triangle_path(t),
        ElementKind::Hexagon => hexagon_path(t),
        ElementKind::Star => star_path(t),
        ElementKind::Text(_) | ElementKind::Image { .. } => None,
    }
}

/// Fill then stroke `path` with `style`.
///
/// Alpha is carried by the paint of this call only; nothing persists on the
/// pixmap between draws.
pub fn draw_shape(pixmap: &mut Pixmap, path: &Path, style: &ShapeStyle) {
    if let Some(fill) = style.fill {
        let mut paint = Paint::default();
        paint.set_color(fill.to_skia(style.opacity));
        paint.anti_alias = true;
        pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    if let Some((color, width)) = style.stroke {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia(style.opacity));
        paint.anti_alias = true;
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            path,
            &paint,
            &stroke,
            tiny_skia::Transform::identity(),
            None,
        );
    }
}

/// Rasterize a shape element onto `pixmap`.
///
/// Returns `false` when nothing was drawn (no path, no paint, zero opacity).
pub fn rasterize_shape(pixmap: &mut Pixmap, element: &Element) -> bool {
    let style = ShapeStyle::from_style(&element.style);
    if !style.is_visible() {
        return false;
    }
    let Some(path) = shape_path(&element.kind, &element.transform) else {
        return false;
    };
    draw_shape(pixmap, &path, &style);
    true
}
