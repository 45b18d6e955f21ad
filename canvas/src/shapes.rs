//! Shape geometry for the shape tool.
//!
//! Every shape is defined by the anchor (pointer-down) and the current
//! pointer position, both in surface space.

#[cfg(test)]
#[path = "shapes_test.rs"]
mod shapes_test;

use crate::consts::{ARROW_HEAD_ANGLE, ARROW_HEAD_LENGTH};
use crate::input::ShapeKind;
use crate::view::Point;

/// Resolved outline of a shape, ready to be stroked.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    Circle { center: Point, radius: f64 },
    /// Closed polygon.
    Polygon(Vec<Point>),
    /// Independent line segments.
    Segments(Vec<(Point, Point)>),
}

/// Geometry for `kind` dragged from `anchor` to `current`.
#[must_use]
pub fn geometry(kind: ShapeKind, anchor: Point, current: Point) -> ShapeGeometry {
    match kind {
        ShapeKind::Circle => ShapeGeometry::Circle { center: anchor, radius: anchor.distance(current) },
        ShapeKind::Rectangle => ShapeGeometry::Polygon(rectangle_corners(anchor, current).to_vec()),
        ShapeKind::Triangle => ShapeGeometry::Polygon(triangle_vertices(anchor, current).to_vec()),
        ShapeKind::Arrow => ShapeGeometry::Segments(arrow_segments(anchor, current).to_vec()),
    }
}

/// Corners of the signed bounding box spanned by `anchor` and `current`,
/// starting at the anchor.
#[must_use]
pub fn rectangle_corners(anchor: Point, current: Point) -> [Point; 4] {
    [
        anchor,
        Point::new(current.x, anchor.y),
        current,
        Point::new(anchor.x, current.y),
    ]
}

/// Isosceles triangle with its apex at `anchor`; the base runs from
/// `current` to its mirror image across the anchor's vertical axis.
#[must_use]
pub fn triangle_vertices(anchor: Point, current: Point) -> [Point; 3] {
    [anchor, current, Point::new(2.0 * anchor.x - current.x, current.y)]
}

/// Shaft plus the two head segments of an arrow pointing at `current`.
#[must_use]
pub fn arrow_segments(anchor: Point, current: Point) -> [(Point, Point); 3] {
    let angle = (current.y - anchor.y).atan2(current.x - anchor.x);
    let head = |offset: f64| {
        Point::new(
            current.x - ARROW_HEAD_LENGTH * (angle + offset).cos(),
            current.y - ARROW_HEAD_LENGTH * (angle + offset).sin(),
        )
    };
    [
        (anchor, current),
        (current, head(-ARROW_HEAD_ANGLE)),
        (current, head(ARROW_HEAD_ANGLE)),
    ]
}
