use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

#[test]
fn circle_radius_is_anchor_distance() {
    let g = geometry(ShapeKind::Circle, pt(10.0, 10.0), pt(13.0, 14.0));
    let ShapeGeometry::Circle { center, radius } = g else {
        panic!("expected circle, got {g:?}");
    };
    assert_eq!(center, pt(10.0, 10.0));
    assert!(approx_eq(radius, 5.0));
}

#[test]
fn rectangle_spans_signed_bounding_box() {
    let corners = rectangle_corners(pt(50.0, 50.0), pt(20.0, 80.0));
    assert_eq!(corners, [pt(50.0, 50.0), pt(20.0, 50.0), pt(20.0, 80.0), pt(50.0, 80.0)]);
}

#[test]
fn rectangle_geometry_is_closed_polygon() {
    let g = geometry(ShapeKind::Rectangle, pt(0.0, 0.0), pt(4.0, 3.0));
    assert_eq!(g, ShapeGeometry::Polygon(vec![pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 3.0), pt(0.0, 3.0)]));
}

#[test]
fn triangle_mirrors_base_across_anchor() {
    let v = triangle_vertices(pt(100.0, 10.0), pt(130.0, 60.0));
    assert_eq!(v, [pt(100.0, 10.0), pt(130.0, 60.0), pt(70.0, 60.0)]);
}

#[test]
fn triangle_is_isosceles() {
    let [apex, a, b] = triangle_vertices(pt(3.0, -2.0), pt(11.0, 9.0));
    assert!(approx_eq(apex.distance(a), apex.distance(b)));
}

#[test]
fn arrow_shaft_runs_anchor_to_current() {
    let segs = arrow_segments(pt(0.0, 0.0), pt(100.0, 0.0));
    assert_eq!(segs[0], (pt(0.0, 0.0), pt(100.0, 0.0)));
}

#[test]
fn arrow_head_points_back_along_shaft() {
    let segs = arrow_segments(pt(0.0, 0.0), pt(100.0, 0.0));
    let (from_l, left) = segs[1];
    let (from_r, right) = segs[2];
    assert_eq!(from_l, pt(100.0, 0.0));
    assert_eq!(from_r, pt(100.0, 0.0));
    assert!(left.x < 100.0 && right.x < 100.0);
    assert!(approx_eq(left.y, -right.y));
    assert!(approx_eq(pt(100.0, 0.0).distance(left), ARROW_HEAD_LENGTH));
    assert!(approx_eq(pt(100.0, 0.0).distance(right), ARROW_HEAD_LENGTH));
}

#[test]
fn arrow_head_is_symmetric_for_diagonal() {
    let tip = pt(50.0, 50.0);
    let segs = arrow_segments(pt(0.0, 0.0), tip);
    let l = segs[1].1;
    let r = segs[2].1;
    // Mirror images across the line y = x.
    assert!(approx_eq(l.x, r.y));
    assert!(approx_eq(l.y, r.x));
}
