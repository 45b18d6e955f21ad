use super::*;
use crate::color::Color;

fn fixture_font() -> FontArc {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    crate::text::load_font(&path).unwrap()
}

fn label(text: &str, x: f64, y: f64, size: f32) -> TextObject {
    TextObject::new(text, Point::new(x, y), Color::BLACK, size)
}

// "Hello" at size 20 without a font: 5 * 10 = 50 wide, 20 tall above baseline.

#[test]
fn click_inside_box_hits() {
    let objects = vec![label("Hello", 100.0, 100.0, 20.0)];
    assert_eq!(hit_test(Point::new(125.0, 90.0), &objects, None), Some(objects[0].id));
}

#[test]
fn box_edges_are_inclusive() {
    let objects = vec![label("Hello", 100.0, 100.0, 20.0)];
    for p in [Point::new(100.0, 80.0), Point::new(150.0, 100.0)] {
        assert_eq!(hit_test(p, &objects, None), Some(objects[0].id), "{p:?}");
    }
}

#[test]
fn click_below_baseline_misses() {
    let objects = vec![label("Hello", 100.0, 100.0, 20.0)];
    assert_eq!(hit_test(Point::new(120.0, 100.5), &objects, None), None);
}

#[test]
fn click_past_estimated_width_misses() {
    let objects = vec![label("Hello", 100.0, 100.0, 20.0)];
    assert_eq!(hit_test(Point::new(150.5, 90.0), &objects, None), None);
}

#[test]
fn first_match_wins_when_boxes_overlap() {
    let objects = vec![label("first", 0.0, 50.0, 20.0), label("second", 10.0, 55.0, 20.0)];
    assert_eq!(hit_test(Point::new(20.0, 45.0), &objects, None), Some(objects[0].id));
}

#[test]
fn empty_layer_never_hits() {
    assert_eq!(hit_test(Point::new(0.0, 0.0), &[], None), None);
}

#[test]
fn measured_box_replaces_the_estimate() {
    let font = fixture_font();
    let objects = vec![label("WWWW", 100.0, 100.0, 20.0)];
    let right = objects[0].bounds(Some(&font)).right;
    assert!(right > 160.0, "measured right edge {right}");

    // Past the 40px estimate but inside the glyphs.
    assert_eq!(hit_test(Point::new(150.0, 90.0), &objects, None), None);
    assert_eq!(hit_test(Point::new(150.0, 90.0), &objects, Some(&font)), Some(objects[0].id));
    assert_eq!(hit_test(Point::new(right + 1.0, 90.0), &objects, Some(&font)), None);
}
