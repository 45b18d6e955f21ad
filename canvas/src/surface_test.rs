use super::*;
use crate::color::Color;
use crate::render::{StrokeStyle, stroke_segment};
use crate::view::Point;

fn scribble(surface: &mut Surface) {
    stroke_segment(
        surface.pixmap_mut(),
        Point::new(2.0, 2.0),
        Point::new(30.0, 30.0),
        &StrokeStyle::pen(Color::BLACK, 3.0),
    )
    .unwrap();
}

#[test]
fn new_surface_is_blank() {
    let surface = Surface::new(32, 32).unwrap();
    assert!(surface.is_blank());
    assert_eq!((surface.width(), surface.height()), (32, 32));
}

#[test]
fn zero_sized_surface_fails() {
    assert!(Surface::new(0, 0).is_err());
}

#[test]
fn snapshot_is_unaffected_by_later_drawing() {
    let mut surface = Surface::new(32, 32).unwrap();
    let before = surface.snapshot();
    scribble(&mut surface);
    assert!(!surface.is_blank());
    assert!(before.pixmap().pixels().iter().all(|p| p.alpha() == 0));
}

#[test]
fn restore_brings_back_snapshot_pixels() {
    let mut surface = Surface::new(32, 32).unwrap();
    let empty = surface.snapshot();
    scribble(&mut surface);
    let drawn = surface.snapshot();
    surface.restore(&empty);
    assert!(surface.is_blank());
    surface.restore(&drawn);
    assert!(surface.snapshot().same_pixels(&drawn));
}

#[test]
fn clear_erases_everything() {
    let mut surface = Surface::new(32, 32).unwrap();
    scribble(&mut surface);
    surface.clear();
    assert!(surface.is_blank());
}

#[test]
fn cloned_snapshots_share_pixels() {
    let surface = Surface::new(8, 8).unwrap();
    let a = surface.snapshot();
    let b = a.clone();
    assert!(a.same_pixels(&b));
}
