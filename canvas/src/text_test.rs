use super::*;

fn layer() -> TextLayer {
    TextLayer::new(200, 100).unwrap()
}

fn fixture_font() -> FontArc {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    crate::text::load_font(&path).unwrap()
}

fn label(text: &str) -> TextObject {
    TextObject::new(text, Point::new(10.0, 50.0), Color::BLACK, 20.0)
}

#[test]
fn approximate_width_without_font() {
    let o = label("abcd");
    assert!((o.width(None) - 40.0).abs() < f64::EPSILON);
}

#[test]
fn bounds_sit_above_baseline() {
    let b = label("ab").bounds(None);
    assert_eq!(b, TextBounds { left: 10.0, top: 30.0, right: 30.0, bottom: 50.0 });
}

#[test]
fn width_counts_characters_not_bytes() {
    let o = TextObject::new("東京", Point::default(), Color::BLACK, 10.0);
    assert!((o.width(None) - 10.0).abs() < f64::EPSILON);
}

#[test]
fn add_assigns_distinct_ids() {
    let mut layer = layer();
    let a = layer.add(label("a"));
    let b = layer.add(label("b"));
    assert_ne!(a, b);
    assert_eq!(layer.objects().len(), 2);
}

#[test]
fn selection_is_exclusive() {
    let mut layer = layer();
    let a = layer.add(label("a"));
    let b = layer.add(label("b"));
    layer.select(Some(a));
    layer.select(Some(b));
    assert_eq!(layer.selected(), Some(b));
}

#[test]
fn selecting_unknown_id_clears_selection() {
    let mut layer = layer();
    let a = layer.add(label("a"));
    layer.select(Some(a));
    layer.select(Some(Uuid::new_v4()));
    assert_eq!(layer.selected(), None);
}

#[test]
fn remove_selected_clears_selection() {
    let mut layer = layer();
    let a = layer.add(label("a"));
    layer.add(label("b"));
    layer.select(Some(a));
    let removed = layer.remove_selected().unwrap();
    assert_eq!(removed.id, a);
    assert_eq!(layer.selected(), None);
    assert_eq!(layer.objects().len(), 1);
}

#[test]
fn remove_without_selection_is_noop() {
    let mut layer = layer();
    layer.add(label("a"));
    assert!(layer.remove_selected().is_none());
    assert_eq!(layer.objects().len(), 1);
}

#[test]
fn edit_selected_replaces_text() {
    let mut layer = layer();
    let a = layer.add(label("old"));
    assert!(!layer.edit_selected("nothing selected"));
    layer.select(Some(a));
    assert!(layer.edit_selected("new"));
    assert_eq!(layer.get(a).unwrap().text, "new");
}

#[test]
fn redraw_without_font_reports_unavailable_but_draws_selection() {
    let mut layer = layer();
    let a = layer.add(label("abc"));
    layer.select(Some(a));
    assert!(matches!(layer.redraw(None), Err(RenderError::FontUnavailable)));
    assert!(layer.chrome().pixels().iter().any(|p| p.alpha() > 0));
    assert!(layer.pixmap().pixels().iter().all(|p| p.alpha() == 0));
}

#[test]
fn redraw_of_empty_layer_succeeds_without_font() {
    let mut layer = layer();
    assert!(layer.redraw(None).is_ok());
}

#[test]
fn clear_drops_objects_and_selection() {
    let mut layer = layer();
    let a = layer.add(label("a"));
    layer.select(Some(a));
    layer.clear();
    assert!(layer.objects().is_empty());
    assert_eq!(layer.selected(), None);
}

#[test]
fn load_font_reports_missing_file() {
    let err = load_font(Path::new("/definitely/not/a/font.ttf")).unwrap_err();
    assert!(matches!(err, RenderError::FontLoad { .. }));
}

#[test]
fn load_font_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ttf");
    std::fs::write(&path, b"not a font").unwrap();
    assert!(matches!(load_font(&path), Err(RenderError::FontLoad { .. })));
}

#[test]
fn measured_width_follows_glyph_advances() {
    let font = fixture_font();
    let narrow = label("iiii").width(Some(&font));
    let wide = label("WWWW").width(Some(&font));
    assert!(narrow > 0.0);
    assert!(wide > 2.0 * narrow, "iiii={narrow} WWWW={wide}");
    // The estimate treats both alike.
    assert!((label("iiii").width(None) - label("WWWW").width(None)).abs() < f64::EPSILON);
}

#[test]
fn redraw_with_font_paints_above_the_baseline() {
    let font = fixture_font();
    let mut layer = layer();
    layer.add(label("Shibuya"));
    layer.redraw(Some(&font)).unwrap();

    let pixmap = layer.pixmap();
    let painted = |y: u32| (10..100).any(|x| pixmap.pixel(x, y).is_some_and(|p| p.alpha() > 0));
    assert!((35..50).any(painted));
    assert!(!(58..100).any(painted));
    assert!(layer.chrome().pixels().iter().all(|p| p.alpha() == 0));
}
