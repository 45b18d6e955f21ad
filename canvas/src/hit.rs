#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use ab_glyph::FontArc;

use crate::text::{TextId, TextObject};
use crate::view::Point;

/// First text object (in stored order) whose box contains `surface_pt`.
#[must_use]
pub fn hit_test(surface_pt: Point, objects: &[TextObject], font: Option<&FontArc>) -> Option<TextId> {
    objects
        .iter()
        .find(|o| o.bounds(font).contains(surface_pt))
        .map(|o| o.id)
}
