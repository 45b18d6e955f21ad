//! Live text objects.
//!
//! Unlike strokes, live text is never flattened into history snapshots. The
//! layer keeps the objects as data and repaints its own raster from scratch
//! whenever the set or the selection changes. The selection outline goes to a
//! separate chrome raster so it never ends up in an export.

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use std::path::Path;

use ab_glyph::FontArc;
use serde::{Deserialize, Serialize};
use tiny_skia::{Color as SkColor, Pixmap};
use tracing::debug;
use uuid::Uuid;

use crate::color::Color;
use crate::consts::{APPROX_CHAR_WIDTH_RATIO, SELECTION_PADDING};
use crate::error::RenderError;
use crate::render;
use crate::view::Point;

/// Unique identifier for a text object.
pub type TextId = Uuid;

/// Load a TrueType/OpenType font from disk.
///
/// # Errors
///
/// Returns [`RenderError::FontLoad`] if the file cannot be read or parsed.
pub fn load_font(path: &Path) -> Result<FontArc, RenderError> {
    let bytes = std::fs::read(path).map_err(|e| RenderError::FontLoad { path: path.to_owned(), reason: e.to_string() })?;
    FontArc::try_from_vec(bytes).map_err(|e| RenderError::FontLoad { path: path.to_owned(), reason: e.to_string() })
}

/// Fonts tried in order when none is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First well-known system font that loads, if any.
#[must_use]
pub fn load_system_font() -> Option<FontArc> {
    SYSTEM_FONTS.iter().find_map(|candidate| match load_font(Path::new(candidate)) {
        Ok(font) => {
            debug!(path = *candidate, "using system font");
            Some(font)
        }
        Err(_) => None,
    })
}

/// A placed piece of text. `(x, y)` is the start of the baseline in surface space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub id: TextId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: Color,
    pub size: f32,
}

/// Axis-aligned box in surface space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl TextBounds {
    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

impl TextObject {
    #[must_use]
    pub fn new(text: impl Into<String>, at: Point, color: Color, size: f32) -> Self {
        Self { id: Uuid::new_v4(), text: text.into(), x: at.x, y: at.y, color, size }
    }

    /// Rendered width: measured from the font when one is loaded, otherwise
    /// estimated at half the font size per character.
    #[must_use]
    pub fn width(&self, font: Option<&FontArc>) -> f64 {
        match font {
            Some(font) => f64::from(render::measure_text(font, &self.text, self.size)),
            None => self.text.chars().count() as f64 * f64::from(self.size) * APPROX_CHAR_WIDTH_RATIO,
        }
    }

    /// Box spanning one line of text above the baseline.
    #[must_use]
    pub fn bounds(&self, font: Option<&FontArc>) -> TextBounds {
        TextBounds {
            left: self.x,
            top: self.y - f64::from(self.size),
            right: self.x + self.width(font),
            bottom: self.y,
        }
    }
}

/// Live text objects, their exclusive selection, and their rasters.
#[derive(Debug, Clone)]
pub struct TextLayer {
    objects: Vec<TextObject>,
    selected: Option<TextId>,
    pixmap: Pixmap,
    chrome: Pixmap,
}

impl TextLayer {
    /// # Errors
    ///
    /// Returns [`RenderError::Allocation`] for zero or oversized dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        Ok(Self {
            objects: Vec::new(),
            selected: None,
            pixmap: render::blank(width, height)?,
            chrome: render::blank(width, height)?,
        })
    }

    #[must_use]
    pub fn objects(&self) -> &[TextObject] {
        &self.objects
    }

    #[must_use]
    pub fn get(&self, id: TextId) -> Option<&TextObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Append an object and return its id.
    pub fn add(&mut self, object: TextObject) -> TextId {
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Replace the selection. Unknown ids clear it.
    pub fn select(&mut self, id: Option<TextId>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    #[must_use]
    pub fn selected(&self) -> Option<TextId> {
        self.selected
    }

    /// Remove the selected object; the selection is cleared.
    pub fn remove_selected(&mut self) -> Option<TextObject> {
        let id = self.selected.take()?;
        let pos = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(pos))
    }

    /// Replace the text of the selected object. Returns false when nothing is selected.
    pub fn edit_selected(&mut self, text: &str) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(object) => {
                text.clone_into(&mut object.text);
                true
            }
            None => false,
        }
    }

    /// Drop every object and the selection.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.selected = None;
        self.pixmap.fill(SkColor::TRANSPARENT);
        self.chrome.fill(SkColor::TRANSPARENT);
    }

    /// Text pixels (exportable).
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Selection outline pixels (never exported).
    #[must_use]
    pub fn chrome(&self) -> &Pixmap {
        &self.chrome
    }

    /// Clear both rasters and repaint every object plus the selection outline.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::FontUnavailable`] when objects exist but no font
    /// is loaded; the selection outline is still drawn.
    pub fn redraw(&mut self, font: Option<&FontArc>) -> Result<(), RenderError> {
        self.pixmap.fill(SkColor::TRANSPARENT);
        self.chrome.fill(SkColor::TRANSPARENT);

        let selection = self.selected.and_then(|id| self.get(id)).map(|o| o.bounds(font));
        if let Some(b) = selection {
            let pad = SELECTION_PADDING;
            render::outline_rect(
                &mut self.chrome,
                b.left as f32 - pad,
                b.top as f32 - pad,
                b.right as f32 + pad,
                b.bottom as f32 + pad,
                Color::rgb(0x1e, 0x88, 0xe5),
                1.0,
            )?;
        }

        if self.objects.is_empty() {
            return Ok(());
        }
        let Some(font) = font else {
            debug!(count = self.objects.len(), "text objects present but no font loaded");
            return Err(RenderError::FontUnavailable);
        };
        for object in &self.objects {
            render::draw_text(&mut self.pixmap, font, &object.text, Point::new(object.x, object.y), object.size, object.color)?;
        }
        Ok(())
    }
}
