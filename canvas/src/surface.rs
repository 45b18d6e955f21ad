//! The drawing surface: a transparent raster layer stacked above the map.
//!
//! The surface lives in zoom-1.0 surface space. Snapshots are immutable,
//! reference-counted copies of the whole raster, so history entries are cheap
//! to clone and can never be mutated after capture.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use std::sync::Arc;

use tiny_skia::{Color as SkColor, Pixmap};

use crate::error::RenderError;
use crate::render;

/// Immutable raster capture of the full surface.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<Pixmap>);

impl Snapshot {
    /// The captured pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.0
    }

    /// Whether two snapshots hold identical pixels.
    #[must_use]
    pub fn same_pixels(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.data() == other.0.data()
    }
}

/// Transparent overlay raster receiving strokes, shapes, and flattened text.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Allocate a transparent surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Allocation`] for zero or oversized dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        Ok(Self { pixmap: render::blank(width, height)? })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Capture the current pixels.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Arc::new(self.pixmap.clone()))
    }

    /// Replace the pixels with a snapshot's. Sizes always match because
    /// snapshots are only ever taken from this surface.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.pixmap.clone_from(snapshot.pixmap());
    }

    /// Erase everything.
    pub fn clear(&mut self) {
        self.pixmap.fill(SkColor::TRANSPARENT);
    }

    /// Whether no pixel has any coverage.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }
}
