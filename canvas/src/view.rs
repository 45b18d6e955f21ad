//! View-state tracking: keeps the overlay aligned with the map as it zooms.
//!
//! Strokes are stored in "zoom-1.0 surface space", i.e. the coordinate space
//! of the overlay at the zoom level the map was initialized with. Every
//! pointer position is divided by the current scale before it is recorded,
//! and only rendering multiplies it back. This keeps annotations anchored to
//! the same geographic point while the user zooms.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A point in either screen or surface space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// What the map widget reports: where it is centered and how far it is zoomed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
}

impl MapView {
    #[must_use]
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

/// Published view state: the map view plus the derived overlay scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center: LatLng,
    pub zoom: f64,
    /// `2^(initial_zoom - zoom)`.
    pub scale: f64,
}

/// CSS-equivalent visual transform for the overlay element
/// (`transform: scale(s); transform-origin: x y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayTransform {
    pub scale: f64,
    pub origin: Point,
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self { scale: 1.0, origin: Point::default() }
    }
}

impl OverlayTransform {
    /// Equivalent `tiny_skia` transform for compositing the overlay.
    #[must_use]
    pub fn to_skia(self) -> tiny_skia::Transform {
        let s = self.scale as f32;
        let (ox, oy) = (self.origin.x as f32, self.origin.y as f32);
        tiny_skia::Transform::from_translate(-ox, -oy)
            .post_scale(s, s)
            .post_translate(ox, oy)
    }
}

/// Scale factor for the overlay given the initial and current zoom levels.
#[must_use]
pub fn scale_for(initial_zoom: f64, zoom: f64) -> f64 {
    (initial_zoom - zoom).exp2()
}

/// Observes map view changes and derives the overlay scale.
///
/// The tracker is inert until [`ViewTracker::ready`] delivers the map's
/// initial view; events that arrive earlier are dropped.
#[derive(Debug, Clone, Default)]
pub struct ViewTracker {
    initial_zoom: Option<f64>,
    state: Option<ViewState>,
}

impl ViewTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the map has finished initializing.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.initial_zoom.is_some()
    }

    /// One-shot ready signal. Later calls are ignored.
    pub fn ready(&mut self, view: MapView) -> Option<OverlayTransform> {
        if self.is_ready() {
            debug!("view tracker already initialized; ignoring ready signal");
            return None;
        }
        self.initial_zoom = Some(view.zoom);
        self.state = Some(ViewState { center: view.center, zoom: view.zoom, scale: 1.0 });
        Some(self.transform())
    }

    /// Republish view state after a pan or zoom. No-op until ready.
    pub fn update(&mut self, view: MapView) -> Option<OverlayTransform> {
        let Some(initial_zoom) = self.initial_zoom else {
            debug!("map event before ready; ignoring");
            return None;
        };
        self.state = Some(ViewState { center: view.center, zoom: view.zoom, scale: scale_for(initial_zoom, view.zoom) });
        Some(self.transform())
    }

    /// Current view state, if the map is ready.
    #[must_use]
    pub fn state(&self) -> Option<ViewState> {
        self.state
    }

    /// Zoom level captured by the ready signal.
    #[must_use]
    pub fn initial_zoom(&self) -> Option<f64> {
        self.initial_zoom
    }

    /// Current overlay scale (1.0 before the map is ready).
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.state.map_or(1.0, |s| s.scale)
    }

    /// Overlay transform for the current scale.
    #[must_use]
    pub fn transform(&self) -> OverlayTransform {
        OverlayTransform { scale: self.scale(), origin: Point::default() }
    }

    /// Convert a pointer offset on the overlay element to surface space.
    #[must_use]
    pub fn screen_to_surface(&self, screen: Point) -> Point {
        let s = self.scale();
        Point { x: screen.x / s, y: screen.y / s }
    }

    /// Convert a surface-space point back to an on-screen offset.
    #[must_use]
    pub fn surface_to_screen(&self, surface: Point) -> Point {
        let s = self.scale();
        Point { x: surface.x * s, y: surface.y * s }
    }
}
