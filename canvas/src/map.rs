//! Map provider seam and a slippy-tile implementation.
//!
//! The engine never talks to a map widget directly. It only consumes
//! [`MapEvent`]s (ready, moved, zoomed) and, at export time, asks a
//! [`MapProvider`] for a raster of the base map at the current view.
//!
//! [`TileMap`] is the concrete provider used by hosts without a browser map
//! widget: it does Web Mercator math, works out which 256px tiles cover the
//! viewport, and composites tiles the host has fetched into its cache.

#[cfg(test)]
#[path = "map_test.rs"]
mod map_test;

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::debug;

use crate::color::Color;
use crate::consts::{MAX_LATITUDE, MAX_ZOOM, MIN_ZOOM, TILE_SIZE};
use crate::error::MapError;
use crate::render;
use crate::view::{LatLng, MapView, Point};

/// Background painted under tiles.
const LAND_COLOR: Color = Color::rgb(0xf2, 0xef, 0xe9);

/// View-change notifications from the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "view", rename_all = "snake_case")]
pub enum MapEvent {
    /// One-shot: the widget finished initializing.
    Ready(MapView),
    /// The map was panned.
    Moved(MapView),
    /// The zoom level changed (possibly with a pan).
    Zoomed(MapView),
}

impl MapEvent {
    #[must_use]
    pub fn view(&self) -> MapView {
        match *self {
            Self::Ready(v) | Self::Moved(v) | Self::Zoomed(v) => v,
        }
    }
}

/// What the engine needs from a map widget.
pub trait MapProvider {
    /// Current view, or `None` before initialization completes.
    fn view(&self) -> Option<MapView>;

    /// Jump to `view`. Returns the event to forward to the engine.
    fn set_view(&mut self, view: MapView) -> Option<MapEvent>;

    /// Zoom in one level, if not already at the maximum.
    fn zoom_in(&mut self) -> Option<MapEvent>;

    /// Zoom out one level, if not already at the minimum.
    fn zoom_out(&mut self) -> Option<MapEvent>;

    /// Rasterize the base map for a `width`×`height` viewport.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the map is not ready or imagery is missing.
    fn render_base(&self, width: u32, height: u32) -> Result<Pixmap, MapError>;
}

/// Address of one slippy-map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Expand a `{z}/{x}/{y}` URL template.
    #[must_use]
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// A tile positioned on the viewport, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub coord: TileCoord,
    pub left: f64,
    pub top: f64,
    /// Drawn edge length (256 scaled by the fractional zoom remainder).
    pub size: f64,
}

/// Project a coordinate to world pixels at `zoom` (Web Mercator).
#[must_use]
pub fn project(ll: LatLng, zoom: f64) -> Point {
    let world = f64::from(TILE_SIZE) * zoom.exp2();
    let lat = ll.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (ll.lng + 180.0) / 360.0 * world;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
    Point::new(x, y)
}

/// Inverse of [`project`].
#[must_use]
pub fn unproject(p: Point, zoom: f64) -> LatLng {
    let world = f64::from(TILE_SIZE) * zoom.exp2();
    let lng = p.x / world * 360.0 - 180.0;
    let n = PI - 2.0 * PI * p.y / world;
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Tiles covering a `width`×`height` viewport centered on `view`.
///
/// Tiles are fetched at the nearest integer zoom and scaled by the fractional
/// remainder. Columns wrap around the antimeridian; rows outside the world
/// are skipped.
#[must_use]
pub fn tile_layout(view: MapView, width: u32, height: u32) -> Vec<PlacedTile> {
    let tile_zoom = view.zoom.round().clamp(MIN_ZOOM, MAX_ZOOM);
    let z = tile_zoom as u32;
    let k = (view.zoom - tile_zoom).exp2();
    let tile = f64::from(TILE_SIZE);
    let count = 1_i64 << z;

    let center = project(view.center, tile_zoom);
    let half_w = f64::from(width) / k / 2.0;
    let half_h = f64::from(height) / k / 2.0;
    let (left, top) = (center.x - half_w, center.y - half_h);
    let (right, bottom) = (center.x + half_w, center.y + half_h);

    let first_col = (left / tile).floor() as i64;
    let last_col = ((right / tile).ceil() as i64 - 1).max(first_col);
    let first_row = ((top / tile).floor() as i64).max(0);
    let last_row = ((bottom / tile).ceil() as i64 - 1).min(count - 1);

    let mut placed = Vec::new();
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            placed.push(PlacedTile {
                coord: TileCoord { z, x: col.rem_euclid(count) as u32, y: row as u32 },
                left: (col as f64 * tile - left) * k,
                top: (row as f64 * tile - top) * k,
                size: tile * k,
            });
        }
    }
    placed
}

/// Slippy-tile map provider backed by a tile cache the host fills.
#[derive(Debug, Clone)]
pub struct TileMap {
    view: Option<MapView>,
    tiles: HashMap<TileCoord, Pixmap>,
}

impl Default for TileMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TileMap {
    /// An uninitialized map; call [`TileMap::init`] once the host is ready.
    #[must_use]
    pub fn new() -> Self {
        Self { view: None, tiles: HashMap::new() }
    }

    /// Complete initialization. Returns the ready signal the first time only.
    pub fn init(&mut self, view: MapView) -> Option<MapEvent> {
        if self.view.is_some() {
            return None;
        }
        let view = clamp_view(view);
        self.view = Some(view);
        Some(MapEvent::Ready(view))
    }

    /// Cache a decoded tile.
    pub fn insert_tile(&mut self, coord: TileCoord, tile: Pixmap) {
        self.tiles.insert(coord, tile);
    }

    /// Decode and cache a PNG tile.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::TileDecode`] if the bytes are not a valid PNG.
    pub fn insert_tile_png(&mut self, coord: TileCoord, png: &[u8]) -> Result<(), MapError> {
        let tile = Pixmap::decode_png(png).map_err(|e| MapError::TileDecode {
            z: coord.z,
            x: coord.x,
            y: coord.y,
            reason: e.to_string(),
        })?;
        self.insert_tile(coord, tile);
        Ok(())
    }

    /// Tiles the current view needs that are not cached yet.
    #[must_use]
    pub fn missing_tiles(&self, width: u32, height: u32) -> Vec<TileCoord> {
        let Some(view) = self.view else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        tile_layout(view, width, height)
            .into_iter()
            .map(|t| t.coord)
            .filter(|c| !self.tiles.contains_key(c) && seen.insert(*c))
            .collect()
    }

    fn change_zoom(&mut self, delta: f64) -> Option<MapEvent> {
        let view = self.view?;
        let zoom = (view.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if (zoom - view.zoom).abs() < f64::EPSILON {
            return None;
        }
        let next = MapView::new(view.center, zoom);
        self.view = Some(next);
        Some(MapEvent::Zoomed(next))
    }
}

fn clamp_view(view: MapView) -> MapView {
    MapView::new(
        LatLng::new(view.center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), view.center.lng),
        view.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
    )
}

impl MapProvider for TileMap {
    fn view(&self) -> Option<MapView> {
        self.view
    }

    fn set_view(&mut self, view: MapView) -> Option<MapEvent> {
        let previous = self.view?;
        let next = clamp_view(view);
        self.view = Some(next);
        if (next.zoom - previous.zoom).abs() < f64::EPSILON {
            Some(MapEvent::Moved(next))
        } else {
            Some(MapEvent::Zoomed(next))
        }
    }

    fn zoom_in(&mut self) -> Option<MapEvent> {
        self.change_zoom(1.0)
    }

    fn zoom_out(&mut self) -> Option<MapEvent> {
        self.change_zoom(-1.0)
    }

    fn render_base(&self, width: u32, height: u32) -> Result<Pixmap, MapError> {
        let view = self.view.ok_or(MapError::NotReady)?;
        let mut base = render::blank(width, height)?;
        base.fill(LAND_COLOR.to_skia());

        let paint = PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() };
        for placed in tile_layout(view, width, height) {
            let TileCoord { z, x, y } = placed.coord;
            let tile = self.tiles.get(&placed.coord).ok_or(MapError::MissingTile { z, x, y })?;
            let k = (placed.size / f64::from(TILE_SIZE)) as f32;
            let transform = Transform::from_row(k, 0.0, 0.0, k, placed.left as f32, placed.top as f32);
            base.draw_pixmap(0, 0, tile.as_ref(), &paint, transform, None);
        }
        debug!(width, height, zoom = view.zoom, "base map rendered");
        Ok(base)
    }
}
