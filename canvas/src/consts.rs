//! Shared numeric constants for the canvas crate.

// ── Shapes ──────────────────────────────────────────────────────

/// Length of each arrowhead segment in surface units.
pub const ARROW_HEAD_LENGTH: f64 = 15.0;

/// Arrowhead half-angle in radians (30°).
pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;

// ── Tool defaults ───────────────────────────────────────────────

/// Default stroke width in surface pixels.
pub const DEFAULT_STROKE_WIDTH: f32 = 4.0;

/// Eraser width as a multiple of the current stroke width.
pub const ERASER_WIDTH_RATIO: f32 = 2.0;

/// Default font size for text annotations in surface pixels.
pub const DEFAULT_TEXT_SIZE: f32 = 20.0;

// ── Text ────────────────────────────────────────────────────────

/// Fallback advance per character, as a fraction of the font size, used when
/// no font is loaded and real metrics are unavailable.
pub const APPROX_CHAR_WIDTH_RATIO: f64 = 0.5;

/// Padding between a selected text object and its selection outline.
pub const SELECTION_PADDING: f32 = 3.0;

// ── Map ─────────────────────────────────────────────────────────

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Lowest zoom level supported by the tile provider.
pub const MIN_ZOOM: f64 = 0.0;

/// Highest zoom level supported by the tile provider.
pub const MAX_ZOOM: f64 = 19.0;

/// Latitude bound of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

// ── Viewport ────────────────────────────────────────────────────

/// Default overlay width when no viewport is configured.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;

/// Default overlay height when no viewport is configured.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 768;
