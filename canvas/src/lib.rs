//! Annotation engine for the map sketching tool.
//!
//! The engine owns everything between raw pointer input and pixels: a
//! transparent drawing surface stacked over a map, the tool state machine that
//! interprets pointer gestures, a snapshot history for undo/redo, live text
//! objects, and the export pipeline that flattens the map and its annotations
//! into a single PNG. The host (a browser shell, the CLI, a test) is only
//! responsible for feeding map and pointer events in and acting on the
//! returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::EngineCore`] and the actions it emits |
//! | [`view`] | Map view state, scale factor, and overlay coordinate transforms |
//! | [`input`] | Tools, tool settings, and the gesture state machine |
//! | [`surface`] | Raster drawing surface and immutable snapshots |
//! | [`render`] | Low-level drawing onto pixmaps (strokes, shapes, glyphs) |
//! | [`shapes`] | Shape geometry (circle, rectangle, triangle, arrow) |
//! | [`history`] | Linear undo/redo stack |
//! | [`text`] | Live, selectable text objects and font handling |
//! | [`hit`] | Hit-testing against text objects |
//! | [`map`] | Map provider seam and slippy-tile compositing |
//! | [`export`] | Layer compositing, PNG encoding, download/share delivery |
//! | [`color`] | RGBA colors parsed from hex strings |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants |

pub mod color;
pub mod consts;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod hit;
pub mod input;
pub mod map;
pub mod render;
pub mod shapes;
pub mod surface;
pub mod text;
pub mod view;
