//! Error types for the canvas crate.
//!
//! Engine operations never panic on bad input; failures at an operation
//! boundary are converted into [`crate::engine::Action::Notice`] so the host
//! can show a transient notification while the surface stays untouched.

use std::path::PathBuf;

/// Failures while drawing onto a pixmap.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },
    #[error("cannot build {0} path")]
    Path(&'static str),
    #[error("no font loaded; text cannot be rendered")]
    FontUnavailable,
    #[error("cannot load font {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },
    #[error("invalid color `{0}`")]
    InvalidColor(String),
}

/// Failures in the map provider.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map is not initialized")]
    NotReady,
    #[error("tile {z}/{x}/{y} is not available")]
    MissingTile { z: u32, x: u32, y: u32 },
    #[error("cannot decode tile {z}/{x}/{y}: {reason}")]
    TileDecode { z: u32, x: u32, y: u32, reason: String },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failures in the export pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: the map container is missing")]
    MissingContainer,
    #[error("cannot rasterize layer `{layer}`: {reason}")]
    Rasterize { layer: String, reason: String },
    #[error("cannot encode PNG: {0}")]
    Encode(String),
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("share failed: {0}")]
    Share(String),
    #[error("cannot write {path}: {source}")]
    Download {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}
