//! Export pipeline: flatten the map and its annotations into one PNG and
//! hand it to a share target or a download.
//!
//! A [`Scene`] is an ordered stack of layers, bottom first. Each layer says
//! explicitly whether it belongs in an export; UI chrome (toolbars, zoom
//! controls, selection outlines) is marked non-exportable when it is added,
//! so nothing has to be inferred from how the chrome looks.
//!
//! Steps: show a progress overlay, composite the exportable layers, hide the
//! overlay (always, even on failure), encode PNG, then deliver. Delivery
//! prefers the share target and falls back to a download when sharing is
//! unavailable or fails. Nothing is written unless every earlier step
//! succeeded.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tiny_skia::{Pixmap, PixmapPaint, Transform};
use tracing::{info, warn};

use crate::color::Color;
use crate::error::ExportError;
use crate::render;

/// Where a layer's pixels come from.
#[derive(Debug, Clone)]
pub enum LayerSource {
    Raster(Pixmap),
    /// The pixels could not be produced (e.g. a map tile failed to load).
    Unavailable(String),
}

/// One raster in the scene stack.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub source: LayerSource,
    /// Placement on the scene, in scene pixels.
    pub transform: Transform,
    /// Whether the layer appears in exported images.
    pub exportable: bool,
}

impl Layer {
    /// Exportable layer drawn without a transform.
    #[must_use]
    pub fn raster(name: impl Into<String>, pixmap: Pixmap) -> Self {
        Self { name: name.into(), source: LayerSource::Raster(pixmap), transform: Transform::identity(), exportable: true }
    }

    /// Non-exportable UI chrome.
    #[must_use]
    pub fn chrome(name: impl Into<String>, pixmap: Pixmap) -> Self {
        Self { exportable: false, ..Self::raster(name, pixmap) }
    }

    /// Exportable layer whose pixels are missing.
    #[must_use]
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: LayerSource::Unavailable(reason.into()),
            transform: Transform::identity(),
            exportable: true,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Everything visible in the map container, bottom layer first.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
}

impl Scene {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, layers: Vec::new() }
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }
}

/// Progress feedback shown while an export is running.
pub trait ExportHost {
    fn show_progress(&mut self);
    fn hide_progress(&mut self);
}

/// Host that shows no progress UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ExportHost for NoProgress {
    fn show_progress(&mut self) {}
    fn hide_progress(&mut self) {}
}

/// Background under the composited layers.
const EXPORT_BACKGROUND: Color = Color::WHITE;

/// Composite every exportable layer of `scene` into one opaque raster.
///
/// # Errors
///
/// - [`ExportError::MissingContainer`] for an empty or zero-sized scene
///   (progress is never shown).
/// - [`ExportError::Rasterize`] if an exportable layer is unavailable.
pub fn rasterize(scene: &Scene, host: &mut dyn ExportHost) -> Result<Pixmap, ExportError> {
    if scene.width == 0 || scene.height == 0 || scene.layers.is_empty() {
        return Err(ExportError::MissingContainer);
    }
    host.show_progress();
    let result = composite(scene);
    host.hide_progress();
    result
}

fn composite(scene: &Scene) -> Result<Pixmap, ExportError> {
    let mut out = render::blank(scene.width, scene.height)?;
    out.fill(EXPORT_BACKGROUND.to_skia());
    let paint = PixmapPaint::default();
    for layer in scene.layers.iter().filter(|l| l.exportable) {
        match &layer.source {
            LayerSource::Raster(pixmap) => out.draw_pixmap(0, 0, pixmap.as_ref(), &paint, layer.transform, None),
            LayerSource::Unavailable(reason) => {
                return Err(ExportError::Rasterize { layer: layer.name.clone(), reason: reason.clone() });
            }
        }
    }
    Ok(out)
}

/// Encode a raster as PNG.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    pixmap.encode_png().map_err(|e| ExportError::Encode(e.to_string()))
}

/// `data:image/png;base64,...` URL for encoded PNG bytes.
#[must_use]
pub fn to_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Output file name: `{city}-map.png`, or `map-{unix_seconds}.png` without a city.
#[must_use]
pub fn file_name(city: Option<&str>) -> String {
    let city = city.map(sanitize_file_stem).filter(|s| !s.is_empty());
    match city {
        Some(city) => format!("{city}-map.png"),
        None => format!("map-{}.png", time::OffsetDateTime::now_utc().unix_timestamp()),
    }
}

/// Strip characters that are not safe in file names. Non-ASCII letters
/// (e.g. `東京`) are kept.
fn sanitize_file_stem(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect::<String>()
        .trim_matches('-')
        .to_owned()
}

/// An encoded image ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    #[must_use]
    pub fn data_url(&self) -> String {
        to_data_url(&self.bytes)
    }
}

/// Receives a finished image, e.g. a native share sheet or a remote store.
#[async_trait::async_trait]
pub trait ShareTarget: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExportError::Share`] when the target rejects the file.
    async fn share(&self, file: &ExportFile) -> Result<(), ExportError>;
}

/// Saves a finished image locally.
#[async_trait::async_trait]
pub trait DownloadTarget: Send + Sync {
    /// Returns where the file ended up.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Download`] if the file cannot be written.
    async fn download(&self, file: &ExportFile) -> Result<PathBuf, ExportError>;
}

/// Download target that writes into a directory.
#[derive(Debug, Clone)]
pub struct FileDownload {
    dir: PathBuf,
}

impl FileDownload {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl DownloadTarget for FileDownload {
    /// Stages the bytes in a hidden file next to the destination and renames
    /// it into place, so a failed write never leaves a partial image. The
    /// write itself is synchronous.
    async fn download(&self, file: &ExportFile) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(&file.name);
        let fail = |source| ExportError::Download { path: path.clone(), source };
        let mut staged =
            tempfile::Builder::new().prefix(".mapsketch-").suffix(".part").tempfile_in(&self.dir).map_err(fail)?;
        staged.write_all(&file.bytes).map_err(fail)?;
        staged.persist(&path).map_err(|e| fail(e.error))?;
        Ok(path)
    }
}

/// How an export was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Shared,
    Downloaded(PathBuf),
}

/// Share `file` if a share target is available, otherwise (or if sharing
/// fails) download it.
///
/// # Errors
///
/// Returns the download error if the fallback also fails.
pub async fn deliver(
    file: &ExportFile,
    share: Option<&dyn ShareTarget>,
    download: &dyn DownloadTarget,
) -> Result<Delivery, ExportError> {
    if let Some(target) = share {
        match target.share(file).await {
            Ok(()) => {
                info!(name = %file.name, bytes = file.bytes.len(), "export shared");
                return Ok(Delivery::Shared);
            }
            Err(e) => warn!(error = %e, "share failed; falling back to download"),
        }
    }
    let path = download.download(file).await?;
    info!(path = %path.display(), bytes = file.bytes.len(), "export downloaded");
    Ok(Delivery::Downloaded(path))
}

/// Rasterize, encode, and name an export in one step.
///
/// # Errors
///
/// Propagates [`rasterize`] and [`encode_png`] failures.
pub fn flatten(scene: &Scene, city: Option<&str>, host: &mut dyn ExportHost) -> Result<ExportFile, ExportError> {
    let pixmap = rasterize(scene, host)?;
    let bytes = encode_png(&pixmap)?;
    Ok(ExportFile { name: file_name(city), bytes })
}

/// Prevents a second save from starting while one is in flight.
#[derive(Debug, Clone, Default)]
pub struct SaveGate {
    in_flight: Arc<AtomicBool>,
}

impl SaveGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate for one save.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::SaveInFlight`] while another guard is alive.
    pub fn begin(&self) -> Result<SaveGuard, ExportError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(ExportError::SaveInFlight);
        }
        Ok(SaveGuard { in_flight: Arc::clone(&self.in_flight) })
    }

    /// Whether the save trigger should currently be disabled.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Held for the duration of one save; dropping it re-enables saving.
#[derive(Debug)]
pub struct SaveGuard {
    in_flight: Arc<AtomicBool>,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
