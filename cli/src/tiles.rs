//! Fill a [`TileMap`]'s cache over HTTP.

#[cfg(test)]
#[path = "tiles_test.rs"]
mod tiles_test;

use canvas::map::{TileCoord, TileMap};
use reqwest::header::USER_AGENT;
use tracing::{debug, warn};

use crate::error::CliError;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Outcome of one fetch pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    pub fetched: usize,
    pub failed: usize,
}

async fn fetch_tile(http: &reqwest::Client, template: &str, coord: TileCoord) -> Result<Vec<u8>, CliError> {
    let response = http
        .get(coord.url(template))
        .header(USER_AGENT, concat!("mapsketch/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: format!("tile {}/{}/{}", coord.z, coord.x, coord.y) });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Download every tile the current view needs and is not cached.
///
/// A tile that cannot be fetched or decoded stays missing; the export of the
/// base map then fails for that tile instead of producing a partial image.
pub async fn fetch_missing(
    http: &reqwest::Client,
    template: &str,
    map: &mut TileMap,
    width: u32,
    height: u32,
) -> FetchReport {
    let mut report = FetchReport::default();
    for coord in map.missing_tiles(width, height) {
        let result = match fetch_tile(http, template, coord).await {
            Ok(png) => map.insert_tile_png(coord, &png).map_err(CliError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => report.fetched += 1,
            Err(e) => {
                warn!(z = coord.z, x = coord.x, y = coord.y, error = %e, "tile unavailable");
                report.failed += 1;
            }
        }
    }
    debug!(fetched = report.fetched, failed = report.failed, "tile pass complete");
    report
}
