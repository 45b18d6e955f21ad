//! Place-name lookup against a Nominatim-compatible search endpoint.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use canvas::view::LatLng;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// First match for `query`, or `None` when the place is unknown.
    async fn search(&self, query: &str) -> Result<Option<LatLng>, CliError>;
}

pub struct Nominatim {
    url: String,
    http: reqwest::Client,
}

impl Nominatim {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), http: reqwest::Client::new() }
    }
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn first_place(places: &[Place]) -> Option<LatLng> {
    places.iter().find_map(|p| {
        let lat = p.lat.parse::<f64>().ok()?;
        let lng = p.lon.parse::<f64>().ok()?;
        Some(LatLng::new(lat, lng))
    })
}

#[async_trait::async_trait]
impl Geocoder for Nominatim {
    async fn search(&self, query: &str) -> Result<Option<LatLng>, CliError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .header(USER_AGENT, concat!("mapsketch/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::ServerError { status: status.as_u16(), message: format!("geocoding `{query}` failed") });
        }
        let places = response.json::<Vec<Place>>().await?;
        let found = first_place(&places);
        debug!(query, ?found, "geocoded");
        Ok(found)
    }
}

/// Resolve `query` or fail with [`CliError::PlaceNotFound`].
pub async fn locate(geocoder: &dyn Geocoder, query: &str) -> Result<LatLng, CliError> {
    geocoder.search(query).await?.ok_or_else(|| CliError::PlaceNotFound(query.to_owned()))
}
