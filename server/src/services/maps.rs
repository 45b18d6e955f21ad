//! Map records: validation, ownership, and storage.
//!
//! DESIGN
//! ======
//! Every operation takes the authenticated owner's id and filters on it.
//! A record owned by someone else is indistinguishable from a missing one,
//! so cross-owner access always surfaces as [`MapError::NotFound`].
//!
//! Listing omits `image_data`; exported PNG data URLs are large and only
//! fetched one record at a time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 19.0;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map not found: {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    Validation(String),
    #[error("stored map {0} has a malformed center")]
    CorruptCenter(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// `[lat, lng]` in degrees.
pub type Center = [f64; 2];

/// Full stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_data: Option<String>,
    pub city: String,
    pub center: Center,
    pub zoom: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// List entry: a record without its image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub center: Center,
    pub zoom: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<MapRecord> for MapSummary {
    fn from(r: MapRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            city: r.city,
            center: r.center,
            zoom: r.zoom,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Request body for create and update, before validation.
///
/// Fields are loosely typed so that a wrong type reports the same way as a
/// missing field.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MapDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_data: Option<String>,
    pub city: Option<String>,
    pub center: Option<Value>,
    pub zoom: Option<Value>,
}

/// Validated fields for create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct MapInput {
    pub title: String,
    pub description: Option<String>,
    pub image_data: Option<String>,
    pub city: String,
    pub center: Center,
    pub zoom: f64,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn parse_center(value: &Value) -> Option<Center> {
    let [lat, lng] = value.as_array()?.as_slice() else {
        return None;
    };
    let (lat, lng) = (lat.as_f64()?, lng.as_f64()?);
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some([lat, lng])
}

impl MapDraft {
    /// Check required fields and value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Validation`] naming every missing required field,
    /// or the first malformed one.
    pub fn validate(self) -> Result<MapInput, MapError> {
        let title = non_blank(self.title);
        let city = non_blank(self.city);
        let center = self.center.filter(|v| !v.is_null());
        let zoom = self.zoom.filter(|v| !v.is_null());

        let missing: Vec<&str> = [
            ("title", title.is_none()),
            ("city", city.is_none()),
            ("center", center.is_none()),
            ("zoom", zoom.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
        let (Some(title), Some(city), Some(center), Some(zoom)) = (title, city, center, zoom) else {
            return Err(MapError::Validation(format!("missing required fields: {}", missing.join(", "))));
        };

        let center = parse_center(&center)
            .ok_or_else(|| MapError::Validation("center must be [lat, lng] in degrees".into()))?;
        let zoom = zoom
            .as_f64()
            .filter(|z| (MIN_ZOOM..=MAX_ZOOM).contains(z))
            .ok_or_else(|| MapError::Validation(format!("zoom must be a number between {MIN_ZOOM} and {MAX_ZOOM}")))?;

        let image_data = non_blank(self.image_data);
        if image_data.as_deref().is_some_and(|d| !d.starts_with("data:image/")) {
            return Err(MapError::Validation("image_data must be a data:image/... URL".into()));
        }

        Ok(MapInput { title, description: non_blank(self.description), image_data, city, center, zoom })
    }
}

// =============================================================================
// STORE
// =============================================================================

#[async_trait::async_trait]
pub trait MapStore: Send + Sync {
    /// The owner's maps, most recently updated first.
    async fn list(&self, owner: Uuid) -> Result<Vec<MapSummary>, MapError>;

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<MapRecord, MapError>;

    async fn create(&self, owner: Uuid, input: MapInput) -> Result<MapRecord, MapError>;

    /// Replace every editable field and bump `updated_at`.
    async fn update(&self, owner: Uuid, id: Uuid, input: MapInput) -> Result<MapRecord, MapError>;

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), MapError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgMapStore {
    pool: PgPool,
}

impl PgMapStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RECORD_COLUMNS: &str =
    "id, owner_id, title, description, image_data, city, center, zoom, created_at, updated_at";

fn decode_center(id: Uuid, raw: &str) -> Result<Center, MapError> {
    serde_json::from_str(raw).map_err(|_| MapError::CorruptCenter(id))
}

fn encode_center(center: Center) -> String {
    format!("[{},{}]", center[0], center[1])
}

fn record_from_row(row: &PgRow) -> Result<MapRecord, MapError> {
    let id: Uuid = row.try_get("id")?;
    let center: String = row.try_get("center")?;
    Ok(MapRecord {
        id,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        image_data: row.try_get("image_data")?,
        city: row.try_get("city")?,
        center: decode_center(id, &center)?,
        zoom: row.try_get("zoom")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl MapStore for PgMapStore {
    async fn list(&self, owner: Uuid) -> Result<Vec<MapSummary>, MapError> {
        let rows = sqlx::query(
            "SELECT id, title, description, city, center, zoom, created_at, updated_at
             FROM maps
             WHERE owner_id = $1
             ORDER BY updated_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<MapSummary, MapError> {
                let id: Uuid = row.try_get("id")?;
                let center: String = row.try_get("center")?;
                Ok(MapSummary {
                    id,
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                    city: row.try_get("city")?,
                    center: decode_center(id, &center)?,
                    zoom: row.try_get("zoom")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<MapRecord, MapError> {
        let row = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM maps WHERE id = $1 AND owner_id = $2"))
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(MapError::NotFound(id))?;
        record_from_row(&row)
    }

    async fn create(&self, owner: Uuid, input: MapInput) -> Result<MapRecord, MapError> {
        let row = sqlx::query(&format!(
            "INSERT INTO maps (id, owner_id, title, description, image_data, city, center, zoom)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.image_data)
        .bind(&input.city)
        .bind(encode_center(input.center))
        .bind(input.zoom)
        .fetch_one(&self.pool)
        .await?;
        let record = record_from_row(&row)?;
        info!(map_id = %record.id, %owner, "map created");
        Ok(record)
    }

    async fn update(&self, owner: Uuid, id: Uuid, input: MapInput) -> Result<MapRecord, MapError> {
        let row = sqlx::query(&format!(
            "UPDATE maps
             SET title = $3, description = $4, image_data = $5, city = $6, center = $7, zoom = $8,
                 updated_at = now()
             WHERE id = $1 AND owner_id = $2
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.image_data)
        .bind(&input.city)
        .bind(encode_center(input.center))
        .bind(input.zoom)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(MapError::NotFound(id))?;
        record_from_row(&row)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), MapError> {
        let result = sqlx::query("DELETE FROM maps WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MapError::NotFound(id));
        }
        info!(map_id = %id, %owner, "map deleted");
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-local store for tests and database-less development.
#[derive(Default)]
pub struct MemoryMapStore {
    maps: RwLock<HashMap<Uuid, MapRecord>>,
}

impl MemoryMapStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MapStore for MemoryMapStore {
    async fn list(&self, owner: Uuid) -> Result<Vec<MapSummary>, MapError> {
        let maps = self.maps.read().await;
        let mut owned: Vec<MapRecord> = maps.values().filter(|m| m.owner_id == owner).cloned().collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned.into_iter().map(MapSummary::from).collect())
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<MapRecord, MapError> {
        let maps = self.maps.read().await;
        maps.get(&id)
            .filter(|m| m.owner_id == owner)
            .cloned()
            .ok_or(MapError::NotFound(id))
    }

    async fn create(&self, owner: Uuid, input: MapInput) -> Result<MapRecord, MapError> {
        let now = OffsetDateTime::now_utc();
        let record = MapRecord {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: input.title,
            description: input.description,
            image_data: input.image_data,
            city: input.city,
            center: input.center,
            zoom: input.zoom,
            created_at: now,
            updated_at: now,
        };
        self.maps.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, owner: Uuid, id: Uuid, input: MapInput) -> Result<MapRecord, MapError> {
        let mut maps = self.maps.write().await;
        let record = maps
            .get_mut(&id)
            .filter(|m| m.owner_id == owner)
            .ok_or(MapError::NotFound(id))?;
        record.title = input.title;
        record.description = input.description;
        record.image_data = input.image_data;
        record.city = input.city;
        record.center = input.center;
        record.zoom = input.zoom;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), MapError> {
        let mut maps = self.maps.write().await;
        if !maps.get(&id).is_some_and(|m| m.owner_id == owner) {
            return Err(MapError::NotFound(id));
        }
        maps.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "maps_test.rs"]
mod tests;
