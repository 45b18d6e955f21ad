//! Map persistence routes. All of them require a session.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use serde_json::{Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::maps::{MapDraft, MapRecord, MapSummary};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SavedMap {
    pub id: Uuid,
    pub title: String,
    pub city: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&MapRecord> for SavedMap {
    fn from(r: &MapRecord) -> Self {
        Self { id: r.id, title: r.title.clone(), city: r.city.clone(), created_at: r.created_at, updated_at: r.updated_at }
    }
}

/// `GET /api/maps`: the caller's maps, newest first, without images.
pub async fn list_maps(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<MapSummary>>, ApiError> {
    Ok(Json(state.maps.list(auth.user.id).await?))
}

/// `GET /api/maps/{id}`: one map including its image.
///
/// An id that is not a UUID cannot name a stored map, so it is 404 like any
/// other unknown id.
pub async fn get_map(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MapRecord>, ApiError> {
    let Path(id) = path?;
    Ok(Json(state.maps.get(auth.user.id, id).await?))
}

/// `POST /api/maps`: save a new map.
pub async fn create_map(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<MapDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(draft) = body?;
    let record = state.maps.create(auth.user.id, draft.validate()?).await?;
    tracing::info!(map_id = %record.id, user_id = %auth.user.id, city = %record.city, "map saved");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "map saved", "map": SavedMap::from(&record) })),
    ))
}

/// `PUT /api/maps/{id}`: replace a map's fields.
///
/// Ownership is checked before the body is validated, so a foreign id is
/// 404 even with an invalid body.
pub async fn update_map(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<MapDraft>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    state.maps.get(auth.user.id, id).await?;
    let Json(draft) = body?;
    let record = state.maps.update(auth.user.id, id, draft.validate()?).await?;
    tracing::info!(map_id = %record.id, user_id = %auth.user.id, "map updated");
    Ok(Json(json!({ "message": "map updated", "map": SavedMap::from(&record) })))
}

/// `DELETE /api/maps/{id}`.
pub async fn delete_map(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    state.maps.delete(auth.user.id, id).await?;
    tracing::info!(map_id = %id, user_id = %auth.user.id, "map deleted");
    Ok(Json(json!({ "message": "map deleted" })))
}

#[cfg(test)]
#[path = "maps_test.rs"]
mod tests;
