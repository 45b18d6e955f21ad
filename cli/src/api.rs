//! Client for the map persistence service.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use canvas::error::ExportError;
use canvas::export::{ExportFile, ShareTarget};
use reqwest::Method;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::CliError;

/// Body of `POST /api/maps`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMap {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    pub city: String,
    pub center: [f64; 2],
    pub zoom: f64,
}

pub struct ApiClient {
    base_url: String,
    session_token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client. The session token, when present, is sent as the
    /// `session_token` cookie on every request.
    pub fn new(base_url: &str, session_token: Option<String>) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &session_token {
            headers.insert(COOKIE, HeaderValue::from_str(&format!("session_token={token}"))?);
        }
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_owned(), session_token, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<(), CliError> {
        let response = self.http.get(self.url("/healthz")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::ServerError {
                status: status.as_u16(),
                message: "health check failed".to_owned(),
            });
        }
        Ok(())
    }

    /// Send an authenticated JSON request and return the decoded body.
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, CliError> {
        if self.session_token.is_none() {
            return Err(CliError::MissingSessionToken);
        }

        let request = self.http.request(method, self.url(path));
        let request = if let Some(json) = body { request.json(&json) } else { request };

        let response = request.send().await?;
        let status = response.status();
        let value = response.json::<Value>().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(CliError::ServerError { status: status.as_u16(), message: error_message(&value) });
        }
        Ok(value)
    }

    pub async fn list_maps(&self) -> Result<Value, CliError> {
        self.request(Method::GET, "/api/maps", None).await
    }

    pub async fn get_map(&self, id: Uuid) -> Result<Value, CliError> {
        self.request(Method::GET, &format!("/api/maps/{id}"), None).await
    }

    pub async fn delete_map(&self, id: Uuid) -> Result<Value, CliError> {
        self.request(Method::DELETE, &format!("/api/maps/{id}"), None).await
    }

    /// Save a new map and return its id.
    pub async fn save_map(&self, map: &NewMap) -> Result<Uuid, CliError> {
        let body = serde_json::to_value(map)?;
        let created = self.request(Method::POST, "/api/maps", Some(body)).await?;
        created
            .pointer("/map/id")
            .and_then(Value::as_str)
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or(CliError::MissingField("map.id"))
    }
}

/// The server's `{"message": ...}` error text, or the raw body.
fn error_message(body: &Value) -> String {
    match body.get("message").and_then(Value::as_str) {
        Some(message) => message.to_owned(),
        None => body.to_string(),
    }
}

/// Share target that stores the export in the user's account.
pub struct MapUpload<'a> {
    pub api: &'a ApiClient,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub center: [f64; 2],
    pub zoom: f64,
}

#[async_trait::async_trait]
impl ShareTarget for MapUpload<'_> {
    async fn share(&self, file: &ExportFile) -> Result<(), ExportError> {
        let map = NewMap {
            title: self.title.clone(),
            description: self.description.clone(),
            image_data: Some(file.data_url()),
            city: self.city.clone(),
            center: self.center,
            zoom: self.zoom,
        };
        let id = self.api.save_map(&map).await.map_err(|e| ExportError::Share(e.to_string()))?;
        info!(map_id = %id, title = %map.title, "map uploaded");
        Ok(())
    }
}
