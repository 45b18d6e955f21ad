use reqwest::StatusCode as Status;
use serde_json::{Value, json};

use crate::config::HttpConfig;
use crate::state::AppState;
use crate::state::test_helpers::{client_with_session, seed_session, spawn_app, test_app_state};

fn tokyo_body() -> Value {
    json!({
        "title": "Tokyo notes",
        "city": "東京",
        "center": [35.6895, 139.6917],
        "zoom": 12,
    })
}

struct Fixture {
    base: String,
    owner: reqwest::Client,
    other: reqwest::Client,
}

async fn fixture() -> Fixture {
    let state = test_app_state();
    let (_, owner_token) = seed_session(&state, "owner@example.jp").await;
    let (_, other_token) = seed_session(&state, "other@example.jp").await;
    let base = spawn_app(state).await;
    Fixture { base, owner: client_with_session(&owner_token), other: client_with_session(&other_token) }
}

async fn create(fx: &Fixture, body: &Value) -> reqwest::Response {
    fx.owner.post(format!("{}/api/maps", fx.base)).json(body).send().await.unwrap()
}

async fn create_id(fx: &Fixture) -> String {
    let body: Value = create(fx, &tokyo_body()).await.json().await.unwrap();
    body["map"]["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn tokyo_scenario() {
    let fx = fixture().await;

    let res = create(&fx, &tokyo_body()).await;
    assert_eq!(res.status(), Status::CREATED);
    let body: Value = res.json().await.unwrap();
    let id = body["map"]["id"].as_str().unwrap().to_owned();
    assert_eq!(body["map"]["city"], "東京");

    let list: Value = fx.owner.get(format!("{}/api/maps", fx.base)).send().await.unwrap().json().await.unwrap();
    let entries = list.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], id.as_str());
    assert_eq!(entries[0]["title"], "Tokyo notes");
    assert!(entries[0].get("image_data").is_none());

    let res = fx.other.get(format!("{}/api/maps/{id}", fx.base)).send().await.unwrap();
    assert_eq!(res.status(), Status::NOT_FOUND);
}

#[tokio::test]
async fn get_returns_image_data() {
    let fx = fixture().await;
    let mut body = tokyo_body();
    body["image_data"] = json!("data:image/png;base64,iVBORw0KGgo=");
    let created: Value = create(&fx, &body).await.json().await.unwrap();
    let id = created["map"]["id"].as_str().unwrap();

    let map: Value = fx.owner.get(format!("{}/api/maps/{id}", fx.base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(map["image_data"], "data:image/png;base64,iVBORw0KGgo=");
    assert_eq!(map["center"], json!([35.6895, 139.6917]));
}

#[tokio::test]
async fn missing_fields_are_400_and_nothing_is_stored() {
    let fx = fixture().await;
    for field in ["title", "city", "center", "zoom"] {
        let mut body = tokyo_body();
        body.as_object_mut().unwrap().remove(field);
        let res = create(&fx, &body).await;
        assert_eq!(res.status(), Status::BAD_REQUEST, "without {field}");
        let err: Value = res.json().await.unwrap();
        assert!(err["message"].as_str().unwrap().contains(field));
    }
    let list: Value = fx.owner.get(format!("{}/api/maps", fx.base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let fx = fixture().await;
    let res = fx
        .owner
        .post(format!("{}/api/maps", fx.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert!(err["message"].is_string());
}

#[tokio::test]
async fn requests_without_session_are_401() {
    let fx = fixture().await;
    let anon = reqwest::Client::new();
    let res = anon.get(format!("{}/api/maps", fx.base)).send().await.unwrap();
    assert_eq!(res.status(), Status::UNAUTHORIZED);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "authentication required");

    let res = anon.post(format!("{}/api/maps", fx.base)).json(&tokyo_body()).send().await.unwrap();
    assert_eq!(res.status(), Status::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_session_is_401() {
    let fx = fixture().await;
    let res = client_with_session("deadbeef").get(format!("{}/api/maps", fx.base)).send().await.unwrap();
    assert_eq!(res.status(), Status::UNAUTHORIZED);
}

#[tokio::test]
async fn update_replaces_fields() {
    let fx = fixture().await;
    let id = create_id(&fx).await;
    let mut body = tokyo_body();
    body["title"] = json!("Tokyo, day two");
    let res = fx.owner.put(format!("{}/api/maps/{id}", fx.base)).json(&body).send().await.unwrap();
    assert_eq!(res.status(), Status::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["map"]["title"], "Tokyo, day two");

    let map: Value = fx.owner.get(format!("{}/api/maps/{id}", fx.base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(map["title"], "Tokyo, day two");
}

#[tokio::test]
async fn update_validates_required_fields() {
    let fx = fixture().await;
    let id = create_id(&fx).await;
    let res = fx.owner.put(format!("{}/api/maps/{id}", fx.base)).json(&json!({"title": "x"})).send().await.unwrap();
    assert_eq!(res.status(), Status::BAD_REQUEST);
}

#[tokio::test]
async fn cross_owner_update_and_delete_are_404() {
    let fx = fixture().await;
    let id = create_id(&fx).await;

    let res = fx.other.put(format!("{}/api/maps/{id}", fx.base)).json(&tokyo_body()).send().await.unwrap();
    assert_eq!(res.status(), Status::NOT_FOUND);
    let res = fx.other.put(format!("{}/api/maps/{id}", fx.base)).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), Status::NOT_FOUND);
    let res = fx.other.delete(format!("{}/api/maps/{id}", fx.base)).send().await.unwrap();
    assert_eq!(res.status(), Status::NOT_FOUND);

    let res = fx.owner.get(format!("{}/api/maps/{id}", fx.base)).send().await.unwrap();
    assert_eq!(res.status(), Status::OK);
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let fx = fixture().await;
    let id = create_id(&fx).await;
    let res = fx.owner.delete(format!("{}/api/maps/{id}", fx.base)).send().await.unwrap();
    assert_eq!(res.status(), Status::OK);
    let res = fx.owner.get(format!("{}/api/maps/{id}", fx.base)).send().await.unwrap();
    assert_eq!(res.status(), Status::NOT_FOUND);
}

#[tokio::test]
async fn non_uuid_id_is_json_404() {
    let fx = fixture().await;
    let url = format!("{}/api/maps/not-a-uuid", fx.base);
    for res in [
        fx.owner.get(&url).send().await.unwrap(),
        fx.owner.put(&url).json(&tokyo_body()).send().await.unwrap(),
        fx.owner.delete(&url).send().await.unwrap(),
    ] {
        assert_eq!(res.status(), Status::NOT_FOUND);
        let content_type = res.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("application/json"), "got {content_type}");
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["message"], "not found");
    }
}

#[tokio::test]
async fn oversized_body_keeps_413_as_json() {
    let state = AppState::memory(HttpConfig { dev_auth: true, max_body_bytes: 256, ..HttpConfig::default() });
    let (_, token) = seed_session(&state, "owner@example.jp").await;
    let base = spawn_app(state).await;

    let mut body = tokyo_body();
    body["image_data"] = json!(format!("data:image/png;base64,{}", "A".repeat(4096)));
    let res = client_with_session(&token).post(format!("{base}/api/maps")).json(&body).send().await.unwrap();
    assert_eq!(res.status(), Status::PAYLOAD_TOO_LARGE);
    let err: Value = res.json().await.unwrap();
    assert!(err["message"].is_string());
}

#[tokio::test]
async fn healthz_is_ok() {
    let fx = fixture().await;
    let res = reqwest::get(format!("{}/healthz", fx.base)).await.unwrap();
    assert_eq!(res.status(), Status::OK);
}
