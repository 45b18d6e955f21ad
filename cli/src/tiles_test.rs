use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use canvas::error::MapError;
use canvas::map::MapProvider;
use canvas::view::{LatLng, MapView};

use super::*;

fn png_tile() -> Vec<u8> {
    let mut tile = tiny_skia::Pixmap::new(256, 256).unwrap();
    tile.fill(tiny_skia::Color::from_rgba8(170, 211, 223, 255));
    tile.encode_png().unwrap()
}

async fn tile(Path((z, _x, _y)): Path<(u32, u32, String)>) -> (StatusCode, Vec<u8>) {
    match z {
        0 => (StatusCode::OK, png_tile()),
        1 => (StatusCode::OK, b"not a png".to_vec()),
        _ => (StatusCode::NOT_FOUND, Vec::new()),
    }
}

async fn spawn() -> String {
    let app = Router::new().route("/{z}/{x}/{y}", get(tile));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/{{z}}/{{x}}/{{y}}.png")
}

fn map_at(zoom: f64) -> TileMap {
    let mut map = TileMap::new();
    map.init(MapView::new(LatLng::new(0.0, 0.0), zoom));
    map
}

#[tokio::test]
async fn fetched_tiles_make_base_map_renderable() {
    let template = spawn().await;
    let mut map = map_at(0.0);
    let report = fetch_missing(&reqwest::Client::new(), &template, &mut map, 200, 150).await;
    assert_eq!(report, FetchReport { fetched: 1, failed: 0 });
    assert!(map.missing_tiles(200, 150).is_empty());
    assert!(map.render_base(200, 150).is_ok());
}

#[tokio::test]
async fn second_pass_fetches_nothing() {
    let template = spawn().await;
    let mut map = map_at(0.0);
    let http = reqwest::Client::new();
    fetch_missing(&http, &template, &mut map, 200, 150).await;
    assert_eq!(fetch_missing(&http, &template, &mut map, 200, 150).await, FetchReport::default());
}

#[tokio::test]
async fn undecodable_tiles_stay_missing() {
    let template = spawn().await;
    let mut map = map_at(1.0);
    let report = fetch_missing(&reqwest::Client::new(), &template, &mut map, 200, 150).await;
    assert_eq!(report.fetched, 0);
    assert!(report.failed > 0);
    assert!(matches!(map.render_base(200, 150), Err(MapError::MissingTile { z: 1, .. })));
}

#[tokio::test]
async fn http_errors_stay_missing() {
    let template = spawn().await;
    let mut map = map_at(5.0);
    let report = fetch_missing(&reqwest::Client::new(), &template, &mut map, 200, 150).await;
    assert_eq!(report.fetched, 0);
    assert_eq!(report.failed, map.missing_tiles(200, 150).len());
}

#[test]
fn uninitialized_map_needs_no_tiles() {
    assert!(TileMap::new().missing_tiles(200, 150).is_empty());
}
