use axum::Router;
use axum::routing::get;
use canvas::error::ExportError;

use super::*;

struct FixedGeocoder(Option<LatLng>);

#[async_trait::async_trait]
impl Geocoder for FixedGeocoder {
    async fn search(&self, _query: &str) -> Result<Option<LatLng>, CliError> {
        Ok(self.0)
    }
}

async fn spawn_tiles() -> String {
    let app = Router::new().route(
        "/{z}/{x}/{y}",
        get(|| async {
            let mut tile = tiny_skia::Pixmap::new(256, 256).unwrap();
            tile.fill(tiny_skia::Color::from_rgba8(242, 239, 233, 255));
            tile.encode_png().unwrap()
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/{{z}}/{{x}}/{{y}}.png")
}

#[test]
fn missing_script_file_is_an_io_error() {
    let err = read_script("/no/such/script.json").unwrap_err();
    assert!(matches!(err, CliError::Io { ref path, .. } if path.ends_with("script.json")));
}

#[tokio::test]
async fn explicit_center_skips_geocoding() {
    let script = Script::parse(r#"{ "city": "Paris", "center": [1.0, 2.0], "zoom": 9 }"#).unwrap();
    let view = initial_view(&script, &FixedGeocoder(None)).await.unwrap();
    assert_eq!(view, MapView::new(LatLng::new(1.0, 2.0), 9.0));
}

#[tokio::test]
async fn city_is_geocoded_without_center() {
    let script = Script::parse(r#"{ "city": "Paris" }"#).unwrap();
    let paris = LatLng::new(48.8566, 2.3522);
    let view = initial_view(&script, &FixedGeocoder(Some(paris))).await.unwrap();
    assert_eq!(view.center, paris);
    assert_eq!(view.zoom, 12.0);
}

#[tokio::test]
async fn no_location_is_an_error() {
    let script = Script::parse("{}").unwrap();
    assert!(matches!(initial_view(&script, &FixedGeocoder(None)).await, Err(CliError::NoLocation)));
}

#[tokio::test]
async fn render_writes_named_png() {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("script.json");
    std::fs::write(
        &script_path,
        r#"{
          "city": "Null Island",
          "center": [0, 0],
          "zoom": 0,
          "engine": { "width": 200, "height": 150 },
          "steps": [
            { "op": "tool", "tool": "pen" },
            { "op": "stroke", "points": [[20, 20], [120, 90]] }
          ]
        }"#,
    )
    .unwrap();

    let tile_url = spawn_tiles().await;
    let cli = Cli::parse_from([
        "mapsketch",
        "--tile-url",
        tile_url.as_str(),
        "render",
        script_path.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    let Command::Render(args) = &cli.command else {
        panic!("expected render command");
    };
    let api = ApiClient::new(&cli.base_url, None).unwrap();
    run_render(&cli, &api, args).await.unwrap();

    let png = std::fs::read(dir.path().join("Null-Island-map.png")).unwrap();
    let image = tiny_skia::Pixmap::decode_png(&png).unwrap();
    assert_eq!((image.width(), image.height()), (200, 150));
}

#[tokio::test]
async fn render_without_tiles_fails_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("script.json");
    std::fs::write(&script_path, r#"{ "center": [0, 0], "zoom": 0, "engine": { "width": 64, "height": 64 } }"#).unwrap();

    let cli = Cli::parse_from([
        "mapsketch",
        "--tile-url",
        "http://127.0.0.1:9/{z}/{x}/{y}.png",
        "render",
        script_path.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    let Command::Render(args) = &cli.command else {
        panic!("expected render command");
    };
    let api = ApiClient::new(&cli.base_url, None).unwrap();
    let err = run_render(&cli, &api, args).await.unwrap_err();
    assert!(matches!(err, CliError::Export(ExportError::Rasterize { .. })));
    let written: Vec<_> = std::fs::read_dir(dir.path()).unwrap().flatten().map(|e| e.file_name()).collect();
    assert_eq!(written, vec![std::ffi::OsString::from("script.json")]);
}

#[tokio::test]
async fn render_with_notices_still_writes_but_fails() {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("script.json");
    std::fs::write(
        &script_path,
        r#"{
          "city": "Null Island",
          "center": [0, 0],
          "zoom": 0,
          "engine": { "width": 200, "height": 150, "system_font": false },
          "steps": [
            { "op": "tool", "tool": "text" },
            { "op": "text", "at": [20, 60], "text": "here" }
          ]
        }"#,
    )
    .unwrap();

    let tile_url = spawn_tiles().await;
    let cli = Cli::parse_from([
        "mapsketch",
        "--tile-url",
        tile_url.as_str(),
        "render",
        script_path.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    let Command::Render(args) = &cli.command else {
        panic!("expected render command");
    };
    let api = ApiClient::new(&cli.base_url, None).unwrap();
    let err = run_render(&cli, &api, args).await.unwrap_err();
    assert!(matches!(err, CliError::Notices(1)));
    assert!(dir.path().join("Null-Island-map.png").exists());
}
