mod api;
mod error;
mod geo;
mod script;
mod tiles;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::io::{self, Read};
use std::path::PathBuf;

use canvas::export::{self, Delivery, ExportHost, FileDownload, ShareTarget};
use canvas::map::MapProvider;
use canvas::view::{LatLng, MapView};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::api::{ApiClient, MapUpload};
use crate::error::CliError;
use crate::geo::{Geocoder, Nominatim};
use crate::script::{Script, Session};

#[derive(Parser, Debug)]
#[command(name = "mapsketch", about = "Annotate city maps and manage saved maps")]
struct Cli {
    #[arg(long, env = "MAPSKETCH_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "MAPSKETCH_SESSION_TOKEN")]
    session_token: Option<String>,

    #[arg(long, env = "MAPSKETCH_TILE_URL", default_value = tiles::DEFAULT_TILE_URL)]
    tile_url: String,

    #[arg(long, env = "MAPSKETCH_GEOCODE_URL", default_value = geo::DEFAULT_GEOCODE_URL)]
    geocode_url: String,

    /// Font for text annotations; overrides the script's `engine.font_path`.
    #[arg(long, env = "MAPSKETCH_FONT")]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the persistence service is up.
    Ping,
    /// Look up a place and print its coordinates.
    Geocode { query: String },
    /// Replay an annotation script and export the map as PNG.
    Render(RenderArgs),
    Maps(MapsCommand),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Script file, or `-` for stdin.
    script: String,

    /// Directory the PNG is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Upload the export to the account. Falls back to writing a file if
    /// the upload fails.
    #[arg(long)]
    upload: bool,

    /// Title for uploaded maps; defaults to the city.
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct MapsCommand {
    #[command(subcommand)]
    command: MapsSubcommand,
}

#[derive(Subcommand, Debug)]
enum MapsSubcommand {
    List,
    Get { map_id: Uuid },
    Delete { map_id: Uuid },
}

/// Logs the progress overlay a GUI host would show.
struct LogProgress;

impl ExportHost for LogProgress {
    fn show_progress(&mut self) {
        info!("processing export");
    }

    fn hide_progress(&mut self) {
        info!("export finished");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.base_url, cli.session_token.clone())?;

    match &cli.command {
        Command::Ping => {
            api.health().await?;
            println!("ok");
            Ok(())
        }
        Command::Geocode { query } => {
            let found = geo::locate(&Nominatim::new(&cli.geocode_url), query).await?;
            println!("{} {}", found.lat, found.lng);
            Ok(())
        }
        Command::Render(args) => run_render(&cli, &api, args).await,
        Command::Maps(maps) => run_maps(&api, maps).await,
    }
}

async fn run_maps(api: &ApiClient, maps: &MapsCommand) -> Result<(), CliError> {
    let json = match &maps.command {
        MapsSubcommand::List => api.list_maps().await?,
        MapsSubcommand::Get { map_id } => api.get_map(*map_id).await?,
        MapsSubcommand::Delete { map_id } => api.delete_map(*map_id).await?,
    };
    print_json(&json)
}

fn read_script(source: &str) -> Result<Script, CliError> {
    let text = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Io { path: PathBuf::from("<stdin>"), source })?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| CliError::Io { path: PathBuf::from(source), source: e })?
    };
    Script::parse(&text)
}

/// Where the map starts: the script's center, or its city geocoded.
async fn initial_view(script: &Script, geocoder: &dyn Geocoder) -> Result<MapView, CliError> {
    let center = match (script.center, script.city.as_deref()) {
        (Some([lat, lng]), _) => LatLng::new(lat, lng),
        (None, Some(city)) => geo::locate(geocoder, city).await?,
        (None, None) => return Err(CliError::NoLocation),
    };
    Ok(MapView::new(center, script.zoom))
}

async fn run_render(cli: &Cli, api: &ApiClient, args: &RenderArgs) -> Result<(), CliError> {
    let mut script = read_script(&args.script)?;
    if cli.font.is_some() {
        script.engine.font_path.clone_from(&cli.font);
    }

    let view = initial_view(&script, &Nominatim::new(&cli.geocode_url)).await?;
    let mut session = Session::start(&script.engine, view)?;
    session.run(&script.steps)?;
    info!(steps = script.steps.len(), notices = session.notices().len(), "script replayed");

    let http = reqwest::Client::new();
    let report = tiles::fetch_missing(&http, &cli.tile_url, &mut session.map, script.engine.width, script.engine.height).await;
    info!(fetched = report.fetched, failed = report.failed, "tiles fetched");

    let _guard = session.engine.begin_save()?;
    let file = export::flatten(&session.scene(), script.city.as_deref(), &mut LogProgress)?;

    let final_view = session.map.view().unwrap_or(view);
    let city = script.city.clone().unwrap_or_default();
    let upload = MapUpload {
        api,
        title: args.title.clone().unwrap_or_else(|| city.clone()),
        description: args.description.clone(),
        city,
        center: [final_view.center.lat, final_view.center.lng],
        zoom: final_view.zoom,
    };
    let share: Option<&dyn ShareTarget> = if args.upload { Some(&upload) } else { None };

    match export::deliver(&file, share, &FileDownload::new(&args.out_dir)).await? {
        Delivery::Shared => println!("uploaded {}", file.name),
        Delivery::Downloaded(path) => println!("{}", path.display()),
    }
    match session.notices().len() {
        0 => Ok(()),
        n => Err(CliError::Notices(n)),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
