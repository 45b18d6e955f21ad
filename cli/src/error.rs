use std::path::PathBuf;

use canvas::error::{ExportError, MapError, RenderError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("missing session token; pass --session-token or set MAPSKETCH_SESSION_TOKEN")]
    MissingSessionToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("script step {step}: {message}")]
    Script { step: usize, message: String },
    #[error("no map location; give the script a center or a city")]
    NoLocation,
    /// The export was written, but some steps raised engine notices.
    #[error("{0} step(s) raised notices; the export may be missing annotations")]
    Notices(usize),
    #[error("no geocoding result for `{0}`")]
    PlaceNotFound(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
