//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API: session auth, owner-scoped map CRUD, and
//! a health probe. The dev login route is only mounted when `DEV_AUTH` is on.

pub mod auth;
pub mod error;
pub mod maps;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/maps", get(maps::list_maps).post(maps::create_map))
        .route(
            "/api/maps/{id}",
            get(maps::get_map).put(maps::update_map).delete(maps::delete_map),
        )
        .route("/healthz", get(healthz));

    if state.http.dev_auth {
        tracing::warn!("DEV_AUTH enabled: /api/dev/login issues sessions without sign-in");
        router = router.route("/api/dev/login", post(auth::dev_login));
    }

    router
        .layer(DefaultBodyLimit::max(state.http.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
