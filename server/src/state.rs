//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Storage is reached through trait objects so the same router runs against
//! Postgres in production and in-memory stores in tests.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::HttpConfig;
use crate::services::maps::{MapStore, MemoryMapStore, PgMapStore};
use crate::services::session::{MemorySessionStore, PgSessionStore, SessionStore};

/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub maps: Arc<dyn MapStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub http: HttpConfig,
}

impl AppState {
    #[must_use]
    pub fn new(maps: Arc<dyn MapStore>, sessions: Arc<dyn SessionStore>, http: HttpConfig) -> Self {
        Self { maps, sessions, http }
    }

    /// State backed by Postgres.
    #[must_use]
    pub fn postgres(pool: PgPool, http: HttpConfig) -> Self {
        Self::new(Arc::new(PgMapStore::new(pool.clone())), Arc::new(PgSessionStore::new(pool)), http)
    }

    /// State backed by process memory; everything is lost on exit.
    #[must_use]
    pub fn memory(http: HttpConfig) -> Self {
        Self::new(Arc::new(MemoryMapStore::new()), Arc::new(MemorySessionStore::new()), http)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
