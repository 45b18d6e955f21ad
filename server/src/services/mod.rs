//! Storage-facing services behind the HTTP routes.
//!
//! Each service is a trait with a Postgres implementation and an in-memory
//! one; routes only see the trait objects held in [`crate::state::AppState`].

pub mod maps;
pub mod session;
