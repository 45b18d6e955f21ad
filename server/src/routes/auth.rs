//! Auth routes: session cookie extraction, current user, logout, dev login.

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use crate::routes::error::ApiError;
use crate::services::session::{SESSION_TTL, SessionUser};
use crate::state::AppState;

pub const COOKIE_NAME: &str = "session_token";

fn session_cookie(value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: SessionUser,
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        let app_state = AppState::from_ref(state);
        let user = app_state
            .sessions
            .validate_session(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/auth/me`: return current user.
pub async fn me(auth: AuthUser) -> Json<SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout`: delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse, ApiError> {
    state.sessions.delete_session(&auth.token).await?;
    tracing::info!(user_id = %auth.user.id, "logged out");

    let jar = CookieJar::new().add(session_cookie(String::new(), state.http.cookie_secure, Duration::ZERO));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[derive(Deserialize)]
pub struct DevLoginBody {
    pub email: String,
    pub name: Option<String>,
}

/// `POST /api/dev/login`: create or fetch a user by email and start a
/// session without any sign-in flow.
///
/// Enabled only when `DEV_AUTH` is set; otherwise the route does not exist.
pub async fn dev_login(
    State(state): State<AppState>,
    body: Result<Json<DevLoginBody>, axum::extract::rejection::JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.http.dev_auth {
        return Err(ApiError::NotFound);
    }
    let Json(body) = body?;
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("a valid email is required".into()));
    }
    let name = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let user = state.sessions.upsert_user(email, name).await?;
    let token = state.sessions.create_session(user.id).await?;
    tracing::info!(user_id = %user.id, "dev login");

    let jar = CookieJar::new().add(session_cookie(token.clone(), state.http.cookie_secure, SESSION_TTL));
    Ok((jar, Json(serde_json::json!({ "user": user, "token": token }))))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
