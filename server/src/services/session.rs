//! Sessions and the users they belong to.
//!
//! ARCHITECTURE
//! ============
//! HTTP auth uses long-lived opaque session tokens carried in the
//! `session_token` cookie. Sign-in flows are out of scope here; the only
//! way to mint a session is the dev login, which upserts a user by email.
//! Storage sits behind [`SessionStore`] so routes can run against Postgres in
//! production and an in-memory store in tests.

use std::collections::HashMap;

use rand::Rng;
use sqlx::{PgPool, Row};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a session stays valid after creation.
pub const SESSION_TTL: Duration = Duration::days(30);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// User resolved from a valid session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Create or refresh the user with this email. The display name is only
    /// updated when `name` is given.
    async fn upsert_user(&self, email: &str, name: Option<&str>) -> Result<SessionUser, SessionError>;

    /// Create a session for the given user, returning the token.
    async fn create_session(&self, user_id: Uuid) -> Result<String, SessionError>;

    /// Resolve a token to its user. Unknown and expired tokens yield `None`.
    async fn validate_session(&self, token: &str) -> Result<Option<SessionUser>, SessionError>;

    async fn delete_session(&self, token: &str) -> Result<(), SessionError>;
}

/// Default display name: the local part of the email address.
fn default_name(email: &str) -> &str {
    email.split('@').next().filter(|s| !s.is_empty()).unwrap_or(email)
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessionStore {
    async fn upsert_user(&self, email: &str, name: Option<&str>) -> Result<SessionUser, SessionError> {
        let row = sqlx::query(
            "INSERT INTO users (id, name, email) VALUES ($1, $2, $3)
             ON CONFLICT (email) DO UPDATE
                 SET name = CASE WHEN $4 THEN EXCLUDED.name ELSE users.name END
             RETURNING id, name, email, avatar_url",
        )
        .bind(Uuid::new_v4())
        .bind(name.unwrap_or_else(|| default_name(email)))
        .bind(email)
        .bind(name.is_some())
        .fetch_one(&self.pool)
        .await?;

        Ok(SessionUser {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            avatar_url: row.get("avatar_url"),
        })
    }

    async fn create_session(&self, user_id: Uuid) -> Result<String, SessionError> {
        let token = generate_token();
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&token)
            .bind(user_id)
            .bind(OffsetDateTime::now_utc() + SESSION_TTL)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn validate_session(&self, token: &str) -> Result<Option<SessionUser>, SessionError> {
        let row = sqlx::query(
            "SELECT u.id, u.name, u.email, u.avatar_url
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SessionUser {
            id: r.get("id"),
            name: r.get("name"),
            email: r.get("email"),
            avatar_url: r.get("avatar_url"),
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

struct SessionEntry {
    user_id: Uuid,
    expires_at: OffsetDateTime,
}

#[derive(Default)]
struct MemorySessions {
    users: HashMap<Uuid, SessionUser>,
    sessions: HashMap<String, SessionEntry>,
}

/// Process-local session store for tests and database-less development.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<MemorySessions>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session with an explicit expiry.
    #[cfg(test)]
    pub(crate) async fn insert_session_until(&self, user_id: Uuid, expires_at: OffsetDateTime) -> String {
        let token = generate_token();
        self.inner.write().await.sessions.insert(token.clone(), SessionEntry { user_id, expires_at });
        token
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn upsert_user(&self, email: &str, name: Option<&str>) -> Result<SessionUser, SessionError> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.values_mut().find(|u| u.email == email) {
            if let Some(name) = name {
                name.clone_into(&mut user.name);
            }
            return Ok(user.clone());
        }
        let user = SessionUser {
            id: Uuid::new_v4(),
            name: name.unwrap_or_else(|| default_name(email)).to_owned(),
            email: email.to_owned(),
            avatar_url: None,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_session(&self, user_id: Uuid) -> Result<String, SessionError> {
        let token = generate_token();
        let entry = SessionEntry { user_id, expires_at: OffsetDateTime::now_utc() + SESSION_TTL };
        self.inner.write().await.sessions.insert(token.clone(), entry);
        Ok(token)
    }

    async fn validate_session(&self, token: &str) -> Result<Option<SessionUser>, SessionError> {
        let inner = self.inner.read().await;
        let Some(entry) = inner.sessions.get(token) else {
            return Ok(None);
        };
        if entry.expires_at <= OffsetDateTime::now_utc() {
            return Ok(None);
        }
        Ok(inner.users.get(&entry.user_id).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), SessionError> {
        self.inner.write().await.sessions.remove(token);
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
