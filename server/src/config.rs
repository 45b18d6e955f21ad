//! Server configuration parsed from environment variables.
//!
//! Required:
//! - `DATABASE_URL`, unless `MEMORY_STORE` is on
//!
//! Optional:
//! - `MEMORY_STORE`: keep maps and sessions in process memory; default off
//! - `PORT`: default 3000
//! - `DB_MAX_CONNECTIONS`: default 5
//! - `MAX_BODY_BYTES`: default 16 MiB (map images travel as data URLs)
//! - `DEV_AUTH`: enables `POST /api/dev/login`; default off
//! - `COOKIE_SECURE`: marks the session cookie `Secure`; default off

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} has invalid value `{value}`")]
    Invalid { key: &'static str, value: String },
}

/// Settings that shape request handling, independent of the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub max_body_bytes: usize,
    pub dev_auth: bool,
    pub cookie_secure: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { max_body_bytes: DEFAULT_MAX_BODY_BYTES, dev_auth: false, cookie_secure: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub port: u16,
    pub db_max_connections: u32,
    pub http: HttpConfig,
}

impl ServerConfig {
    /// Build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let memory_store = bool_or(&lookup, "MEMORY_STORE", false)?;
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if database_url.is_none() && !memory_store {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let database_url = if memory_store { None } else { database_url };
        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            http: HttpConfig {
                max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
                dev_auth: bool_or(&lookup, "DEV_AUTH", false)?,
                cookie_secure: bool_or(&lookup, "COOKIE_SECURE", false)?,
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn bool_or(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key, value: raw }),
    }
}

/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitively.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
