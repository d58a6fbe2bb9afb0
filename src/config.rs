//! Guestbook configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_SIGNATURES_TABLE: &str = "signatures";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_INIT_DEADLINE_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing config: env var {var} not set")]
    MissingVar { var: &'static str },
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Supabase,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
    pub init_deadline_secs: u64,
}

impl RemoteTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub fn init_deadline(&self) -> Duration {
        Duration::from_secs(self.init_deadline_secs)
    }
}

impl Default for RemoteTimeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            init_deadline_secs: DEFAULT_INIT_DEADLINE_SECS,
        }
    }
}

/// Connection details for the hosted signatures table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub timeouts: RemoteTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookConfig {
    pub backend: BackendKind,
    /// Present only for [`BackendKind::Supabase`].
    pub remote: Option<RemoteConfig>,
    pub port: u16,
}

impl GuestbookConfig {
    /// Build typed config from process environment variables.
    ///
    /// Required for the `supabase` backend:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `GUESTBOOK_BACKEND`: `supabase` (default) or `memory`
    /// - `SIGNATURES_TABLE`: default `signatures`
    /// - `SUPABASE_REQUEST_TIMEOUT_SECS`: default 15
    /// - `SUPABASE_CONNECT_TIMEOUT_SECS`: default 5
    /// - `GUESTBOOK_INIT_DEADLINE_SECS`: default 10
    /// - `PORT`: default 3000
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown backend, a missing required
    /// variable, or an unparseable `PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GuestbookConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = parse_backend(lookup("GUESTBOOK_BACKEND").as_deref())?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Parse(format!("invalid PORT: {raw}")))?,
            None => DEFAULT_PORT,
        };

        let remote = match backend {
            BackendKind::Memory => None,
            BackendKind::Supabase => {
                let url = lookup("SUPABASE_URL")
                    .ok_or(ConfigError::MissingVar { var: "SUPABASE_URL" })?
                    .trim_end_matches('/')
                    .to_string();
                let anon_key =
                    lookup("SUPABASE_ANON_KEY").ok_or(ConfigError::MissingVar { var: "SUPABASE_ANON_KEY" })?;
                let table = lookup("SIGNATURES_TABLE").unwrap_or_else(|| DEFAULT_SIGNATURES_TABLE.to_string());
                let timeouts = RemoteTimeouts {
                    request_secs: parse_secs(&lookup, "SUPABASE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                    connect_secs: parse_secs(&lookup, "SUPABASE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
                    init_deadline_secs: parse_secs(&lookup, "GUESTBOOK_INIT_DEADLINE_SECS", DEFAULT_INIT_DEADLINE_SECS),
                };
                Some(RemoteConfig { url, anon_key, table, timeouts })
            }
        };

        Ok(Self { backend, remote, port })
    }
}

/// Positive whole seconds; zero or garbage falls back to `default`.
fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(default)
}

fn parse_backend(raw: Option<&str>) -> Result<BackendKind, ConfigError> {
    match raw.unwrap_or("supabase") {
        "supabase" => Ok(BackendKind::Supabase),
        "memory" => Ok(BackendKind::Memory),
        other => Err(ConfigError::Parse(format!("unknown GUESTBOOK_BACKEND: {other}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
