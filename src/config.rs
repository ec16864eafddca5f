use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use anyhow::{Context, Result};

/// Where loans, users and sessions are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL for loans and users, Redis for sessions.
    Postgres,
    /// Process-local maps. Nothing survives a restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Which storage implementations back the application.
    pub storage: StorageBackend,
    /// The URL of the PostgreSQL database. Only required for the Postgres backend.
    pub database_url: Option<String>,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Origins allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let storage: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = match storage {
            StorageBackend::Postgres => {
                Some(env::var("DATABASE_URL").context("DATABASE_URL must be set")?)
            }
            StorageBackend::Memory => env::var("DATABASE_URL").ok(),
        };

        let session_duration_days: i64 = env::var("SESSION_DURATION_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;

        if session_duration_days <= 0 {
            anyhow::bail!("SESSION_DURATION_DAYS must be at least 1");
        }

        Ok(Self {
            storage,
            database_url,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            session_duration_days,
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| {
                    "http://localhost:3000,http://127.0.0.1:3000,http://[::1]:3000".to_string()
                }),
            ),
            secure_cookies: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string())
                == "production",
        })
    }

    /// A configuration for the in-memory backend with development defaults.
    pub fn in_memory() -> Self {
        Self {
            storage: StorageBackend::Memory,
            database_url: None,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            session_duration_days: 7,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            allowed_origins: parse_origins("http://localhost:3000"),
            secure_cookies: false,
        }
    }

    /// Session lifetime in seconds, as used for store TTLs and cookie max-age.
    pub fn session_ttl_secs(&self) -> u64 {
        (self.session_duration_days * 86400) as u64
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("Postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!(" memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn origins_skip_blank_entries() {
        assert_eq!(
            parse_origins("http://a.test, ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn session_ttl_is_days_in_seconds() {
        let config = Config::in_memory();
        assert_eq!(config.session_ttl_secs(), 7 * 86400);
    }
}
