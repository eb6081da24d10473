//! Runtime configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! JSON file, and `INBOX451_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "INBOX451_";

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL, e.g. `sqlite:inbox451.db`.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Seconds to wait for a free connection before failing.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:inbox451.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Upper bound on processing one envelope, in seconds.
    pub timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl IngestConfig {
    /// Timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Ingestion settings.
    pub ingest: IngestConfig,
}

impl Config {
    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inbox451").join("config.json"))
    }

    /// Load configuration from `path` (if it exists) and the process environment.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if an environment override has an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_json(&std::fs::read_to_string(path)?)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse configuration from JSON text; absent fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON for this structure.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply `INBOX451_*` overrides obtained through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric override does not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(value) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_number("DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs =
                parse_number("DATABASE_ACQUIRE_TIMEOUT_SECS", &value)?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(value) = var("INGEST_TIMEOUT_SECS") {
            self.ingest.timeout_secs = parse_number("INGEST_TIMEOUT_SECS", &value)?;
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{ENV_PREFIX}{name} is not a number: {value}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"database": {"url": "sqlite::memory:"}}"#).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.ingest.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("INBOX451_DATABASE_URL", "sqlite:/var/lib/inbox451.db"),
            ("INBOX451_DATABASE_MAX_CONNECTIONS", "12"),
            ("INBOX451_LOG_LEVEL", "debug"),
            ("INBOX451_INGEST_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.database.url, "sqlite:/var/lib/inbox451.db");
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.ingest.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_env_number() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "INBOX451_INGEST_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/inbox451.json"))).unwrap();
        assert_eq!(config.logging.level, Config::default().logging.level);
    }
}
