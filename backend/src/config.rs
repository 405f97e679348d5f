//! Runtime configuration read from the process environment.
//!
//! Every setting has a default so the server starts with no environment at all:
//!
//! | Variable                   | Default     |
//! |----------------------------|-------------|
//! | `MASSPAY_HOST`             | `127.0.0.1` |
//! | `MASSPAY_PORT`             | `9000`      |
//! | `MASSPAY_TEMP_DIR`         | `temp`      |
//! | `MASSPAY_LOG_DIR`          | `log`       |
//! | `MASSPAY_MAX_UPLOAD_BYTES` | `10485760`  |
//!
//! An empty `MASSPAY_LOG_DIR` sends the log to stderr instead of a daily file.

use crate::services::masspay::parse::RecordLayout;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 9000;
const DEFAULT_TEMP_DIR: &str = "temp";
const DEFAULT_LOG_DIR: &str = "log";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Settings shared by every request through `web::Data`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root under which each request gets its own `<timestamp>` working directory.
    pub temp_root: PathBuf,
    pub log_dir: Option<PathBuf>,
    /// Upper bound for the uploaded file; larger uploads are rejected while streaming.
    pub max_upload_bytes: usize,
    pub layout: RecordLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            temp_root: PathBuf::from(DEFAULT_TEMP_DIR),
            log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            layout: RecordLayout::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("MASSPAY_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("MASSPAY_PORT") {
            config.port = parse_number("MASSPAY_PORT", port)?;
        }
        if let Some(dir) = lookup("MASSPAY_TEMP_DIR") {
            config.temp_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("MASSPAY_LOG_DIR") {
            config.log_dir = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Some(limit) = lookup("MASSPAY_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_number("MASSPAY_MAX_UPLOAD_BYTES", limit)?;
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.temp_root, PathBuf::from("temp"));
        assert_eq!(config.log_dir, Some(PathBuf::from("log")));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MASSPAY_HOST", "0.0.0.0"),
            ("MASSPAY_PORT", "8081"),
            ("MASSPAY_TEMP_DIR", "/var/tmp/masspay"),
            ("MASSPAY_LOG_DIR", ""),
            ("MASSPAY_MAX_UPLOAD_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8081);
        assert_eq!(config.temp_root, PathBuf::from("/var/tmp/masspay"));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("MASSPAY_PORT", "ninety")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "MASSPAY_PORT must be a number, got \"ninety\""
        );
    }
}
