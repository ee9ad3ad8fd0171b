//! Server configuration module
//!
//! Handles loading configuration from environment variables with
//! sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8099)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Directory holding persisted annotations and the id counter
    /// (default: db)
    pub data_dir: PathBuf,
    /// Request body limit in MB (default: 50)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Initial state of the GPS proximity filter (default: enabled)
    pub gps_filter_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8099,
            host: [127, 0, 0, 1],
            data_dir: PathBuf::from("db"),
            body_limit_mb: 50,
            timeout_secs: 30,
            gps_filter_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let body_limit_mb = std::env::var("BODY_LIMIT_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.body_limit_mb);

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let gps_filter_enabled = std::env::var("GPS_FILTER_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(defaults.gps_filter_enabled);

        Self {
            port,
            host,
            data_dir,
            body_limit_mb,
            timeout_secs,
            gps_filter_enabled,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Path of the ingestion id counter file.
    pub fn counter_path(&self) -> PathBuf {
        self.data_dir.join("counter.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8099);
        assert_eq!(config.data_dir, PathBuf::from("db"));
        assert!(config.gps_filter_enabled);
        assert_eq!(config.socket_addr().port(), 8099);
    }

    #[test]
    fn test_counter_path_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/var/aperture"),
            ..Config::default()
        };
        assert_eq!(config.counter_path(), PathBuf::from("/var/aperture/counter.json"));
    }
}
