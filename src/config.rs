//! Application configuration loaded from environment variables.
//!
//! The patrol start window and movement threshold are tunables rather than
//! fixed rules, so both are read here.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default pre-start window for beginning a patrol.
pub const DEFAULT_START_WINDOW_MINUTES: i64 = 30;
/// Default minimum movement before a new location is broadcast.
pub const DEFAULT_CHANGE_THRESHOLD_METERS: f64 = 5.0;

/// Server configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Optional GeoJSON file with patrol area boundaries to seed on startup
    pub patrol_areas_path: Option<String>,
    /// How long before a schedule's start time a patrol may begin
    pub start_window: chrono::Duration,
    /// Minimum movement (meters) for a location update to count as a change
    pub change_threshold_meters: f64,
    /// Shared secret the dispatch service presents; dispatch routes are
    /// closed when unset
    pub dispatch_api_key: Option<String>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            patrol_areas_path: None,
            start_window: chrono::Duration::minutes(DEFAULT_START_WINDOW_MINUTES),
            change_threshold_meters: DEFAULT_CHANGE_THRESHOLD_METERS,
            dispatch_api_key: Some("test_dispatch_key".to_string()),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let window_minutes: i64 = parse_var(
            "PATROL_START_WINDOW_MINUTES",
            DEFAULT_START_WINDOW_MINUTES,
        )?;
        if window_minutes < 0 {
            return Err(ConfigError::Invalid("PATROL_START_WINDOW_MINUTES"));
        }

        let change_threshold_meters: f64 = parse_var(
            "LOCATION_CHANGE_THRESHOLD_METERS",
            DEFAULT_CHANGE_THRESHOLD_METERS,
        )?;
        if !change_threshold_meters.is_finite() || change_threshold_meters < 0.0 {
            return Err(ConfigError::Invalid("LOCATION_CHANGE_THRESHOLD_METERS"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            patrol_areas_path: env::var("PATROL_AREAS_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            start_window: chrono::Duration::minutes(window_minutes),
            change_threshold_meters,
            dispatch_api_key: env::var("DISPATCH_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
        })
    }
}

/// Device-side configuration for a tanod session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API server (e.g., "https://patrol.example.org")
    pub api_url: String,
    /// Fixed delay before reconnecting the realtime channel
    pub reconnect_backoff: Duration,
    /// Minimum spacing between applied map updates for one user
    pub feed_debounce: Duration,
    /// Minimum movement (meters) before a new sample is emitted
    pub change_threshold_meters: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            reconnect_backoff: Duration::from_secs(3),
            feed_debounce: Duration::from_secs(1),
            change_threshold_meters: DEFAULT_CHANGE_THRESHOLD_METERS,
        }
    }
}

impl ClientConfig {
    /// Load client settings from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            api_url: env::var("PATROL_API_URL").unwrap_or(defaults.api_url),
            reconnect_backoff: Duration::from_millis(parse_var(
                "REALTIME_RECONNECT_MS",
                defaults.reconnect_backoff.as_millis() as u64,
            )?),
            feed_debounce: Duration::from_millis(parse_var(
                "FEED_DEBOUNCE_MS",
                defaults.feed_debounce.as_millis() as u64,
            )?),
            change_threshold_meters: parse_var(
                "LOCATION_CHANGE_THRESHOLD_METERS",
                defaults.change_threshold_meters,
            )?,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("PATROL_START_WINDOW_MINUTES", "45");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.start_window, chrono::Duration::minutes(45));
        assert_eq!(config.change_threshold_meters, 5.0);

        env::remove_var("PATROL_START_WINDOW_MINUTES");
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.reconnect_backoff, Duration::from_secs(3));
        assert_eq!(config.feed_debounce, Duration::from_secs(1));
    }
}
