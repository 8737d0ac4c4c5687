//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::time::Duration;

use crate::rotator::{DummyConfig, ProxyConfig};

/// Which rotator the hub serves.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Simulated rotator.
    Dummy(DummyConfig),
    /// Rotator served by another hub.
    Proxy(ProxyConfig),
}

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Whether the raw TCP listener is started.
    pub tcp_enabled: bool,

    /// Host the TCP listener binds to.
    pub tcp_host: String,

    /// Port of the TCP listener.
    pub tcp_port: u16,

    /// Whether the HTTP/WebSocket listener is started.
    pub http_enabled: bool,

    /// Host the HTTP/WebSocket listener binds to.
    pub http_host: String,

    /// Port of the HTTP/WebSocket listener.
    pub http_port: u16,

    /// Capacity of the rotator event bus.
    pub event_bus_capacity: usize,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,

    /// Rotator backend.
    pub backend: Backend,
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `ROTATOR_BACKEND` names an unknown backend, or
    /// if the proxy backend is selected without `PROXY_HOST`.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let backend = match env_string("ROTATOR_BACKEND", "dummy").as_str() {
            "dummy" => Backend::Dummy(dummy_from_env()),
            "proxy" => {
                let host = std::env::var("PROXY_HOST")
                    .map_err(|_| "PROXY_HOST must be set for the proxy backend")?;
                let mut proxy = ProxyConfig::new(host, parse_env("PROXY_PORT", 7070));
                proxy.timeout = Duration::from_secs(parse_env("PROXY_TIMEOUT_SECS", 3));
                Backend::Proxy(proxy)
            }
            other => return Err(format!("unknown rotator backend: {other}").into()),
        };

        Ok(Self {
            tcp_enabled: parse_env_bool("TCP_ENABLED", true),
            tcp_host: env_string("TCP_HOST", "0.0.0.0"),
            tcp_port: parse_env("TCP_PORT", 7373),
            http_enabled: parse_env_bool("HTTP_ENABLED", true),
            http_host: env_string("HTTP_HOST", "0.0.0.0"),
            http_port: parse_env("HTTP_PORT", 7070),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", 1024),
            log_json: env_string("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            backend,
        })
    }
}

fn dummy_from_env() -> DummyConfig {
    let defaults = DummyConfig::default();
    DummyConfig {
        name: env_string("ROTATOR_NAME", &defaults.name),
        has_azimuth: parse_env_bool("DUMMY_HAS_AZIMUTH", defaults.has_azimuth),
        has_elevation: parse_env_bool("DUMMY_HAS_ELEVATION", defaults.has_elevation),
        azimuth_min: parse_env("DUMMY_AZIMUTH_MIN", defaults.azimuth_min),
        azimuth_max: parse_env("DUMMY_AZIMUTH_MAX", defaults.azimuth_max),
        azimuth_stop: parse_env("DUMMY_AZIMUTH_STOP", defaults.azimuth_stop),
        elevation_min: parse_env("DUMMY_ELEVATION_MIN", defaults.elevation_min),
        elevation_max: parse_env("DUMMY_ELEVATION_MAX", defaults.elevation_max),
        elevation_stop: parse_env("DUMMY_ELEVATION_STOP", defaults.elevation_stop),
        initial_azimuth: parse_env("DUMMY_AZIMUTH", defaults.initial_azimuth),
        initial_elevation: parse_env("DUMMY_ELEVATION", defaults.initial_elevation),
        step: parse_env("DUMMY_STEP", defaults.step),
        tick: Duration::from_millis(parse_env("DUMMY_TICK_MS", 100)),
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    parse_bool(std::env::var(key).ok().as_deref(), default)
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool(Some("TRUE"), false));
        assert!(parse_bool(Some("1"), false));
        assert!(!parse_bool(Some("False"), true));
        assert!(!parse_bool(Some("0"), true));
    }

    #[test]
    fn parse_bool_falls_back_to_default() {
        assert!(parse_bool(None, true));
        assert!(!parse_bool(Some("yes please"), false));
    }

    #[test]
    fn parse_env_uses_default_for_missing_key() {
        let port: u16 = parse_env("ROTATOR_HUB_TEST_SURELY_UNSET_PORT", 7373);
        assert_eq!(port, 7373);
    }
}
