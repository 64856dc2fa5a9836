//! # Node Configuration
//!
//! Simulation parameters, read from the environment.

use eu_02_shout::ShoutConfig;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An environment variable did not parse.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// A parsed value is outside its allowed range.
    #[error("{0}")]
    OutOfRange(String),
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Number of simulated users.
    pub peers: usize,
    /// Latitude the peers wander around.
    pub center_lat: f64,
    /// Longitude the peers wander around.
    pub center_lon: f64,
    /// Maximum distance in degrees a peer strays from the centre.
    pub wander_deg: f64,
    /// Mean time between shouts of one peer (ms).
    pub shout_interval_ms: u64,
    /// Stop after this many seconds; `None` runs until Ctrl+C.
    pub run_secs: Option<u64>,
    /// Per-session settings.
    pub shout: ShoutConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            peers: 4,
            center_lat: 37.50,
            center_lon: 127.03,
            wander_deg: 0.05,
            shout_interval_ms: 4_000,
            run_secs: None,
            shout: ShoutConfig {
                location_poll_ms: Some(3_000),
                ..ShoutConfig::default()
            },
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EUREKA_PEERS`: simulated users (default: 4)
    /// - `EUREKA_LAT` / `EUREKA_LON`: wander centre (default: 37.50, 127.03)
    /// - `EUREKA_WANDER_DEG`: wander radius in degrees (default: 0.05)
    /// - `EUREKA_SHOUT_INTERVAL_MS`: mean shout period (default: 4000)
    /// - `EUREKA_RUN_SECS`: stop after N seconds (default: unset)
    /// - `EUREKA_DEBOUNCE_MS`: neighbor debounce window (default: 2000)
    /// - `EUREKA_LOCATION_POLL_MS`: location poll period, 0 disables (default: 3000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse(&lookup, "EUREKA_PEERS")? {
            config.peers = v;
        }
        if let Some(v) = parse(&lookup, "EUREKA_LAT")? {
            config.center_lat = v;
        }
        if let Some(v) = parse(&lookup, "EUREKA_LON")? {
            config.center_lon = v;
        }
        if let Some(v) = parse(&lookup, "EUREKA_WANDER_DEG")? {
            config.wander_deg = v;
        }
        if let Some(v) = parse(&lookup, "EUREKA_SHOUT_INTERVAL_MS")? {
            config.shout_interval_ms = v;
        }
        if let Some(v) = parse(&lookup, "EUREKA_RUN_SECS")? {
            config.run_secs = Some(v);
        }
        if let Some(v) = parse(&lookup, "EUREKA_DEBOUNCE_MS")? {
            config.shout.debounce_window_ms = v;
        }
        if let Some(v) = parse(&lookup, "EUREKA_LOCATION_POLL_MS")? {
            config.shout.location_poll_ms = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peers == 0 {
            return Err(ConfigError::OutOfRange("EUREKA_PEERS must be at least 1".into()));
        }
        if !(-90.0..=90.0).contains(&self.center_lat) || !(-180.0..=180.0).contains(&self.center_lon)
        {
            return Err(ConfigError::OutOfRange(format!(
                "centre ({}, {}) is not a valid coordinate",
                self.center_lat, self.center_lon
            )));
        }
        if !(0.0..=1.0).contains(&self.wander_deg) {
            return Err(ConfigError::OutOfRange(
                "EUREKA_WANDER_DEG must be within [0, 1]".into(),
            ));
        }
        if self.shout_interval_ms == 0 {
            return Err(ConfigError::OutOfRange(
                "EUREKA_SHOUT_INTERVAL_MS must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Mean shout period.
    pub fn shout_interval(&self) -> Duration {
        Duration::from_millis(self.shout_interval_ms)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}
