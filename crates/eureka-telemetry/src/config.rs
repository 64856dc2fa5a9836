//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to print the Prometheus text dump on shutdown
    pub dump_metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "eureka".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            dump_metrics: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EUREKA_SERVICE_NAME`: Service name (default: eureka)
    /// - `EUREKA_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `EUREKA_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `EUREKA_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `EUREKA_DUMP_METRICS`: Print metrics on shutdown (default: false)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("EUREKA_SERVICE_NAME").unwrap_or_else(|_| "eureka".to_string()),

            log_level: env::var("EUREKA_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("EUREKA_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("EUREKA_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            dump_metrics: env::var("EUREKA_DUMP_METRICS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(false),
        }
    }

    /// Configuration for a named client binary.
    pub fn for_service(name: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("eureka-{}", name);
        config
    }
}

/// `true`/`1` and `false`/`0`, case-insensitive; anything else is `default`.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => default,
    }
}
