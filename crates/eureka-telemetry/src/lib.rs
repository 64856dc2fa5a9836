//! # Eureka Telemetry
//!
//! Structured logging and Prometheus metrics for Eureka clients.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use eureka_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EUREKA_SERVICE_NAME` | `eureka` | Service name in logs |
//! | `EUREKA_LOG_LEVEL` | `info` | Log level filter |
//! | `EUREKA_JSON_LOGS` | `false` | One JSON object per log line |
//! | `EUREKA_DUMP_METRICS` | `false` | Print metrics text on shutdown |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, LOCATION_UPDATES, MESSAGES_PRUNED, NEIGHBOR_FETCHES,
    NEIGHBOR_RESULTS_DISCARDED, RESUBSCRIPTIONS, SHOUTS_EXPIRED, SHOUTS_PUBLISHED,
    SNAPSHOTS_APPLIED, SNAPSHOTS_DISCARDED, STALE_EXPIRIES_SKIPPED, STORE_ERRORS,
    SUBSCRIPTIONS_DEGRADED, VISIBLE_MESSAGES, VISIBLE_NEIGHBORS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first so counters bumped during startup are registered
    let metrics = register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard {
        _metrics: metrics,
        dump_metrics: config.dump_metrics,
    })
}

/// Guard that keeps telemetry active. Dumps metrics on drop when configured.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
    dump_metrics: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
        if self.dump_metrics {
            match encode_metrics() {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error encoding metrics: {}", e),
            }
        }
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for setting a gauge.
#[macro_export]
macro_rules! metric_set {
    ($metric:expr, $value:expr) => {
        $metric.set($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_service() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "eureka");
    }

    #[test]
    fn test_metric_macros() {
        metric_inc!(RESUBSCRIPTIONS);
        metric_inc!(STORE_ERRORS, &["write"]);
        metric_set!(VISIBLE_NEIGHBORS, 2.0);
        assert!(RESUBSCRIPTIONS.get() >= 1.0);
        assert!(STORE_ERRORS.with_label_values(&["write"]).get() >= 1.0);
        assert_eq!(VISIBLE_NEIGHBORS.get(), 2.0);
    }
}
