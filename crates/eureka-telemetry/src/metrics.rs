//! Prometheus metrics for Eureka clients.
//!
//! All metrics follow the naming convention: `eureka_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., shouts_published_total)
//! - **Gauge**: Value that can go up or down (e.g., visible_messages)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PUBLISHER METRICS
    // =========================================================================

    /// Shouts written to the store
    pub static ref SHOUTS_PUBLISHED: Counter = Counter::new(
        "eureka_publisher_shouts_published_total",
        "Total number of shouts written to the presence store"
    ).expect("metric creation failed");

    /// Shout messages deleted after their TTL
    pub static ref SHOUTS_EXPIRED: Counter = Counter::new(
        "eureka_publisher_shouts_expired_total",
        "Total number of shout messages deleted after the TTL"
    ).expect("metric creation failed");

    /// TTL deletions skipped because a newer shout replaced the message
    pub static ref STALE_EXPIRIES_SKIPPED: Counter = Counter::new(
        "eureka_publisher_stale_expiries_skipped_total",
        "TTL deletions skipped because a newer shout superseded the message"
    ).expect("metric creation failed");

    /// Location updates by outcome
    pub static ref LOCATION_UPDATES: CounterVec = CounterVec::new(
        Opts::new("eureka_publisher_location_updates_total", "Location updates"),
        &["outcome"]  // outcome: moved/unchanged/rejected/failed
    ).expect("metric creation failed");

    // =========================================================================
    // SUBSCRIPTION METRICS
    // =========================================================================

    /// Snapshots applied to the message map
    pub static ref SNAPSHOTS_APPLIED: Counter = Counter::new(
        "eureka_subscription_snapshots_applied_total",
        "Snapshots from the current cell subscription applied to the view"
    ).expect("metric creation failed");

    /// Snapshots dropped because they belong to a superseded subscription
    pub static ref SNAPSHOTS_DISCARDED: Counter = Counter::new(
        "eureka_subscription_snapshots_discarded_total",
        "Late snapshots from a superseded subscription"
    ).expect("metric creation failed");

    /// Messages dropped from the view after their TTL without a notification
    pub static ref MESSAGES_PRUNED: Counter = Counter::new(
        "eureka_subscription_messages_pruned_total",
        "Expired messages removed from the view before the store deleted them"
    ).expect("metric creation failed");

    /// Resubscription attempts after a transport drop
    pub static ref RESUBSCRIPTIONS: Counter = Counter::new(
        "eureka_subscription_resubscriptions_total",
        "Resubscription attempts after a subscription error"
    ).expect("metric creation failed");

    /// Subscriptions that gave up after the retry failed
    pub static ref SUBSCRIPTIONS_DEGRADED: Counter = Counter::new(
        "eureka_subscription_degraded_total",
        "Subscriptions left degraded after a failed resubscription"
    ).expect("metric creation failed");

    // =========================================================================
    // NEIGHBOR METRICS
    // =========================================================================

    /// Neighbor fetches issued
    pub static ref NEIGHBOR_FETCHES: Counter = Counter::new(
        "eureka_neighbors_fetches_total",
        "One-shot neighbor queries issued"
    ).expect("metric creation failed");

    /// Neighbor results dropped because the set was already populated
    pub static ref NEIGHBOR_RESULTS_DISCARDED: Counter = Counter::new(
        "eureka_neighbors_results_discarded_total",
        "Neighbor results discarded on arrival"
    ).expect("metric creation failed");

    // =========================================================================
    // VIEW METRICS
    // =========================================================================

    /// Messages currently rendered
    pub static ref VISIBLE_MESSAGES: Gauge = Gauge::new(
        "eureka_view_visible_messages",
        "Number of live messages in the merged view"
    ).expect("metric creation failed");

    /// Neighbors currently rendered
    pub static ref VISIBLE_NEIGHBORS: Gauge = Gauge::new(
        "eureka_view_visible_neighbors",
        "Number of neighbor entries in the merged view"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Store errors by operation
    pub static ref STORE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("eureka_store_errors_total", "Presence store errors by operation"),
        &["operation"]  // operation: write/read/subscribe/subscription
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Publisher
        Box::new(SHOUTS_PUBLISHED.clone()),
        Box::new(SHOUTS_EXPIRED.clone()),
        Box::new(STALE_EXPIRIES_SKIPPED.clone()),
        Box::new(LOCATION_UPDATES.clone()),
        // Subscription
        Box::new(SNAPSHOTS_APPLIED.clone()),
        Box::new(SNAPSHOTS_DISCARDED.clone()),
        Box::new(MESSAGES_PRUNED.clone()),
        Box::new(RESUBSCRIPTIONS.clone()),
        Box::new(SUBSCRIPTIONS_DEGRADED.clone()),
        // Neighbors
        Box::new(NEIGHBOR_FETCHES.clone()),
        Box::new(NEIGHBOR_RESULTS_DISCARDED.clone()),
        // View
        Box::new(VISIBLE_MESSAGES.clone()),
        Box::new(VISIBLE_NEIGHBORS.clone()),
        // Errors
        Box::new(STORE_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
