//! Outbound Ports (Driven Ports / SPI)
//!
//! The presence store contract lives in `shared-types` so every adapter
//! crate can implement it; it is re-exported here with the other ports.

use crate::domain::{LocationError, Position};
use async_trait::async_trait;
use shared_types::Timestamp;

pub use shared_types::PresenceStore;

/// Device location provider.
///
/// May fail with permission denied, timeout or no signal.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current position of the device.
    async fn get_position(&self) -> Result<Position, LocationError>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            // Clock before Unix epoch - return 0 rather than panic
            .unwrap_or(0);
        Timestamp::from_millis(ms)
    }
}
