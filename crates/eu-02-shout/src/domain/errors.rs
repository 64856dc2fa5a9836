//! # Domain Errors

use shared_types::StoreError;
use thiserror::Error;

/// Location provider failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Permission denied, no signal, or timeout.
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by shout operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShoutError {
    /// Coordinate outside the valid range. No state was changed.
    #[error("Invalid coordinate: ({lat}, {lon})")]
    InvalidCoordinate {
        /// Rejected latitude
        lat: f64,
        /// Rejected longitude
        lon: f64,
    },

    /// The location provider could not produce a fix.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// `locate` was called on a session without a location provider.
    #[error("No location provider configured")]
    NoLocationProvider,

    /// A field write or delete failed. Local state was kept as it was.
    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),

    /// A one-shot query failed.
    #[error("Store read failed: {0}")]
    StoreReadFailed(String),

    /// Subscribing to a cell failed or the subscription dropped.
    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    /// Empty or whitespace-only shout content.
    #[error("Message is empty")]
    EmptyMessage,

    /// Shout content above the configured length limit.
    #[error("Message too long: {len} chars (max {max})")]
    MessageTooLong {
        /// Length in characters
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// A shout was attempted before the first location fix.
    #[error("No location fix yet")]
    NoLocationFix,

    /// The session actor has shut down.
    #[error("Session closed")]
    SessionClosed,
}

impl From<StoreError> for ShoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WriteFailed(msg) => Self::StoreWriteFailed(msg),
            StoreError::ReadFailed(msg) => Self::StoreReadFailed(msg),
            StoreError::SubscribeFailed(msg) | StoreError::SubscriptionDropped(msg) => {
                Self::SubscriptionError(msg)
            }
        }
    }
}

impl From<LocationError> for ShoutError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::Unavailable(msg) => Self::LocationUnavailable(msg),
        }
    }
}
