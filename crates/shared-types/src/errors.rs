//! # Error Types
//!
//! Errors raised by presence store implementations.

use thiserror::Error;

/// Failures at the presence store boundary. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A `put_field` or `delete_field` did not reach the store.
    #[error("Store write failed: {0}")]
    WriteFailed(String),

    /// A one-shot query failed.
    #[error("Store read failed: {0}")]
    ReadFailed(String),

    /// A subscription could not be established.
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// An established subscription lost its transport.
    #[error("Subscription dropped: {0}")]
    SubscriptionDropped(String),
}

impl StoreError {
    /// Short label for metrics and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::WriteFailed(_) => "write",
            Self::ReadFailed(_) => "read",
            Self::SubscribeFailed(_) => "subscribe",
            Self::SubscriptionDropped(_) => "subscription",
        }
    }
}
