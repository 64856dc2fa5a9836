//! # Presence Store Contract
//!
//! The abstract document store every client talks to. Implementations own
//! the transport; the core only relies on the semantics below.
//!
//! ## Semantics
//!
//! - Writes to a single document are last-write-wins.
//! - `delete_field` on an absent field is a no-op, not an error.
//! - A subscription delivers the **full** set of records whose `cell_id`
//!   matches, on subscribe and after every change. Never a diff.
//! - Delivery order across users is not guaranteed to match wall-clock write
//!   order. Consumers treat the stream as eventually consistent.
//! - A transport drop is delivered as `Err(StoreError::SubscriptionDropped)`
//!   and ends the stream.

use crate::entities::{CellId, FieldKind, PresenceField, PresenceRecord, UserId};
use crate::errors::StoreError;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// One notification on a snapshot subscription.
pub type SnapshotEvent = Result<Vec<PresenceRecord>, StoreError>;

/// Identifies a live subscription so it can be torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handle returned by [`PresenceStore::subscribe`].
#[derive(Debug)]
pub struct SnapshotSubscription {
    /// Handle id, passed back to [`PresenceStore::unsubscribe`].
    pub id: SubscriptionId,
    /// Cell this subscription is scoped to.
    pub cell: CellId,
    /// Snapshot notifications. Closed after unsubscribe or a transport drop.
    pub snapshots: mpsc::UnboundedReceiver<SnapshotEvent>,
}

/// Presence store - outbound port of every client.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Upsert one field on `user`'s document, creating the document if needed.
    async fn put_field(&self, user: &UserId, field: PresenceField) -> Result<(), StoreError>;

    /// Remove one field from `user`'s document. No-op if already absent.
    async fn delete_field(&self, user: &UserId, field: FieldKind) -> Result<(), StoreError>;

    /// One-shot read of every record in `cell`.
    async fn query(&self, cell: &CellId) -> Result<Vec<PresenceRecord>, StoreError>;

    /// Open a realtime snapshot subscription scoped to `cell`.
    async fn subscribe(&self, cell: &CellId) -> Result<SnapshotSubscription, StoreError>;

    /// Tear a subscription down. Unknown ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId);
}
