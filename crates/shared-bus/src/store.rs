//! # In-Memory Presence Store
//!
//! Documents and subscriptions live behind one lock so that a write and the
//! snapshots it triggers are a single step: subscribers observe snapshots in
//! the order writes were applied.

use crate::faults::FaultInjector;
use crate::subscriber::SubscriberRegistry;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    CellId, FieldKind, PresenceField, PresenceRecord, PresenceStore, SnapshotEvent,
    SnapshotSubscription, StoreError, SubscriptionId, UserId,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

#[derive(Default)]
struct StoreState {
    documents: HashMap<UserId, PresenceRecord>,
    subscribers: SubscriberRegistry,
}

impl StoreState {
    fn snapshot(&self, cell: &CellId) -> Vec<PresenceRecord> {
        let mut records: Vec<PresenceRecord> = self
            .documents
            .values()
            .filter(|r| r.cell_id.as_ref() == Some(cell))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        records
    }

    /// Push fresh snapshots to the cells a change touched.
    fn fan_out(&mut self, before: Option<CellId>, after: Option<CellId>) {
        let touched: BTreeSet<CellId> = before.into_iter().chain(after).collect();
        for cell in touched {
            let snapshot = self.snapshot(&cell);
            let receivers = self.subscribers.notify(&cell, &snapshot);
            debug!(cell = %cell, records = snapshot.len(), receivers, "Snapshot published");
        }
    }
}

/// Process-local presence store.
#[derive(Default)]
pub struct InMemoryPresenceStore {
    state: Mutex<StoreState>,
    faults: FaultInjector,
    writes_applied: AtomicU64,
}

impl InMemoryPresenceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injection controls.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Replace a whole document, notifying affected cells.
    pub fn insert_record(&self, record: PresenceRecord) {
        let mut state = self.state.lock();
        let before = state
            .documents
            .get(&record.user_id)
            .and_then(|r| r.cell_id.clone());
        let after = record.cell_id.clone();
        state.documents.insert(record.user_id.clone(), record);
        state.fan_out(before, after);
    }

    /// Current copy of `user`'s document.
    pub fn record(&self, user: &UserId) -> Option<PresenceRecord> {
        self.state.lock().documents.get(user).cloned()
    }

    /// Number of accepted `put_field`/`delete_field` calls.
    pub fn write_count(&self) -> u64 {
        self.writes_applied.load(Ordering::Relaxed)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Cells with at least one live subscription.
    pub fn subscribed_cells(&self) -> BTreeSet<CellId> {
        self.state.lock().subscribers.cells()
    }

    /// Deliver an arbitrary event on one subscription (e.g. a stale snapshot).
    pub fn inject_snapshot(&self, id: SubscriptionId, event: SnapshotEvent) -> bool {
        self.state.lock().subscribers.inject(id, event)
    }

    /// Sever live subscriptions as a transport drop would.
    pub fn drop_subscriptions(&self, cell: Option<&CellId>) -> usize {
        let severed = self.state.lock().subscribers.sever(cell, "transport closed");
        warn!(severed, "Subscriptions severed");
        severed
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn put_field(&self, user: &UserId, field: PresenceField) -> Result<(), StoreError> {
        if self.faults.take_write() {
            return Err(StoreError::WriteFailed(format!(
                "injected failure writing {} for {}",
                field.kind(),
                user
            )));
        }
        self.writes_applied.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();
        let document = state
            .documents
            .entry(user.clone())
            .or_insert_with(|| PresenceRecord::new(user.clone()));
        let previous = document.clone();
        document.apply(field);

        if *document == previous {
            return Ok(());
        }
        let after = document.cell_id.clone();
        debug!(user = %user, "Presence document updated");
        state.fan_out(previous.cell_id, after);
        Ok(())
    }

    async fn delete_field(&self, user: &UserId, field: FieldKind) -> Result<(), StoreError> {
        if self.faults.take_write() {
            return Err(StoreError::WriteFailed(format!(
                "injected failure deleting {} for {}",
                field, user
            )));
        }
        self.writes_applied.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();
        let Some(document) = state.documents.get_mut(user) else {
            return Ok(());
        };
        let before = document.cell_id.clone();
        if !document.remove(field) {
            return Ok(());
        }
        let after = document.cell_id.clone();
        debug!(user = %user, field = %field, "Presence field deleted");
        state.fan_out(before, after);
        Ok(())
    }

    async fn query(&self, cell: &CellId) -> Result<Vec<PresenceRecord>, StoreError> {
        if self.faults.take_read() {
            return Err(StoreError::ReadFailed(format!(
                "injected failure querying {}",
                cell
            )));
        }
        Ok(self.state.lock().snapshot(cell))
    }

    async fn subscribe(&self, cell: &CellId) -> Result<SnapshotSubscription, StoreError> {
        if self.faults.take_subscribe() {
            return Err(StoreError::SubscribeFailed(format!(
                "injected failure subscribing to {}",
                cell
            )));
        }

        let mut state = self.state.lock();
        let initial = state.snapshot(cell);
        let (id, snapshots) = state.subscribers.register(cell.clone());
        // The first notification is the current state of the cell.
        state.subscribers.inject(id, Ok(initial));

        Ok(SnapshotSubscription {
            id,
            cell: cell.clone(),
            snapshots,
        })
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        self.state.lock().subscribers.remove(id);
    }
}
