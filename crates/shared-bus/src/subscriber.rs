//! # Subscriber Registry
//!
//! Tracks live snapshot subscriptions by id and the cell they watch.

use shared_types::{CellId, PresenceRecord, SnapshotEvent, StoreError, SubscriptionId};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc;
use tracing::debug;

struct Subscriber {
    cell: CellId,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
}

/// Live subscriptions keyed by id.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: HashMap<SubscriptionId, Subscriber>,
    next_id: u64,
}

impl SubscriberRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription on `cell` and hand back its receiving end.
    pub fn register(
        &mut self,
        cell: CellId,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<SnapshotEvent>) {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(subscription = %id, cell = %cell, "New subscription created");
        self.subscribers.insert(id, Subscriber { cell, sender });
        (id, receiver)
    }

    /// Remove a subscription, closing its channel.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(subscription = %id, "Subscription dropped");
        }
        removed
    }

    /// Send `snapshot` to every subscription on `cell`.
    ///
    /// Subscriptions whose receiver is gone are cleaned up. Returns how many
    /// subscriptions received the snapshot.
    pub fn notify(&mut self, cell: &CellId, snapshot: &[PresenceRecord]) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|id, sub| {
            if &sub.cell != cell {
                return true;
            }
            match sub.sender.send(Ok(snapshot.to_vec())) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    debug!(subscription = %id, "Receiver gone, removing subscription");
                    false
                }
            }
        });
        delivered
    }

    /// Push a raw event to one subscription, bypassing the documents.
    pub fn inject(&self, id: SubscriptionId, event: SnapshotEvent) -> bool {
        self.subscribers
            .get(&id)
            .map(|sub| sub.sender.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Simulate a transport drop on every subscription (optionally only those
    /// on `cell`). Each receives one error and is then closed.
    pub fn sever(&mut self, cell: Option<&CellId>, reason: &str) -> usize {
        let doomed: Vec<SubscriptionId> = self
            .subscribers
            .iter()
            .filter(|(_, sub)| cell.map_or(true, |c| &sub.cell == c))
            .map(|(id, _)| *id)
            .collect();

        for id in &doomed {
            if let Some(sub) = self.subscribers.remove(id) {
                let _ = sub
                    .sender
                    .send(Err(StoreError::SubscriptionDropped(reason.to_string())));
            }
        }
        doomed.len()
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether there are no live subscriptions.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Distinct cells currently watched.
    pub fn cells(&self) -> BTreeSet<CellId> {
        self.subscribers.values().map(|s| s.cell.clone()).collect()
    }

    /// Cell watched by `id`.
    pub fn cell_of(&self, id: SubscriptionId) -> Option<&CellId> {
        self.subscribers.get(&id).map(|s| &s.cell)
    }
}
