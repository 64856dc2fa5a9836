//! # Cell Subscription Manager
//!
//! Holds at most one realtime subscription, scoped to the local user's cell.
//!
//! Each subscription gets a generation number. Its forwarder task tags every
//! snapshot with that number, and anything tagged with an older generation
//! is discarded, so results from a cancelled subscription are never merged.
//!
//! ## Failure policy
//!
//! After a transport drop the manager resubscribes to the same cell once. If
//! that attempt fails, or the new subscription drops again before delivering
//! a change notification, the status becomes `Degraded` and no further
//! retries happen. The initial snapshot a store pushes on subscribe does not
//! count as proof of recovery.
//!
//! ## Expiry
//!
//! The last accepted records are kept so messages whose TTL elapses between
//! notifications can be pruned without waiting for the author's deletion.

use crate::algorithms::project_messages;
use crate::domain::{MessageMap, ShoutError, SubscriptionStatus};
use crate::ports::{PresenceStore, TimeSource};
use crate::service::events::SessionEvent;
use eureka_telemetry::{
    metric_inc, RESUBSCRIPTIONS, SNAPSHOTS_APPLIED, SNAPSHOTS_DISCARDED, STORE_ERRORS,
    SUBSCRIPTIONS_DEGRADED,
};
use shared_types::{
    CellId, PresenceRecord, SnapshotEvent, StoreError, SubscriptionId, UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct ActiveSubscription {
    id: SubscriptionId,
    cell: CellId,
    generation: u64,
    snapshots_seen: u64,
    forwarder: JoinHandle<()>,
}

/// Manages the single cell subscription.
pub struct CellSubscriptionManager {
    local_user: UserId,
    store: Arc<dyn PresenceStore>,
    time: Arc<dyn TimeSource>,
    events: mpsc::UnboundedSender<SessionEvent>,
    active: Option<ActiveSubscription>,
    status: SubscriptionStatus,
    generation: u64,
    retry_spent: bool,
    last_records: Vec<PresenceRecord>,
}

impl CellSubscriptionManager {
    /// Create an unsubscribed manager. Snapshots are forwarded to `events`.
    pub fn new(
        local_user: UserId,
        store: Arc<dyn PresenceStore>,
        time: Arc<dyn TimeSource>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            local_user,
            store,
            time,
            events,
            active: None,
            status: SubscriptionStatus::Unsubscribed,
            generation: 0,
            retry_spent: false,
            last_records: Vec::new(),
        }
    }

    /// Current status.
    pub fn status(&self) -> &SubscriptionStatus {
        &self.status
    }

    /// Store handle of the live subscription.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Generation of the live subscription.
    pub fn generation(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.generation)
    }

    /// Subscribe to `cell`, tearing down any previous subscription first.
    ///
    /// A failed subscribe is retried once before the status degrades.
    pub async fn switch_to(&mut self, cell: CellId) -> Result<(), ShoutError> {
        if self.active.as_ref().map(|a| &a.cell) == Some(&cell) {
            return Ok(());
        }

        self.release().await;
        self.retry_spent = false;
        self.last_records.clear();

        if let Err(first) = self.open(&cell).await {
            warn!(cell = %cell, error = %first, "Subscribe failed, retrying once");
            self.retry_spent = true;
            metric_inc!(RESUBSCRIPTIONS);
            if let Err(second) = self.open(&cell).await {
                self.degrade(cell);
                return Err(second.into());
            }
        }
        Ok(())
    }

    /// Project a snapshot if it belongs to the live subscription.
    ///
    /// Each accepted snapshot replaces the previous map outright.
    pub fn accept_snapshot(
        &mut self,
        generation: u64,
        records: &[PresenceRecord],
    ) -> Option<MessageMap> {
        let active = match self.active.as_mut() {
            Some(active) if active.generation == generation => active,
            _ => {
                metric_inc!(SNAPSHOTS_DISCARDED);
                debug!(generation, "Late snapshot discarded");
                return None;
            }
        };

        active.snapshots_seen += 1;
        if active.snapshots_seen > 1 {
            self.retry_spent = false;
        }
        self.last_records = records.to_vec();
        metric_inc!(SNAPSHOTS_APPLIED);
        let mut rng = rand::thread_rng();
        Some(project_messages(
            records,
            &self.local_user,
            self.time.now(),
            &mut rng,
        ))
    }

    /// React to a transport drop on the subscription tagged `generation`.
    pub async fn handle_loss(
        &mut self,
        generation: u64,
        error: StoreError,
    ) -> Result<(), ShoutError> {
        let cell = match &self.active {
            Some(active) if active.generation == generation => active.cell.clone(),
            _ => {
                debug!(generation, "Loss of a superseded subscription ignored");
                return Ok(());
            }
        };

        metric_inc!(STORE_ERRORS, &[error.operation()]);
        warn!(cell = %cell, error = %error, "Cell subscription lost");
        self.release().await;

        if self.retry_spent {
            self.degrade(cell);
            return Err(error.into());
        }

        self.retry_spent = true;
        metric_inc!(RESUBSCRIPTIONS);
        match self.open(&cell).await {
            Ok(()) => {
                info!(cell = %cell, "Resubscribed after transport drop");
                Ok(())
            }
            Err(e) => {
                self.degrade(cell);
                Err(e.into())
            }
        }
    }

    /// Time until the earliest live message in the last accepted snapshot
    /// expires, if any is live.
    pub fn next_expiry_in(&self) -> Option<Duration> {
        let now = self.time.now();
        self.last_records
            .iter()
            .filter(|r| r.user_id != self.local_user)
            .filter_map(|r| r.live_message(now))
            .map(|m| m.expires_at())
            .min()
            .map(|at| Duration::from_millis(at.as_millis().saturating_sub(now.as_millis()).max(1)))
    }

    /// Authors in the last accepted snapshot whose message has expired.
    ///
    /// Still reported if the author's deletion never reached the store.
    pub fn expired_authors(&self) -> Vec<UserId> {
        let now = self.time.now();
        self.last_records
            .iter()
            .filter(|r| r.user_id != self.local_user)
            .filter(|r| r.message.is_some() && r.live_message(now).is_none())
            .map(|r| r.user_id.clone())
            .collect()
    }

    /// Drop the subscription and return to `Unsubscribed`.
    pub async fn teardown(&mut self) {
        self.release().await;
        self.last_records.clear();
        self.status = SubscriptionStatus::Unsubscribed;
    }

    async fn open(&mut self, cell: &CellId) -> Result<(), StoreError> {
        let subscription = self.store.subscribe(cell).await.inspect_err(|e| {
            metric_inc!(STORE_ERRORS, &[e.operation()]);
        })?;

        self.generation += 1;
        let generation = self.generation;
        let forwarder = spawn_forwarder(subscription.snapshots, generation, self.events.clone());

        debug!(cell = %cell, id = %subscription.id, generation, "Subscribed to cell");
        self.active = Some(ActiveSubscription {
            id: subscription.id,
            cell: cell.clone(),
            generation,
            snapshots_seen: 0,
            forwarder,
        });
        self.status = SubscriptionStatus::Live(cell.clone());
        Ok(())
    }

    async fn release(&mut self) {
        if let Some(active) = self.active.take() {
            active.forwarder.abort();
            self.store.unsubscribe(active.id).await;
            debug!(cell = %active.cell, id = %active.id, "Unsubscribed from cell");
        }
    }

    fn degrade(&mut self, cell: CellId) {
        metric_inc!(SUBSCRIPTIONS_DEGRADED);
        warn!(cell = %cell, "Cell subscription degraded, messages will not update");
        self.status = SubscriptionStatus::Degraded(cell);
    }
}

/// Relay snapshots into the session queue until the stream ends.
fn spawn_forwarder(
    mut snapshots: mpsc::UnboundedReceiver<SnapshotEvent>,
    generation: u64,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = snapshots.recv().await {
            match event {
                Ok(records) => {
                    if events
                        .send(SessionEvent::Snapshot {
                            generation,
                            records,
                        })
                        .is_err()
                    {
                        return;
                    }
                }
                Err(error) => {
                    let _ = events.send(SessionEvent::SubscriptionLost { generation, error });
                    return;
                }
            }
        }
        let _ = events.send(SessionEvent::SubscriptionLost {
            generation,
            error: StoreError::SubscriptionDropped("stream closed".to_string()),
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTimeSource;
    use shared_bus::InMemoryPresenceStore;
    use shared_types::{ShoutMessage, Timestamp};

    struct Harness {
        manager: CellSubscriptionManager,
        store: Arc<InMemoryPresenceStore>,
        events: mpsc::UnboundedReceiver<SessionEvent>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryPresenceStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = CellSubscriptionManager::new(
            UserId::new("a@x"),
            store.clone(),
            Arc::new(MockTimeSource::new(1_000)),
            tx,
        );
        Harness {
            manager,
            store,
            events: rx,
        }
    }

    fn talker(user: &str, cell: &str, text: &str) -> PresenceRecord {
        let mut record = PresenceRecord::new(UserId::new(user));
        record.cell_id = Some(CellId::new(cell));
        record.message = Some(ShoutMessage::new(text, Timestamp::from_millis(1_000)));
        record
    }

    async fn next_snapshot(h: &mut Harness) -> (u64, Vec<PresenceRecord>) {
        match h.events.recv().await {
            Some(SessionEvent::Snapshot {
                generation,
                records,
            }) => (generation, records),
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_switch_delivers_initial_snapshot() {
        let mut h = harness();
        h.store.insert_record(talker("b@x", "wydm", "Hello"));

        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (generation, records) = next_snapshot(&mut h).await;
        let map = h.manager.accept_snapshot(generation, &records).unwrap();

        assert_eq!(map[&UserId::new("b@x")].content, "Hello");
        assert_eq!(
            h.manager.status(),
            &SubscriptionStatus::Live(CellId::new("wydm"))
        );
    }

    #[tokio::test]
    async fn test_switch_keeps_exactly_one_subscription() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        h.manager.switch_to(CellId::new("wydn")).await.unwrap();

        assert_eq!(h.store.subscription_count(), 1);
        assert_eq!(
            h.store.subscribed_cells().into_iter().collect::<Vec<_>>(),
            vec![CellId::new("wydn")]
        );
    }

    #[tokio::test]
    async fn test_switch_to_same_cell_is_noop() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let id = h.manager.subscription_id();

        h.manager.switch_to(CellId::new("wydm")).await.unwrap();

        assert_eq!(h.manager.subscription_id(), id);
    }

    #[tokio::test]
    async fn test_late_snapshot_from_old_cell_is_discarded() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (old_generation, _) = next_snapshot(&mut h).await;
        h.manager.switch_to(CellId::new("wydn")).await.unwrap();

        let late = vec![talker("b@x", "wydm", "late")];
        assert!(h.manager.accept_snapshot(old_generation, &late).is_none());
    }

    #[tokio::test]
    async fn test_latest_snapshot_wins() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (generation, _) = next_snapshot(&mut h).await;

        let stale = vec![
            talker("b@x", "wydm", "old"),
            talker("c@x", "wydm", "gone"),
        ];
        let fresh = vec![talker("b@x", "wydm", "new")];
        h.manager.accept_snapshot(generation, &stale).unwrap();
        let map = h.manager.accept_snapshot(generation, &fresh).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map[&UserId::new("b@x")].content, "new");
    }

    #[tokio::test]
    async fn test_drop_triggers_one_resubscription() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (generation, _) = next_snapshot(&mut h).await;

        h.manager
            .handle_loss(generation, StoreError::SubscriptionDropped("reset".into()))
            .await
            .unwrap();

        assert!(h.manager.status().is_live());
        assert_ne!(h.manager.generation(), Some(generation));
        assert_eq!(h.store.subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_resubscription_degrades() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (generation, _) = next_snapshot(&mut h).await;
        h.store.faults().fail_next_subscribes(1);

        let result = h
            .manager
            .handle_loss(generation, StoreError::SubscriptionDropped("reset".into()))
            .await;

        assert!(matches!(result, Err(ShoutError::SubscriptionError(_))));
        assert_eq!(
            h.manager.status(),
            &SubscriptionStatus::Degraded(CellId::new("wydm"))
        );
    }

    #[tokio::test]
    async fn test_second_drop_without_snapshot_degrades() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (generation, _) = next_snapshot(&mut h).await;

        h.manager
            .handle_loss(generation, StoreError::SubscriptionDropped("reset".into()))
            .await
            .unwrap();
        let retried = h.manager.generation().unwrap();
        let result = h
            .manager
            .handle_loss(retried, StoreError::SubscriptionDropped("reset".into()))
            .await;

        assert!(result.is_err());
        assert!(h.manager.status().is_degraded());
    }

    #[tokio::test]
    async fn test_change_notification_resets_retry_budget() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (first, _) = next_snapshot(&mut h).await;

        h.manager
            .handle_loss(first, StoreError::SubscriptionDropped("reset".into()))
            .await
            .unwrap();
        let (second, records) = next_snapshot(&mut h).await;
        h.manager.accept_snapshot(second, &records).unwrap();
        h.store.insert_record(talker("b@x", "wydm", "back"));
        let (_, changed) = next_snapshot(&mut h).await;
        h.manager.accept_snapshot(second, &changed).unwrap();

        h.manager
            .handle_loss(second, StoreError::SubscriptionDropped("reset".into()))
            .await
            .unwrap();
        assert!(h.manager.status().is_live());
    }

    #[tokio::test]
    async fn test_initial_snapshot_after_resubscribe_keeps_budget_spent() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (first, records) = next_snapshot(&mut h).await;
        h.manager.accept_snapshot(first, &records).unwrap();

        h.manager
            .handle_loss(first, StoreError::SubscriptionDropped("reset".into()))
            .await
            .unwrap();
        let (second, initial) = next_snapshot(&mut h).await;
        h.manager.accept_snapshot(second, &initial).unwrap();

        let result = h
            .manager
            .handle_loss(second, StoreError::SubscriptionDropped("reset".into()))
            .await;

        assert!(result.is_err());
        assert_eq!(
            h.manager.status(),
            &SubscriptionStatus::Degraded(CellId::new("wydm"))
        );
    }

    #[tokio::test]
    async fn test_expiry_tracking_over_last_snapshot() {
        let time = Arc::new(MockTimeSource::new(1_000));
        let store = Arc::new(InMemoryPresenceStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager =
            CellSubscriptionManager::new(UserId::new("a@x"), store.clone(), time.clone(), tx);
        store.insert_record(talker("b@x", "wydm", "first"));
        let mut later = talker("c@x", "wydm", "second");
        later.message = Some(ShoutMessage::new("second", Timestamp::from_millis(3_000)));
        store.insert_record(later);
        store.insert_record(talker("a@x", "wydm", "mine"));

        manager.switch_to(CellId::new("wydm")).await.unwrap();
        let Some(SessionEvent::Snapshot { generation, records }) = rx.recv().await else {
            panic!("expected snapshot");
        };
        manager.accept_snapshot(generation, &records).unwrap();

        assert_eq!(manager.next_expiry_in(), Some(Duration::from_secs(6)));
        assert!(manager.expired_authors().is_empty());

        time.set(7_000);
        assert_eq!(manager.expired_authors(), vec![UserId::new("b@x")]);
        assert_eq!(manager.next_expiry_in(), Some(Duration::from_secs(2)));

        time.set(9_000);
        assert_eq!(manager.expired_authors().len(), 2);
        assert_eq!(manager.next_expiry_in(), None);
    }

    #[tokio::test]
    async fn test_cell_change_forgets_last_snapshot() {
        let mut h = harness();
        h.store.insert_record(talker("b@x", "wydm", "Hello"));
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (generation, records) = next_snapshot(&mut h).await;
        h.manager.accept_snapshot(generation, &records).unwrap();
        assert!(h.manager.next_expiry_in().is_some());

        h.manager.switch_to(CellId::new("wydn")).await.unwrap();

        assert_eq!(h.manager.next_expiry_in(), None);
    }

    #[tokio::test]
    async fn test_initial_subscribe_failure_is_retried_once() {
        let mut h = harness();
        h.store.faults().fail_next_subscribes(1);

        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        assert!(h.manager.status().is_live());

        h.manager.teardown().await;
        h.store.faults().fail_next_subscribes(2);
        assert!(h.manager.switch_to(CellId::new("wydn")).await.is_err());
        assert!(h.manager.status().is_degraded());
    }

    #[tokio::test]
    async fn test_loss_of_superseded_subscription_is_ignored() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();
        let (old, _) = next_snapshot(&mut h).await;
        h.manager.switch_to(CellId::new("wydn")).await.unwrap();
        let current = h.manager.generation();

        h.manager
            .handle_loss(old, StoreError::SubscriptionDropped("late".into()))
            .await
            .unwrap();

        assert_eq!(h.manager.generation(), current);
    }

    #[tokio::test]
    async fn test_teardown_unsubscribes() {
        let mut h = harness();
        h.manager.switch_to(CellId::new("wydm")).await.unwrap();

        h.manager.teardown().await;

        assert_eq!(h.store.subscription_count(), 0);
        assert_eq!(h.manager.status(), &SubscriptionStatus::Unsubscribed);
    }
}
