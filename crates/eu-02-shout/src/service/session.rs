//! # Shout Session
//!
//! Single-owner actor that wires the publisher, subscription manager,
//! resolver and aggregator together. Handle calls and internal events
//! (snapshots, timer expiries, fetch results) are processed one at a time,
//! each to completion, so no component state is ever touched concurrently.
//!
//! Timers are plain sleeping tasks that post an event back into the queue.
//! Every one of them is aborted on shutdown.
//!
//! Besides the author's own deletion, readers drop a peer's message once its
//! TTL has elapsed: a timer re-checks the last accepted snapshot at the
//! earliest expiry, so a message whose deletion never lands still disappears.

use crate::config::ShoutConfig;
use crate::domain::{
    ExpiryOutcome, LocationUpdate, NeighborSet, ShoutError, ShoutReceipt, SubscriptionStatus,
    TimerToken, ViewModel,
};
use crate::ports::{LocationProvider, PresenceStore, ShoutApi, SystemTimeSource, TimeSource};
use crate::service::aggregator::{EphemeralStateAggregator, NeighborMerge};
use crate::service::events::{Command, Reply, SessionEvent};
use crate::service::publisher::PresencePublisher;
use crate::service::resolver::NeighborResolver;
use crate::service::subscription::CellSubscriptionManager;
use async_trait::async_trait;
use eureka_telemetry::{
    log_presence_event, metric_inc, metric_set, MESSAGES_PRUNED, NEIGHBOR_RESULTS_DISCARDED,
    VISIBLE_MESSAGES, VISIBLE_NEIGHBORS,
};
use parking_lot::Mutex;
use shared_types::{CellId, Identity, Timestamp, SHOUT_TTL};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Tries at deleting an expired shout before giving up.
const EXPIRY_ATTEMPTS: u32 = 3;
/// Pause between failed deletion tries.
const EXPIRY_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Builds and spawns a [`ShoutSession`].
pub struct SessionBuilder {
    identity: Identity,
    store: Arc<dyn PresenceStore>,
    config: ShoutConfig,
    time: Arc<dyn TimeSource>,
    location: Option<Arc<dyn LocationProvider>>,
}

impl SessionBuilder {
    /// Session for `identity` on `store` with default configuration.
    pub fn new(identity: Identity, store: Arc<dyn PresenceStore>) -> Self {
        Self {
            identity,
            store,
            config: ShoutConfig::default(),
            time: Arc::new(SystemTimeSource),
            location: None,
        }
    }

    /// Override the configuration.
    pub fn with_config(mut self, config: ShoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the clock used for `created_at` and TTL filtering.
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Attach a location provider for `locate` and polling.
    pub fn with_location_provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location = Some(provider);
        self
    }

    /// Spawn the session actor on the current runtime.
    pub fn spawn(self) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let aggregator = EphemeralStateAggregator::new(self.config.default_message.clone());
        let (view_tx, view_rx) = watch::channel(aggregator.view());

        let publisher = PresencePublisher::new(
            self.identity.clone(),
            self.store.clone(),
            self.time.clone(),
            self.config.max_message_chars,
        );
        let subscriptions = CellSubscriptionManager::new(
            self.identity.user_id.clone(),
            self.store.clone(),
            self.time,
            event_tx.clone(),
        );

        let location_poll = match (&self.location, self.config.location_poll_interval()) {
            (Some(_), Some(period)) => Some(spawn_location_poll(period, event_tx.clone())),
            _ => None,
        };

        let session = ShoutSession {
            publisher,
            subscriptions,
            resolver: NeighborResolver::new(self.store),
            aggregator,
            location: self.location,
            config: self.config,
            events: event_tx,
            view: view_tx,
            ttl_timer: None,
            message_expiry: None,
            debounce_timer: None,
            neighbor_fetch: None,
            location_poll,
        };

        let task = tokio::spawn(session.run(command_rx, event_rx));

        SessionHandle {
            commands: command_tx,
            view: view_rx,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

/// The session actor. Owned by its task; reach it through [`SessionHandle`].
pub struct ShoutSession {
    publisher: PresencePublisher,
    subscriptions: CellSubscriptionManager,
    resolver: NeighborResolver,
    aggregator: EphemeralStateAggregator,
    location: Option<Arc<dyn LocationProvider>>,
    config: ShoutConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
    view: watch::Sender<ViewModel>,
    ttl_timer: Option<JoinHandle<()>>,
    message_expiry: Option<JoinHandle<()>>,
    debounce_timer: Option<JoinHandle<()>>,
    neighbor_fetch: Option<JoinHandle<()>>,
    location_poll: Option<JoinHandle<()>>,
}

impl ShoutSession {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let user = self.publisher.identity().user_id.clone();
        log_presence_event!(info, "session", "Shout session started", user);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let keep_running = match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            // Every handle is gone.
                            self.teardown().await;
                            false
                        }
                    };
                    self.publish_view();
                    if !keep_running {
                        break;
                    }
                }
                Some(event) = events.recv() => {
                    self.handle_event(event).await;
                    self.publish_view();
                }
            }
        }

        log_presence_event!(info, "session", "Shout session stopped", user);
    }

    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::UpdateLocation { lat, lon, reply } => {
                let result = self.update_location(lat, lon).await;
                let _ = reply.send(result);
            }
            Command::Locate { reply } => {
                let result = self.locate().await;
                let _ = reply.send(result);
            }
            Command::Shout { content, reply } => {
                let result = self.shout(content).await;
                let _ = reply.send(result);
            }
            Command::SelectMessage { text, reply } => {
                let result = self
                    .publisher
                    .validate(&text)
                    .map(|text| self.aggregator.select_message(text));
                let _ = reply.send(result);
            }
            Command::Shutdown { reply } => {
                self.teardown().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Snapshot {
                generation,
                records,
            } => {
                if let Some(messages) = self.subscriptions.accept_snapshot(generation, &records) {
                    self.aggregator.replace_messages(messages);
                    self.schedule_message_expiry();
                }
            }
            SessionEvent::MessagesExpiring => {
                let expired = self.subscriptions.expired_authors();
                let removed = self.aggregator.expire_messages(&expired);
                if removed > 0 {
                    MESSAGES_PRUNED.inc_by(removed as f64);
                    debug!(removed, "Expired messages dropped from view");
                }
                self.schedule_message_expiry();
            }
            SessionEvent::SubscriptionLost { generation, error } => {
                if let Err(e) = self.subscriptions.handle_loss(generation, error).await {
                    warn!(error = %e, "Cell subscription could not be restored");
                }
                self.aggregator
                    .set_subscription(self.subscriptions.status().clone());
            }
            SessionEvent::ShoutExpired {
                created_at,
                attempt,
            } => self.expire(created_at, attempt).await,
            SessionEvent::NeighborsResolved { cell, result } => {
                self.neighbor_fetch = None;
                self.publisher.finish_neighbor_fetch();
                self.apply_neighbors(cell, result);
            }
            SessionEvent::DebounceElapsed { token } => {
                if self.aggregator.debounce_elapsed(token) {
                    self.debounce_timer = None;
                    debug!(%token, "Neighbors and ripples cleared");
                }
            }
            SessionEvent::LocationTick => {
                if let Err(e) = self.locate().await {
                    debug!(error = %e, "Location poll skipped");
                }
            }
        }
    }

    async fn update_location(&mut self, lat: f64, lon: f64) -> Result<LocationUpdate, ShoutError> {
        let update = self
            .publisher
            .update_location(lat, lon)
            .await
            .inspect_err(|e| warn!(error = %e, lat, lon, "Location update rejected"))?;

        if let LocationUpdate::Moved { from, to } = &update {
            info!(
                user = %self.publisher.identity().user_id,
                from = ?from.as_ref().map(CellId::as_str),
                to = %to,
                "Moved to new cell"
            );
            self.aggregator.enter_cell(to.clone());
            if let Err(e) = self.subscriptions.switch_to(to.clone()).await {
                warn!(cell = %to, error = %e, "Subscription for new cell failed");
            }
            self.schedule_message_expiry();
            self.aggregator
                .set_subscription(self.subscriptions.status().clone());
        }

        Ok(update)
    }

    async fn locate(&mut self) -> Result<LocationUpdate, ShoutError> {
        let provider = self
            .location
            .clone()
            .ok_or(ShoutError::NoLocationProvider)?;

        let position = provider.get_position().await.map_err(|e| {
            warn!(error = %e, "Location unavailable, keeping last cell");
            ShoutError::from(e)
        })?;

        self.update_location(position.lat, position.lon).await
    }

    async fn shout(&mut self, content: Option<String>) -> Result<ShoutReceipt, ShoutError> {
        let text = content.unwrap_or_else(|| self.aggregator.selected_message().to_string());
        let receipt = self
            .publisher
            .shout(&text)
            .await
            .inspect_err(|e| warn!(error = %e, "Shout rejected"))?;

        log_presence_event!(
            info,
            "publisher",
            "Shout published",
            self.publisher.identity().user_id,
            created_at = receipt.created_at.as_millis()
        );

        self.schedule_expiry(receipt.created_at);
        if let Some(token) = self.aggregator.record_ripple() {
            self.schedule_debounce(token);
        }
        self.fetch_neighbors_if_needed();

        Ok(receipt)
    }

    async fn expire(&mut self, created_at: Timestamp, attempt: u32) {
        match self.publisher.expire(created_at).await {
            Ok(ExpiryOutcome::Deleted) => {
                self.ttl_timer = None;
                debug!(created_at = created_at.as_millis(), "Shout expired");
            }
            Ok(ExpiryOutcome::Superseded) => {}
            Err(e) if attempt < EXPIRY_ATTEMPTS => {
                warn!(error = %e, attempt, "TTL deletion failed, retrying");
                self.arm_expiry(created_at, attempt + 1, EXPIRY_RETRY_DELAY);
            }
            Err(e) => warn!(error = %e, attempt, "TTL deletion failed, giving up"),
        }
    }

    fn apply_neighbors(&mut self, cell: CellId, result: Result<NeighborSet, ShoutError>) {
        let neighbors = match result {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!(cell = %cell, error = %e, "Neighbor fetch failed");
                return;
            }
        };

        if self.publisher.current_cell() != Some(&cell) {
            metric_inc!(NEIGHBOR_RESULTS_DISCARDED);
            debug!(cell = %cell, "Neighbors for a previous cell discarded");
            return;
        }

        match self.aggregator.merge_neighbors(neighbors) {
            NeighborMerge::Applied(Some(token)) => self.schedule_debounce(token),
            NeighborMerge::Applied(None) => {}
            NeighborMerge::Discarded => {
                metric_inc!(NEIGHBOR_RESULTS_DISCARDED);
                debug!(cell = %cell, "Neighbors already shown, result discarded");
            }
        }
    }

    fn schedule_expiry(&mut self, created_at: Timestamp) {
        self.arm_expiry(created_at, 1, SHOUT_TTL);
    }

    fn arm_expiry(&mut self, created_at: Timestamp, attempt: u32, delay: Duration) {
        if let Some(previous) = self.ttl_timer.take() {
            previous.abort();
        }
        let events = self.events.clone();
        self.ttl_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SessionEvent::ShoutExpired {
                created_at,
                attempt,
            });
        }));
    }

    /// Re-arm the reader-side expiry check for the current snapshot.
    fn schedule_message_expiry(&mut self) {
        if let Some(previous) = self.message_expiry.take() {
            previous.abort();
        }
        let Some(delay) = self.subscriptions.next_expiry_in() else {
            return;
        };
        let events = self.events.clone();
        self.message_expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SessionEvent::MessagesExpiring);
        }));
    }

    fn schedule_debounce(&mut self, token: TimerToken) {
        let events = self.events.clone();
        let window = self.config.debounce_window();
        self.debounce_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = events.send(SessionEvent::DebounceElapsed { token });
        }));
    }

    fn fetch_neighbors_if_needed(&mut self) {
        let Some(cell) = self.publisher.current_cell().cloned() else {
            return;
        };
        if !self
            .publisher
            .begin_neighbor_fetch(self.aggregator.neighbors_empty())
        {
            return;
        }

        let resolver = self.resolver.clone();
        let exclude = self.publisher.identity().user_id.clone();
        let events = self.events.clone();
        self.neighbor_fetch = Some(tokio::spawn(async move {
            let result = resolver.fetch_neighbors(&cell, &exclude).await;
            let _ = events.send(SessionEvent::NeighborsResolved { cell, result });
        }));
    }

    async fn teardown(&mut self) {
        let tasks = [
            self.ttl_timer.take(),
            self.message_expiry.take(),
            self.debounce_timer.take(),
            self.neighbor_fetch.take(),
            self.location_poll.take(),
        ];
        for task in tasks.into_iter().flatten() {
            task.abort();
        }

        self.aggregator.teardown();
        self.subscriptions.teardown().await;
        self.aggregator
            .set_subscription(SubscriptionStatus::Unsubscribed);

        if let Err(e) = self.publisher.retract().await {
            warn!(error = %e, "Could not retract active message on shutdown");
        }
    }

    fn publish_view(&self) {
        let view = self.aggregator.view();
        metric_set!(VISIBLE_MESSAGES, view.message_count() as f64);
        metric_set!(VISIBLE_NEIGHBORS, view.neighbor_count() as f64);
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}

fn spawn_location_poll(
    period: std::time::Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if events.send(SessionEvent::LocationTick).is_err() {
                return;
            }
        }
    })
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<ViewModel>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ShoutError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .map_err(|_| ShoutError::SessionClosed)?;
        rx.await.map_err(|_| ShoutError::SessionClosed)?
    }

    /// Invoke `listener` with every new view until the session stops.
    pub fn on_state_changed<F>(&self, mut listener: F) -> JoinHandle<()>
    where
        F: FnMut(&ViewModel) + Send + 'static,
    {
        let mut view = self.view.clone();
        tokio::spawn(async move {
            while view.changed().await.is_ok() {
                let current = view.borrow_and_update().clone();
                listener(&current);
            }
        })
    }

    /// Tear the session down: cancel timers, unsubscribe and retract the
    /// active message. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply: tx }).is_ok() {
            let _ = rx.await;
        }
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Whether the session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

#[async_trait]
impl ShoutApi for SessionHandle {
    async fn update_location(&self, lat: f64, lon: f64) -> Result<LocationUpdate, ShoutError> {
        self.request(|reply| Command::UpdateLocation { lat, lon, reply })
            .await
    }

    async fn locate(&self) -> Result<LocationUpdate, ShoutError> {
        self.request(|reply| Command::Locate { reply }).await
    }

    async fn shout(&self, content: Option<String>) -> Result<ShoutReceipt, ShoutError> {
        self.request(|reply| Command::Shout { content, reply }).await
    }

    async fn select_message(&self, text: String) -> Result<(), ShoutError> {
        self.request(|reply| Command::SelectMessage { text, reply })
            .await
    }

    fn view(&self) -> ViewModel {
        self.view.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<ViewModel> {
        self.view.clone()
    }
}
