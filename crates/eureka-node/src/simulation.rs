//! # Local Simulation
//!
//! Spawns one shout session per simulated user against a shared in-memory
//! store. Every peer wanders around the configured centre and shouts a
//! random preset now and then. The first peer is the observer: its view
//! changes are logged.

use crate::adapters::WanderingLocationProvider;
use crate::config::NodeConfig;
use anyhow::{Context, Result};
use eu_02_shout::{
    Position, SessionBuilder, SessionHandle, ShoutApi, ShoutError, ViewModel, PRESET_MESSAGES,
};
use rand::seq::SliceRandom;
use rand::Rng;
use shared_bus::InMemoryPresenceStore;
use shared_types::{AvatarId, Identity, UserId, UserProfile};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// One simulated user.
pub struct Peer {
    /// Account identity.
    pub identity: Identity,
    /// Running session.
    pub session: SessionHandle,
}

/// A running simulation.
pub struct Simulation {
    store: Arc<InMemoryPresenceStore>,
    peers: Vec<Peer>,
    tasks: Vec<JoinHandle<()>>,
}

impl Simulation {
    /// Spawn every peer session and its shout loop.
    pub async fn start(config: &NodeConfig) -> Result<Self> {
        let store = Arc::new(InMemoryPresenceStore::new());
        let center = Position::new(config.center_lat, config.center_lon);
        let mut peers = Vec::with_capacity(config.peers);
        let mut tasks = Vec::new();

        for index in 0..config.peers {
            let identity = make_identity(index);
            let provider = Arc::new(
                WanderingLocationProvider::new(center, config.wander_deg).with_failure_rate(0.05),
            );
            let session = SessionBuilder::new(identity.clone(), store.clone())
                .with_config(config.shout.clone())
                .with_location_provider(provider)
                .spawn();

            // Make sure everyone has a cell before the first shout.
            locate_with_retry(&session)
                .await
                .with_context(|| format!("peer {} never got a location fix", identity.user_id))?;

            info!(
                user = %identity.user_id,
                name = %identity.profile.display_name,
                cell = ?session.view().cell.map(|c| c.to_string()),
                "Peer joined"
            );

            tasks.push(spawn_shout_loop(session.clone(), config.shout_interval()));
            peers.push(Peer { identity, session });
        }

        if let Some(observer) = peers.first() {
            tasks.push(spawn_view_logger(
                observer.identity.profile.display_name.clone(),
                observer.session.clone(),
            ));
        }

        Ok(Self {
            store,
            peers,
            tasks,
        })
    }

    /// Simulated users.
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Shared store.
    pub fn store(&self) -> &Arc<InMemoryPresenceStore> {
        &self.store
    }

    /// Stop shout loops, then shut every session down.
    ///
    /// Returns the observer's last view.
    pub async fn shutdown(self) -> Option<ViewModel> {
        for task in &self.tasks {
            task.abort();
        }
        let last_view = self.peers.first().map(|p| p.session.view());
        for peer in &self.peers {
            peer.session.shutdown().await;
        }
        info!(peers = self.peers.len(), "Simulation stopped");
        last_view
    }
}

/// Fresh identity for peer `index`; the avatar cycles through the icon set.
pub fn make_identity(index: usize) -> Identity {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    Identity::new(
        UserId::new(format!("peer{}-{}@eureka.local", index, &tag[..8])),
        UserProfile::new(format!("Peer {}", index + 1), AvatarId::round_robin(index)),
    )
}

async fn locate_with_retry(session: &SessionHandle) -> Result<(), ShoutError> {
    let mut last_error = ShoutError::NoLocationProvider;
    for _ in 0..5 {
        match session.locate().await {
            Ok(_) => return Ok(()),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

fn spawn_shout_loop(session: SessionHandle, mean: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let (delay, text) = {
                let mut rng = rand::thread_rng();
                let jitter = rng.gen_range(0.5..1.5);
                let text = PRESET_MESSAGES
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(PRESET_MESSAGES[0]);
                (mean.mul_f64(jitter), text.to_string())
            };
            tokio::time::sleep(delay).await;

            match session.shout(Some(text)).await {
                Ok(receipt) => debug!(content = %receipt.content, "Peer shouted"),
                Err(ShoutError::SessionClosed) => return,
                Err(e) => warn!(error = %e, "Peer shout failed"),
            }
        }
    })
}

fn spawn_view_logger(name: String, session: SessionHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut views = WatchStream::new(session.watch());
        let mut last_messages = None;
        while let Some(view) = views.next().await {
            let messages = view.messages();
            if last_messages.as_ref() == Some(&messages) {
                continue;
            }
            info!(
                observer = %name,
                cell = ?view.cell.as_ref().map(|c| c.to_string()),
                subscription = %view.subscription,
                messages = ?messages.values().collect::<Vec<_>>(),
                neighbors = view.neighbor_count(),
                "View changed"
            );
            last_messages = Some(messages);
        }
    })
}
