//! Cross-crate integration tests.

pub mod cells;
pub mod scenarios;
pub mod views;

#[cfg(test)]
pub(crate) mod fixtures {
    use eu_02_shout::testing::TokioTimeSource;
    use eu_02_shout::{SessionBuilder, SessionHandle, ShoutConfig};
    use shared_bus::InMemoryPresenceStore;
    use shared_types::{AvatarId, Identity, UserId, UserProfile};
    use std::sync::Arc;
    use std::time::Duration;

    /// Inside cell "wydm".
    pub const WYDM: (f64, f64) = (37.50, 127.03);
    /// Inside cell "wydn".
    pub const WYDN: (f64, f64) = (37.70, 126.80);

    pub fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    pub fn identity(id: &str, avatar: usize) -> Identity {
        Identity::new(
            user(id),
            UserProfile::new(id.split('@').next().unwrap_or(id), AvatarId::round_robin(avatar)),
        )
    }

    pub fn session(store: &Arc<InMemoryPresenceStore>, id: &str, avatar: usize) -> SessionHandle {
        SessionBuilder::new(identity(id, avatar), store.clone())
            .with_config(ShoutConfig::for_testing())
            .with_time_source(Arc::new(TokioTimeSource::new(10_000)))
            .spawn()
    }

    /// Let spawned forwarders and the actor drain their queues.
    pub async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
