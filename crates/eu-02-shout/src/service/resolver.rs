//! # Neighbor Resolver
//!
//! One-shot "who is around me" query. Independent of message presence.

use crate::algorithms::project_neighbors;
use crate::domain::{NeighborSet, ShoutError};
use crate::ports::PresenceStore;
use eureka_telemetry::{metric_inc, NEIGHBOR_FETCHES, STORE_ERRORS};
use shared_types::{CellId, UserId};
use std::sync::Arc;
use tracing::debug;

/// Resolves the users sharing a cell.
#[derive(Clone)]
pub struct NeighborResolver {
    store: Arc<dyn PresenceStore>,
}

impl NeighborResolver {
    /// Create a resolver over `store`.
    pub fn new(store: Arc<dyn PresenceStore>) -> Self {
        Self { store }
    }

    /// Every user in `cell` except `exclude`, each at a fresh random
    /// position. Positions are not stable across fetches.
    pub async fn fetch_neighbors(
        &self,
        cell: &CellId,
        exclude: &UserId,
    ) -> Result<NeighborSet, ShoutError> {
        metric_inc!(NEIGHBOR_FETCHES);
        let records = self.store.query(cell).await.map_err(|e| {
            metric_inc!(STORE_ERRORS, &[e.operation()]);
            ShoutError::from(e)
        })?;

        let mut rng = rand::thread_rng();
        let neighbors = project_neighbors(&records, exclude, &mut rng);
        debug!(cell = %cell, count = neighbors.len(), "Neighbors resolved");
        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::InMemoryPresenceStore;
    use shared_types::PresenceRecord;

    fn resident(user: &str, cell: &str) -> PresenceRecord {
        let mut record = PresenceRecord::new(UserId::new(user));
        record.cell_id = Some(CellId::new(cell));
        record
    }

    #[tokio::test]
    async fn test_fetch_excludes_self_and_other_cells() {
        let store = Arc::new(InMemoryPresenceStore::new());
        store.insert_record(resident("a@x", "wydm"));
        store.insert_record(resident("b@x", "wydm"));
        store.insert_record(resident("c@x", "wydn"));
        let resolver = NeighborResolver::new(store);

        let neighbors = resolver
            .fetch_neighbors(&CellId::new("wydm"), &UserId::new("a@x"))
            .await
            .unwrap();

        assert_eq!(
            neighbors.keys().cloned().collect::<Vec<_>>(),
            vec![UserId::new("b@x")]
        );
    }

    #[tokio::test]
    async fn test_fetch_surfaces_read_failure() {
        let store = Arc::new(InMemoryPresenceStore::new());
        store.faults().fail_next_reads(1);
        let resolver = NeighborResolver::new(store);

        let result = resolver
            .fetch_neighbors(&CellId::new("wydm"), &UserId::new("a@x"))
            .await;

        assert!(matches!(result, Err(ShoutError::StoreReadFailed(_))));
    }
}
