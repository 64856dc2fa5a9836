//! # Neighbor Projection

use crate::domain::{NeighborEntry, NeighborSet, RenderPosition};
use rand::Rng;
use shared_types::{PresenceRecord, UserId};

/// Every user in `records` except `exclude`, each with a fresh random
/// position. Message presence is irrelevant.
pub fn project_neighbors<R: Rng + ?Sized>(
    records: &[PresenceRecord],
    exclude: &UserId,
    rng: &mut R,
) -> NeighborSet {
    records
        .iter()
        .filter(|record| &record.user_id != exclude)
        .map(|record| {
            (
                record.user_id.clone(),
                NeighborEntry {
                    display_name: record.display_name().to_string(),
                    avatar: record.profile.avatar,
                    position: RenderPosition::for_neighbor(rng),
                },
            )
        })
        .collect()
}
