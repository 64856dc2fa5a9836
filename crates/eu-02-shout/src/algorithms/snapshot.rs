//! # Snapshot Projection
//!
//! Turns one full cell snapshot into the visible message map. Every snapshot
//! is projected from scratch; nothing from a previous snapshot survives.

use crate::domain::{MessageEntry, MessageMap, RenderPosition};
use rand::Rng;
use shared_types::{PresenceRecord, Timestamp, UserId};

/// Project a snapshot into `user -> message entry`.
///
/// Drops the local user, records without a message and messages past
/// their TTL at `now`.
pub fn project_messages<R: Rng + ?Sized>(
    records: &[PresenceRecord],
    local_user: &UserId,
    now: Timestamp,
    rng: &mut R,
) -> MessageMap {
    records
        .iter()
        .filter(|record| &record.user_id != local_user)
        .filter_map(|record| {
            let message = record.live_message(now)?;
            Some((
                record.user_id.clone(),
                MessageEntry {
                    content: message.content.clone(),
                    display_name: record.display_name().to_string(),
                    avatar: record.profile.avatar,
                    position: RenderPosition::for_message(rng),
                },
            ))
        })
        .collect()
}
