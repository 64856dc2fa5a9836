//! # View Merge
//!
//! Message entries are placed first. A neighbor is added only if it is not
//! already shown as a message, so nobody is rendered twice.

use crate::domain::{EntryKind, MessageMap, NeighborSet, ViewEntry};
use shared_types::UserId;
use std::collections::BTreeMap;

/// Merge messages and neighbors into render entries.
pub fn merge_entries(messages: &MessageMap, neighbors: &NeighborSet) -> BTreeMap<UserId, ViewEntry> {
    let mut entries: BTreeMap<UserId, ViewEntry> = messages
        .iter()
        .map(|(user, m)| {
            (
                user.clone(),
                ViewEntry {
                    display_name: m.display_name.clone(),
                    avatar: m.avatar,
                    position: m.position,
                    kind: EntryKind::Message {
                        content: m.content.clone(),
                    },
                },
            )
        })
        .collect();

    for (user, n) in neighbors {
        entries.entry(user.clone()).or_insert_with(|| ViewEntry {
            display_name: n.display_name.clone(),
            avatar: n.avatar,
            position: n.position,
            kind: EntryKind::Neighbor,
        });
    }

    entries
}
