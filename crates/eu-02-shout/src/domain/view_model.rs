//! # View Model
//!
//! The merged, render-ready state published to the presentation layer.

use super::value_objects::{RenderPosition, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use shared_types::{AvatarId, CellId, UserId};
use std::collections::BTreeMap;

/// What an entry shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A speech bubble with the user's live shout.
    Message {
        /// Shout text.
        content: String,
    },
    /// A silent avatar revealed by a shout.
    Neighbor,
}

/// One rendered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    /// Name under the avatar.
    pub display_name: String,
    /// Avatar image.
    pub avatar: AvatarId,
    /// Placement in viewport units.
    pub position: RenderPosition,
    /// Bubble or bare avatar.
    pub kind: EntryKind,
}

impl ViewEntry {
    /// Shout text if this is a message entry.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Message { content } => Some(content),
            EntryKind::Neighbor => None,
        }
    }
}

/// Snapshot of everything the UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewModel {
    /// Cell of the local user, `None` before the first fix.
    pub cell: Option<CellId>,
    /// Realtime subscription health.
    pub subscription: SubscriptionStatus,
    /// Message entries first, then neighbors not already shown.
    pub entries: BTreeMap<UserId, ViewEntry>,
    /// Ripple animations pending.
    pub ripples: usize,
    /// Text the next default shout will use.
    pub selected_message: String,
}

impl ViewModel {
    /// Entry for `user`, if rendered.
    pub fn entry(&self, user: &UserId) -> Option<&ViewEntry> {
        self.entries.get(user)
    }

    /// Number of message bubbles.
    pub fn message_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e.kind, EntryKind::Message { .. }))
            .count()
    }

    /// Number of bare neighbor avatars.
    pub fn neighbor_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.kind == EntryKind::Neighbor)
            .count()
    }

    /// `user -> content` for every message entry.
    pub fn messages(&self) -> BTreeMap<UserId, String> {
        self.entries
            .iter()
            .filter_map(|(user, e)| e.content().map(|c| (user.clone(), c.to_string())))
            .collect()
    }
}
