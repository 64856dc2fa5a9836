//! # Domain Value Objects

use rand::Rng;
use serde::{Deserialize, Serialize};
use shared_types::{AvatarId, CellId, Timestamp, UserId};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Quick-pick shout texts offered by the picker.
pub const PRESET_MESSAGES: [&str; 4] = ["Hungry!", "JMT!", "Not tasty!", "Eureka!"];

/// Message shouted when the caller supplies none and nothing was picked.
pub const DEFAULT_MESSAGE: &str = "Eureka!";

/// A raw position as reported by a location provider. Not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Position {
    /// Create a position.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Where an entry is drawn, in viewport units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPosition {
    /// Horizontal offset in `vw`.
    pub left_vw: u8,
    /// Vertical offset in `vh`.
    pub top_vh: u8,
}

impl RenderPosition {
    /// Random slot for a message bubble: left 10..90 vw, top 0..70 vh.
    pub fn for_message<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            left_vw: rng.gen_range(10..90),
            top_vh: rng.gen_range(0..70),
        }
    }

    /// Random slot for a neighbor avatar: left 10..90 vw, top 15..70 vh.
    pub fn for_neighbor<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            left_vw: rng.gen_range(10..90),
            top_vh: rng.gen_range(15..70),
        }
    }
}

/// A live message as it will be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    /// Text of the shout.
    pub content: String,
    /// Author's display name.
    pub display_name: String,
    /// Author's avatar.
    pub avatar: AvatarId,
    /// Bubble position.
    pub position: RenderPosition,
}

/// A co-located user shown after a shout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborEntry {
    /// Neighbor's display name.
    pub display_name: String,
    /// Neighbor's avatar.
    pub avatar: AvatarId,
    /// Avatar position.
    pub position: RenderPosition,
}

/// Live messages in the subscribed cell, keyed by author.
pub type MessageMap = BTreeMap<UserId, MessageEntry>;

/// Users in the current cell, keyed by user.
pub type NeighborSet = BTreeMap<UserId, NeighborEntry>;

/// Outcome of a location update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationUpdate {
    /// Same cell as before. Nothing was written.
    Unchanged(CellId),
    /// The cell changed (or this was the first fix).
    Moved {
        /// Previous cell, `None` on the first fix.
        from: Option<CellId>,
        /// New cell.
        to: CellId,
    },
}

impl LocationUpdate {
    /// The cell the user is in after the update.
    pub fn cell(&self) -> &CellId {
        match self {
            Self::Unchanged(cell) => cell,
            Self::Moved { to, .. } => to,
        }
    }
}

/// Acknowledgement of a written shout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoutReceipt {
    /// Trimmed text that was written.
    pub content: String,
    /// Creation timestamp stored with the message.
    pub created_at: Timestamp,
    /// Delay until the message is deleted.
    pub ttl: Duration,
}

/// Result of a TTL deletion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// The message was deleted from the store.
    Deleted,
    /// A newer shout replaced the message; nothing was deleted.
    Superseded,
}

/// Health of the realtime cell subscription.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    /// No cell yet, or torn down.
    #[default]
    Unsubscribed,
    /// Receiving snapshots for the cell.
    Live(CellId),
    /// Resubscription failed. The message map is no longer updated.
    Degraded(CellId),
}

impl SubscriptionStatus {
    /// Whether snapshots are flowing.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// Whether the subscription gave up.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsubscribed => write!(f, "unsubscribed"),
            Self::Live(cell) => write!(f, "live({})", cell),
            Self::Degraded(cell) => write!(f, "degraded({})", cell),
        }
    }
}
