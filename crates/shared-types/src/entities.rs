//! # Presence Entities
//!
//! Defines the per-user presence document and the identity it carries.
//!
//! ## Clusters
//!
//! - **Identity**: `UserId`, `AvatarId`, `UserProfile`
//! - **Space**: `CellId`
//! - **Presence**: `PresenceRecord`, `ShoutMessage`, `PresenceField`, `FieldKind`
//! - **Time**: `Timestamp`, `SHOUT_TTL`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lifetime of a shout.
///
/// Writers schedule the deletion of their `message` field this long after
/// `created_at`; readers treat any message older than this as absent even if
/// the deletion has not landed yet.
pub const SHOUT_TTL: Duration = Duration::from_secs(6);

// =============================================================================
// IDENTITY
// =============================================================================

/// Stable user identifier (the account email).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap an account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the five avatar icons a user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AvatarId {
    /// Icon 0.
    #[default]
    Brown,
    /// Icon 1.
    Yellow,
    /// Icon 2.
    Pink,
    /// Icon 3.
    Blue,
    /// Icon 4.
    Purple,
}

impl AvatarId {
    /// Every avatar, in icon-set order.
    pub const ALL: [AvatarId; 5] = [
        AvatarId::Brown,
        AvatarId::Yellow,
        AvatarId::Pink,
        AvatarId::Blue,
        AvatarId::Purple,
    ];

    /// Map any index onto the icon set, wrapping around.
    pub fn round_robin(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Position of this avatar in the icon set (0-4).
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Account profile, created outside this system and read-only to it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Nickname shown under the avatar.
    pub display_name: String,
    /// Chosen avatar icon.
    pub avatar: AvatarId,
}

impl UserProfile {
    /// Create a profile.
    pub fn new(display_name: impl Into<String>, avatar: AvatarId) -> Self {
        Self {
            display_name: display_name.into(),
            avatar,
        }
    }
}

/// An authenticated user as handed to the core by the account layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable id.
    pub user_id: UserId,
    /// Display data.
    pub profile: UserProfile,
}

impl Identity {
    /// Create an identity.
    pub fn new(user_id: UserId, profile: UserProfile) -> Self {
        Self { user_id, profile }
    }
}

// =============================================================================
// SPACE
// =============================================================================

/// Coarse spatial key. Users with equal cell ids are "nearby".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(String);

impl CellId {
    /// Wrap an already-encoded cell key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TIME
// =============================================================================

/// Milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create from milliseconds since the epoch.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `duration`, saturating.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(ms))
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

/// The active message of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoutMessage {
    /// Text of the shout.
    pub content: String,
    /// When the shout was written.
    pub created_at: Timestamp,
}

impl ShoutMessage {
    /// Create a message.
    pub fn new(content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            content: content.into(),
            created_at,
        }
    }

    /// When this message stops being visible.
    pub fn expires_at(&self) -> Timestamp {
        self.created_at.saturating_add(SHOUT_TTL)
    }

    /// Whether the message is still within its TTL at `now`.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        now < self.expires_at()
    }
}

/// One user's presence document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Document key.
    pub user_id: UserId,
    /// Display data copied from the account profile.
    pub profile: UserProfile,
    /// Current cell; `None` until the first location fix lands.
    pub cell_id: Option<CellId>,
    /// Active shout, present only within the TTL window.
    pub message: Option<ShoutMessage>,
}

impl PresenceRecord {
    /// An empty record for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            profile: UserProfile::default(),
            cell_id: None,
            message: None,
        }
    }

    /// Name to render, falling back to the user id for profile-less records.
    pub fn display_name(&self) -> &str {
        if self.profile.display_name.is_empty() {
            self.user_id.as_str()
        } else {
            &self.profile.display_name
        }
    }

    /// The message if it is still live at `now`.
    ///
    /// Expired messages are ignored here whether or not their deletion has
    /// reached the store yet.
    pub fn live_message(&self, now: Timestamp) -> Option<&ShoutMessage> {
        self.message
            .as_ref()
            .filter(|m| m.is_live_at(now) && !m.content.is_empty())
    }

    /// Apply a field write.
    pub fn apply(&mut self, field: PresenceField) {
        match field {
            PresenceField::Cell(cell) => self.cell_id = Some(cell),
            PresenceField::Message(message) => self.message = Some(message),
            PresenceField::Profile(profile) => self.profile = profile,
        }
    }

    /// Remove a field. Removing an absent field changes nothing.
    ///
    /// Returns whether the record changed.
    pub fn remove(&mut self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Cell => self.cell_id.take().is_some(),
            FieldKind::Message => self.message.take().is_some(),
            FieldKind::Profile => {
                let changed = self.profile != UserProfile::default();
                self.profile = UserProfile::default();
                changed
            }
        }
    }
}

/// A single field write on a presence document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceField {
    /// Set the current cell.
    Cell(CellId),
    /// Set the active message.
    Message(ShoutMessage),
    /// Set the display profile.
    Profile(UserProfile),
}

impl PresenceField {
    /// Which field this write targets.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Cell(_) => FieldKind::Cell,
            Self::Message(_) => FieldKind::Message,
            Self::Profile(_) => FieldKind::Profile,
        }
    }
}

/// Field selector for deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// `cellId`.
    Cell,
    /// `message`.
    Message,
    /// Display name and avatar.
    Profile,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell => write!(f, "cellId"),
            Self::Message => write!(f, "message"),
            Self::Profile => write!(f, "profile"),
        }
    }
}
