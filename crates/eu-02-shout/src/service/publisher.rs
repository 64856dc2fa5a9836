//! # Presence Publisher
//!
//! Sole writer of the local user's presence record. Owns the current cell,
//! the active message and the neighbor-fetch gate.

use crate::domain::{ExpiryOutcome, LocationUpdate, ShoutError, ShoutReceipt};
use crate::ports::{PresenceStore, TimeSource};
use eu_01_geocell::encode;
use eureka_telemetry::{
    metric_inc, LOCATION_UPDATES, SHOUTS_EXPIRED, SHOUTS_PUBLISHED, STALE_EXPIRIES_SKIPPED,
    STORE_ERRORS,
};
use shared_types::{
    CellId, FieldKind, Identity, PresenceField, ShoutMessage, Timestamp, SHOUT_TTL,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Writes the local user's cell, profile and message.
pub struct PresencePublisher {
    identity: Identity,
    store: Arc<dyn PresenceStore>,
    time: Arc<dyn TimeSource>,
    max_message_chars: usize,
    current_cell: Option<CellId>,
    profile_written: bool,
    active: Option<ShoutMessage>,
    last_created_at: Option<Timestamp>,
    neighbor_fetch_in_flight: bool,
}

impl PresencePublisher {
    /// Create a publisher with no location fix.
    pub fn new(
        identity: Identity,
        store: Arc<dyn PresenceStore>,
        time: Arc<dyn TimeSource>,
        max_message_chars: usize,
    ) -> Self {
        Self {
            identity,
            store,
            time,
            max_message_chars,
            current_cell: None,
            profile_written: false,
            active: None,
            last_created_at: None,
            neighbor_fetch_in_flight: false,
        }
    }

    /// The local user.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Last successfully written cell.
    pub fn current_cell(&self) -> Option<&CellId> {
        self.current_cell.as_ref()
    }

    /// Message written by the last successful shout, until it is deleted.
    pub fn active_message(&self) -> Option<&ShoutMessage> {
        self.active.as_ref()
    }

    /// Encode `(lat, lon)` and write the cell if it changed.
    ///
    /// The first fix also writes the profile. On any failure the previous
    /// cell is kept.
    pub async fn update_location(
        &mut self,
        lat: f64,
        lon: f64,
    ) -> Result<LocationUpdate, ShoutError> {
        let cell = match encode(lat, lon) {
            Ok(cell) => cell,
            Err(_) => {
                metric_inc!(LOCATION_UPDATES, &["rejected"]);
                return Err(ShoutError::InvalidCoordinate { lat, lon });
            }
        };

        if self.current_cell.as_ref() == Some(&cell) {
            metric_inc!(LOCATION_UPDATES, &["unchanged"]);
            return Ok(LocationUpdate::Unchanged(cell));
        }

        if !self.profile_written {
            let profile = PresenceField::Profile(self.identity.profile.clone());
            self.put(profile).await.inspect_err(|_| {
                metric_inc!(LOCATION_UPDATES, &["failed"]);
            })?;
            self.profile_written = true;
        }

        self.put(PresenceField::Cell(cell.clone()))
            .await
            .inspect_err(|_| {
                metric_inc!(LOCATION_UPDATES, &["failed"]);
            })?;

        metric_inc!(LOCATION_UPDATES, &["moved"]);
        let from = self.current_cell.replace(cell.clone());
        debug!(user = %self.identity.user_id, from = ?from, to = %cell, "Cell written");
        Ok(LocationUpdate::Moved { from, to: cell })
    }

    /// Trim and check shout text.
    pub fn validate(&self, content: &str) -> Result<String, ShoutError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ShoutError::EmptyMessage);
        }
        let len = trimmed.chars().count();
        if len > self.max_message_chars {
            return Err(ShoutError::MessageTooLong {
                len,
                max: self.max_message_chars,
            });
        }
        Ok(trimmed.to_string())
    }

    /// Write a message with a fresh `created_at`.
    ///
    /// The caller schedules the TTL deletion only after this returns `Ok`.
    pub async fn shout(&mut self, content: &str) -> Result<ShoutReceipt, ShoutError> {
        let content = self.validate(content)?;
        if self.current_cell.is_none() {
            return Err(ShoutError::NoLocationFix);
        }

        let created_at = self.next_created_at();
        let message = ShoutMessage::new(content.clone(), created_at);
        self.put(PresenceField::Message(message.clone())).await?;

        self.last_created_at = Some(created_at);
        self.active = Some(message);
        metric_inc!(SHOUTS_PUBLISHED);

        Ok(ShoutReceipt {
            content,
            created_at,
            ttl: SHOUT_TTL,
        })
    }

    /// Delete the message written at `created_at`, unless a newer shout
    /// replaced it.
    pub async fn expire(&mut self, created_at: Timestamp) -> Result<ExpiryOutcome, ShoutError> {
        match &self.active {
            Some(message) if message.created_at == created_at => {}
            _ => {
                metric_inc!(STALE_EXPIRIES_SKIPPED);
                debug!(
                    user = %self.identity.user_id,
                    created_at = created_at.as_millis(),
                    "Stale TTL deletion skipped"
                );
                return Ok(ExpiryOutcome::Superseded);
            }
        }

        self.delete_message().await?;
        self.active = None;
        metric_inc!(SHOUTS_EXPIRED);
        Ok(ExpiryOutcome::Deleted)
    }

    /// Delete the active message early. Returns whether one was deleted.
    pub async fn retract(&mut self) -> Result<bool, ShoutError> {
        if self.active.is_none() {
            return Ok(false);
        }
        self.delete_message().await?;
        self.active = None;
        info!(user = %self.identity.user_id, "Active message retracted");
        Ok(true)
    }

    /// Claim the neighbor-fetch slot.
    ///
    /// Only succeeds when no neighbors are shown and no fetch is running.
    pub fn begin_neighbor_fetch(&mut self, neighbors_empty: bool) -> bool {
        if !neighbors_empty || self.neighbor_fetch_in_flight {
            return false;
        }
        self.neighbor_fetch_in_flight = true;
        true
    }

    /// Release the neighbor-fetch slot.
    pub fn finish_neighbor_fetch(&mut self) {
        self.neighbor_fetch_in_flight = false;
    }

    /// `now`, bumped past the previous shout so ordering survives clock skew.
    fn next_created_at(&self) -> Timestamp {
        let now = self.time.now();
        match self.last_created_at {
            Some(last) if now <= last => Timestamp::from_millis(last.as_millis() + 1),
            _ => now,
        }
    }

    async fn put(&self, field: PresenceField) -> Result<(), ShoutError> {
        self.store
            .put_field(&self.identity.user_id, field)
            .await
            .map_err(|e| {
                metric_inc!(STORE_ERRORS, &[e.operation()]);
                ShoutError::from(e)
            })
    }

    async fn delete_message(&self) -> Result<(), ShoutError> {
        self.store
            .delete_field(&self.identity.user_id, FieldKind::Message)
            .await
            .map_err(|e| {
                metric_inc!(STORE_ERRORS, &[e.operation()]);
                ShoutError::from(e)
            })
    }
}
