//! # Session Events
//!
//! Everything the session reacts to arrives as one of these, on one queue,
//! and is handled to completion before the next.

use crate::domain::{LocationUpdate, NeighborSet, ShoutError, ShoutReceipt, TimerToken};
use shared_types::{CellId, PresenceRecord, StoreError, Timestamp};
use tokio::sync::oneshot;

/// Reply channel for a command.
pub type Reply<T> = oneshot::Sender<Result<T, ShoutError>>;

/// Requests from session handles.
#[derive(Debug)]
pub enum Command {
    /// Apply a raw coordinate.
    UpdateLocation {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
        /// Outcome.
        reply: Reply<LocationUpdate>,
    },
    /// Ask the location provider for a fix.
    Locate {
        /// Outcome.
        reply: Reply<LocationUpdate>,
    },
    /// Publish a message; `None` uses the selected one.
    Shout {
        /// Explicit text.
        content: Option<String>,
        /// Outcome.
        reply: Reply<ShoutReceipt>,
    },
    /// Change the default shout text.
    SelectMessage {
        /// New text.
        text: String,
        /// Outcome.
        reply: Reply<()>,
    },
    /// Tear everything down and stop.
    Shutdown {
        /// Signalled once teardown is complete.
        reply: oneshot::Sender<()>,
    },
}

/// Internal events from timers, forwarders and background fetches.
#[derive(Debug)]
pub enum SessionEvent {
    /// A full snapshot from the subscription tagged `generation`.
    Snapshot {
        /// Subscription generation the snapshot belongs to.
        generation: u64,
        /// Every record in the cell.
        records: Vec<PresenceRecord>,
    },
    /// The subscription tagged `generation` ended with an error.
    SubscriptionLost {
        /// Subscription generation.
        generation: u64,
        /// Transport error.
        error: StoreError,
    },
    /// The TTL of the message written at `created_at` elapsed.
    ShoutExpired {
        /// Creation timestamp of the message to delete.
        created_at: Timestamp,
        /// Deletion attempt, starting at 1.
        attempt: u32,
    },
    /// A message in the last accepted snapshot reached its TTL.
    MessagesExpiring,
    /// A neighbor fetch for `cell` finished.
    NeighborsResolved {
        /// Cell that was queried.
        cell: CellId,
        /// Resolved neighbors or the read error.
        result: Result<NeighborSet, ShoutError>,
    },
    /// The debounce window `token` elapsed.
    DebounceElapsed {
        /// Window that elapsed.
        token: TimerToken,
    },
    /// Time to poll the location provider.
    LocationTick,
}
