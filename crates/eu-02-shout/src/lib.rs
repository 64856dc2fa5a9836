//! # EU-02: Shout Subsystem
//!
//! Proximity-scoped ephemeral shouts. A user's position is bucketed into a
//! geohash cell; a shout is a short message written to the user's presence
//! record that lives for [`SHOUT_TTL`](shared_types::SHOUT_TTL) and is seen
//! by everyone subscribed to the same cell.
//!
//! ## Architecture
//!
//! - **Domain**: View model, value objects, debounce state machine, errors
//! - **Algorithms**: Snapshot and neighbor projection, view merge
//! - **Ports**: Inbound (`ShoutApi`) and Outbound (`PresenceStore`,
//!   `LocationProvider`, `TimeSource`)
//! - **Service**: Presence publisher, cell subscription manager, neighbor
//!   resolver, state aggregator and the session actor driving them
//!
//! ## Concurrency Model
//!
//! One session actor per user. Handle calls, snapshot notifications and
//! timer expiries all enter a single queue and are handled sequentially.
//! The merged [`ViewModel`] is published through a `watch` channel after
//! every step.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let handle = SessionBuilder::new(identity, store).spawn();
//! handle.update_location(37.50, 127.03).await?;
//! handle.shout(Some("Hello".into())).await?;
//! let view = handle.view();
//! handle.shutdown().await;
//! ```

#![warn(missing_docs)]

pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::ShoutConfig;
pub use domain::*;
pub use ports::inbound::ShoutApi;
pub use ports::outbound::{LocationProvider, PresenceStore, SystemTimeSource, TimeSource};
pub use service::{SessionBuilder, SessionHandle};
