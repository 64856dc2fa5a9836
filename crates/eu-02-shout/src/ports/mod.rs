//! # Ports
//!
//! - **Inbound**: `ShoutApi`
//! - **Outbound**: `PresenceStore`, `LocationProvider`, `TimeSource`

pub mod inbound;
pub mod outbound;

pub use inbound::ShoutApi;
pub use outbound::{LocationProvider, PresenceStore, SystemTimeSource, TimeSource};
