//! # Service Layer
//!
//! Components of a shout session and the actor that drives them.

pub mod aggregator;
pub mod events;
pub mod publisher;
pub mod resolver;
pub mod session;
pub mod subscription;

pub use aggregator::{EphemeralStateAggregator, NeighborMerge};
pub use events::{Command, SessionEvent};
pub use publisher::PresencePublisher;
pub use resolver::NeighborResolver;
pub use session::{SessionBuilder, SessionHandle, ShoutSession};
pub use subscription::CellSubscriptionManager;
