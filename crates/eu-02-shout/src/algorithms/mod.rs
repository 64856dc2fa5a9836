//! # Algorithms Module
//!
//! Pure projections from store records to render state.

pub mod merge;
pub mod neighbors;
pub mod snapshot;

pub use merge::merge_entries;
pub use neighbors::project_neighbors;
pub use snapshot::project_messages;
