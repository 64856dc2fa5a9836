//! # Adapters
//!
//! Port implementations used by the local node.

pub mod location;

pub use location::{FixedLocationProvider, WanderingLocationProvider};
