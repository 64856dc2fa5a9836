//! # Shared Types Crate
//!
//! This crate contains the presence entities and the `PresenceStore`
//! contract used by every other crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the presence record shape and the shout
//!   TTL are defined here and nowhere else.
//! - **Owner-only writes**: a presence record is written only by the user it
//!   belongs to; everybody else reads it through a snapshot subscription or
//!   a one-shot query.
//! - **Absence means expired**: a record without a `message` is the
//!   canonical expired state. There are no empty-content tombstones.

pub mod entities;
pub mod errors;
pub mod store;

pub use entities::*;
pub use errors::*;
pub use store::*;
