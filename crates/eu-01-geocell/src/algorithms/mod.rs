//! # Algorithms Module
//!
//! Geohash encoding at the system-wide cell precision.

pub mod geohash;

pub use geohash::{decode_bounds, encode, encode_coordinate};
