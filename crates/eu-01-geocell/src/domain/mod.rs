//! # Domain Module
//!
//! Value types and errors of the encoder.

pub mod errors;
pub mod value_objects;

pub use errors::*;
pub use value_objects::*;
