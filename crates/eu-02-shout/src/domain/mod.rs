//! # Domain Module
//!
//! Value types, the view model, the debounce state machine and errors.

pub mod debounce;
pub mod errors;
pub mod value_objects;
pub mod view_model;

pub use debounce::*;
pub use errors::*;
pub use value_objects::*;
pub use view_model::*;
