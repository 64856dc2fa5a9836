//! # Eureka Test Suite
//!
//! Cross-crate scenarios: the encoder, the shout session and the in-memory
//! presence store wired together the way a client runs them.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── cells.rs       # encoder clustering against live subscriptions
//!     ├── scenarios.rs   # end-to-end shout / TTL / cell change flows
//!     └── views.rs       # neighbor exclusion and view merge
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p eureka-tests
//! cargo test -p eureka-tests integration::scenarios::
//! ```

pub mod integration;
