//! # Eureka Node
//!
//! Local host for shout sessions.
//!
//! ## Modular Structure
//!
//! - `config` - Simulation parameters from the environment
//! - `adapters` - Location provider implementations
//! - `simulation` - Peer sessions, shout loops and the observer log
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging + metrics)
//! 2. Load configuration from the environment
//! 3. Spawn one session per peer and wait for their first fix
//! 4. Run until Ctrl+C or `EUREKA_RUN_SECS`
//! 5. Shut every session down

pub mod adapters;
pub mod config;
pub mod simulation;

pub use config::{ConfigError, NodeConfig};
pub use simulation::{Peer, Simulation};
