//! # Shared Bus - In-Memory Presence Store
//!
//! A process-local implementation of the `PresenceStore` contract. Every
//! client in a process (the local user and any simulated peers) shares one
//! instance.
//!
//! ## Fan-out
//!
//! ```text
//! ┌──────────────┐                     ┌──────────────┐
//! │   Client A   │                     │   Client B   │
//! │              │    put_field()      │  (cell wydm) │
//! │              │ ──────┐             │              │
//! └──────────────┘       │             └──────────────┘
//!                        ▼                     ↑
//!                  ┌──────────────┐            │ full snapshot
//!                  │  Documents   │ ───────────┘ of cell wydm
//!                  │  + cell subs │
//!                  └──────────────┘
//! ```
//!
//! A write touching a document notifies every subscription scoped to the
//! document's old or new cell with the complete current record set of that
//! cell. Snapshots for one subscription are delivered in write order.
//!
//! ## Testing
//!
//! `FaultInjector` makes the next N writes, reads or subscribes fail and can
//! sever live subscriptions, so error paths can be driven deterministically.

pub mod faults;
pub mod store;
pub mod subscriber;

pub use faults::FaultInjector;
pub use store::InMemoryPresenceStore;
pub use subscriber::SubscriberRegistry;
