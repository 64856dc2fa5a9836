//! # EU-01 GeoCell
//!
//! Maps a latitude/longitude pair to a coarse spatial key.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (pure domain + algorithms, no I/O)
//!
//! ## Purpose
//!
//! Two users are "nearby" exactly when their cell ids are equal. The key is
//! a geohash truncated to [`CELL_PRECISION`] characters, which at four
//! characters is a cell of roughly 39 km x 19.5 km at the equator.
//!
//! Shared prefix implies spatial adjacency, not a distance bound: two points
//! a few metres apart on either side of a cell edge get different ids. That
//! is accepted; "same cell" is the clustering granularity.
//!
//! ## Module Structure
//!
//! ```text
//! eu-01-geocell/
//! ├── domain/          # Coordinate, CellBounds, GeoCellError
//! └── algorithms/      # Geohash encode/decode
//! ```
//!
//! ## Example
//!
//! ```rust
//! use eu_01_geocell::encode;
//!
//! let cell = encode(37.50, 127.03).unwrap();
//! assert_eq!(cell.as_str(), "wydm");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;

pub use algorithms::{decode_bounds, encode, encode_coordinate};
pub use domain::{CellBounds, Coordinate, GeoCellError, CELL_PRECISION};
