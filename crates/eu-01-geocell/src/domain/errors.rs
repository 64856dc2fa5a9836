//! # Domain Errors

use thiserror::Error;

/// Encoder error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoCellError {
    /// Latitude outside [-90, 90], longitude outside [-180, 180], or NaN.
    #[error("Invalid coordinate: ({lat}, {lon})")]
    InvalidCoordinate {
        /// Rejected latitude
        lat: f64,
        /// Rejected longitude
        lon: f64,
    },

    /// A cell key contains a character outside the geohash alphabet or has
    /// the wrong length.
    #[error("Invalid cell id: {0}")]
    InvalidCell(String),
}
