//! # Domain Value Objects

use super::errors::GeoCellError;
use serde::{Deserialize, Serialize};

/// Number of geohash characters in a cell id. Fixed system-wide.
pub const CELL_PRECISION: usize = 4;

/// A validated WGS84 position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Validate and wrap a latitude/longitude pair.
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoCellError> {
        let lat_ok = (-90.0..=90.0).contains(&lat);
        let lon_ok = (-180.0..=180.0).contains(&lon);
        if !lat_ok || !lon_ok {
            return Err(GeoCellError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// The rectangle covered by one cell id.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    /// Southern edge (inclusive).
    pub min_lat: f64,
    /// Northern edge (exclusive, except at the pole).
    pub max_lat: f64,
    /// Western edge (inclusive).
    pub min_lon: f64,
    /// Eastern edge (exclusive, except at the antimeridian).
    pub max_lon: f64,
}

impl CellBounds {
    /// The whole globe.
    pub fn world() -> Self {
        Self {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        }
    }

    /// Centre point of the cell.
    pub fn center(&self) -> Coordinate {
        Coordinate {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lon: (self.min_lon + self.max_lon) / 2.0,
        }
    }

    /// Height in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Width in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Whether `point` falls inside the half-open rectangle.
    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat < self.max_lat
            && point.lon >= self.min_lon
            && point.lon < self.max_lon
    }
}
