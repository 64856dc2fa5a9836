//! # Geohash Cell Encoding
//!
//! Standard geohash: longitude and latitude bisections interleaved
//! (longitude first), five bits per base-32 character.

use crate::domain::{CellBounds, Coordinate, GeoCellError, CELL_PRECISION};
use shared_types::CellId;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode a raw latitude/longitude pair into its cell id.
pub fn encode(lat: f64, lon: f64) -> Result<CellId, GeoCellError> {
    Ok(encode_coordinate(&Coordinate::new(lat, lon)?))
}

/// Encode an already validated coordinate.
pub fn encode_coordinate(coord: &Coordinate) -> CellId {
    CellId::new(geohash(coord, CELL_PRECISION))
}

/// Rectangle covered by `cell`.
pub fn decode_bounds(cell: &CellId) -> Result<CellBounds, GeoCellError> {
    let key = cell.as_str();
    if key.len() != CELL_PRECISION {
        return Err(GeoCellError::InvalidCell(key.to_string()));
    }

    let mut bounds = CellBounds::world();
    let mut lon_turn = true;

    for ch in key.bytes() {
        let index = BASE32
            .iter()
            .position(|&b| b == ch)
            .ok_or_else(|| GeoCellError::InvalidCell(key.to_string()))?;

        for shift in (0..5).rev() {
            let upper = (index >> shift) & 1 == 1;
            if lon_turn {
                let mid = (bounds.min_lon + bounds.max_lon) / 2.0;
                if upper {
                    bounds.min_lon = mid;
                } else {
                    bounds.max_lon = mid;
                }
            } else {
                let mid = (bounds.min_lat + bounds.max_lat) / 2.0;
                if upper {
                    bounds.min_lat = mid;
                } else {
                    bounds.max_lat = mid;
                }
            }
            lon_turn = !lon_turn;
        }
    }

    Ok(bounds)
}

/// Geohash of `coord` with `len` characters.
pub(crate) fn geohash(coord: &Coordinate, len: usize) -> String {
    let mut bounds = CellBounds::world();
    let mut out = String::with_capacity(len);
    let mut lon_turn = true;
    let mut index = 0usize;
    let mut bits = 0u8;

    while out.len() < len {
        if lon_turn {
            let mid = (bounds.min_lon + bounds.max_lon) / 2.0;
            if coord.lon() >= mid {
                index = index * 2 + 1;
                bounds.min_lon = mid;
            } else {
                index *= 2;
                bounds.max_lon = mid;
            }
        } else {
            let mid = (bounds.min_lat + bounds.max_lat) / 2.0;
            if coord.lat() >= mid {
                index = index * 2 + 1;
                bounds.min_lat = mid;
            } else {
                index *= 2;
                bounds.max_lat = mid;
            }
        }
        lon_turn = !lon_turn;

        bits += 1;
        if bits == 5 {
            out.push(BASE32[index] as char);
            bits = 0;
            index = 0;
        }
    }

    out
}
