//! # Location Adapters
//!
//! Simulated device positions for local runs.

use async_trait::async_trait;
use eu_02_shout::{LocationError, LocationProvider, Position};
use parking_lot::Mutex;
use rand::Rng;

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    position: Position,
}

impl FixedLocationProvider {
    /// Provider pinned to `(lat, lon)`.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            position: Position::new(lat, lon),
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn get_position(&self) -> Result<Position, LocationError> {
        Ok(self.position)
    }
}

/// Random walk that stays within `radius` degrees of a centre point.
///
/// A fraction of fixes fail to mimic a flaky GPS.
#[derive(Debug)]
pub struct WanderingLocationProvider {
    center: Position,
    radius: f64,
    step: f64,
    failure_rate: f64,
    current: Mutex<Position>,
}

impl WanderingLocationProvider {
    /// Start at `center`; each fix moves at most `radius / 4` per axis.
    pub fn new(center: Position, radius: f64) -> Self {
        Self {
            center,
            radius,
            step: radius / 4.0,
            failure_rate: 0.0,
            current: Mutex::new(center),
        }
    }

    /// Fail this fraction of fixes (0.0 to 1.0).
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn next_position(&self) -> Position {
        let mut rng = rand::thread_rng();
        let mut current = self.current.lock();
        if self.step > 0.0 {
            let lat = current.lat + rng.gen_range(-self.step..=self.step);
            let lon = current.lon + rng.gen_range(-self.step..=self.step);
            current.lat = clamp_around(lat, self.center.lat, self.radius).clamp(-90.0, 90.0);
            current.lon = clamp_around(lon, self.center.lon, self.radius).clamp(-180.0, 180.0);
        }
        *current
    }
}

fn clamp_around(value: f64, center: f64, radius: f64) -> f64 {
    value.clamp(center - radius, center + radius)
}

#[async_trait]
impl LocationProvider for WanderingLocationProvider {
    async fn get_position(&self) -> Result<Position, LocationError> {
        if self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate) {
            return Err(LocationError::Unavailable("no GPS signal".to_string()));
        }
        Ok(self.next_position())
    }
}
