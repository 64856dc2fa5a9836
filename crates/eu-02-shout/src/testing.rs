//! Test doubles for sessions: controllable clocks, a scripted location
//! provider and a helper to wait for a view condition.

use crate::domain::{LocationError, Position, ViewModel};
use crate::ports::{LocationProvider, TimeSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Timestamp;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Manually driven clock.
#[derive(Debug)]
pub struct MockTimeSource {
    time: AtomicU64,
}

impl MockTimeSource {
    /// Clock starting at `initial_ms`.
    pub fn new(initial_ms: u64) -> Self {
        Self {
            time: AtomicU64::new(initial_ms),
        }
    }

    /// Move forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to `ms`, possibly backwards.
    pub fn set(&self, ms: u64) {
        self.time.store(ms, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.time.load(Ordering::SeqCst))
    }
}

/// Wall clock that follows tokio's clock, so a paused runtime advancing
/// its timers also moves message age forward.
#[derive(Debug)]
pub struct TokioTimeSource {
    epoch_ms: u64,
    start: tokio::time::Instant,
}

impl TokioTimeSource {
    /// Clock reading `epoch_ms` now.
    pub fn new(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            start: tokio::time::Instant::now(),
        }
    }
}

impl TimeSource for TokioTimeSource {
    fn now(&self) -> Timestamp {
        let elapsed = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Timestamp::from_millis(self.epoch_ms.saturating_add(elapsed))
    }
}

/// Location provider that replays a queue of fixes and failures.
///
/// Once the queue is empty it repeats the last successful fix, or reports
/// the location as unavailable if there never was one.
#[derive(Debug, Default)]
pub struct ScriptedLocationProvider {
    script: Mutex<VecDeque<Result<Position, LocationError>>>,
    last_fix: Mutex<Option<Position>>,
}

impl ScriptedLocationProvider {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful fix.
    pub fn push_fix(&self, lat: f64, lon: f64) {
        self.script.lock().push_back(Ok(Position::new(lat, lon)));
    }

    /// Queue a failure.
    pub fn push_failure(&self, reason: &str) {
        self.script
            .lock()
            .push_back(Err(LocationError::Unavailable(reason.to_string())));
    }
}

#[async_trait]
impl LocationProvider for ScriptedLocationProvider {
    async fn get_position(&self) -> Result<Position, LocationError> {
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(position)) => {
                *self.last_fix.lock() = Some(position);
                Ok(position)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last_fix
                .lock()
                .ok_or_else(|| LocationError::Unavailable("no fix scripted".to_string())),
        }
    }
}

/// Wait until the view satisfies `predicate`, giving up after 30 seconds.
pub async fn wait_for_view<F>(
    view: &mut watch::Receiver<ViewModel>,
    predicate: F,
) -> Option<ViewModel>
where
    F: FnMut(&ViewModel) -> bool,
{
    let result = tokio::time::timeout(Duration::from_secs(30), view.wait_for(predicate)).await;
    match result {
        Ok(Ok(current)) => Some(current.clone()),
        _ => None,
    }
}
