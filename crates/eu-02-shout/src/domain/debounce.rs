//! # Debounce Timer
//!
//! State machine behind the neighbor/ripple clear-out. The session owns the
//! actual sleep; this type only decides whether a wake-up is still valid.
//!
//! ```text
//! Idle --arm--> Pending(token) --fire(token)--> Fired --reset--> Idle
//!   \______________________ cancel ______________________/--> Cancelled
//! ```
//!
//! Arming while pending does not restart the window. `Cancelled` is
//! terminal.

use std::fmt;

/// Identifies one armed window. A wake-up with any other token is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Current state of the debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Nothing scheduled.
    Idle,
    /// A window is running.
    Pending(TimerToken),
    /// The window elapsed; the owner has not cleared yet.
    Fired,
    /// Torn down. Never fires again.
    Cancelled,
}

/// Debounce timer state machine.
#[derive(Debug)]
pub struct DebounceTimer {
    state: DebounceState,
    next_token: u64,
}

impl Default for DebounceTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl DebounceTimer {
    /// A new idle timer.
    pub fn new() -> Self {
        Self {
            state: DebounceState::Idle,
            next_token: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Start a window if none is running.
    ///
    /// Returns the token to schedule, or `None` if a window is already
    /// pending, the previous firing has not been reset, or the timer was
    /// cancelled.
    pub fn arm(&mut self) -> Option<TimerToken> {
        match self.state {
            DebounceState::Idle => {
                self.next_token += 1;
                let token = TimerToken(self.next_token);
                self.state = DebounceState::Pending(token);
                Some(token)
            }
            DebounceState::Pending(_) | DebounceState::Fired | DebounceState::Cancelled => None,
        }
    }

    /// Deliver a wake-up. Returns whether it was the live window.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        match self.state {
            DebounceState::Pending(current) if current == token => {
                self.state = DebounceState::Fired;
                true
            }
            _ => false,
        }
    }

    /// Return to idle after the owner handled a firing.
    pub fn reset(&mut self) {
        if self.state == DebounceState::Fired {
            self.state = DebounceState::Idle;
        }
    }

    /// Tear down. Any pending window will be ignored.
    pub fn cancel(&mut self) {
        self.state = DebounceState::Cancelled;
    }
}
