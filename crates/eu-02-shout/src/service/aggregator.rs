//! # Ephemeral State Aggregator
//!
//! Sole mutator of render state. Keeps the latest message map, the neighbor
//! set and ripple count, and derives the merged view from them.
//!
//! Neighbors and ripples are transient: the first one to appear arms the
//! debounce timer and its expiry clears both. Later arrivals within the
//! window do not extend it.

use crate::algorithms::merge_entries;
use crate::domain::{
    DebounceState, DebounceTimer, MessageMap, NeighborSet, SubscriptionStatus, TimerToken,
    ViewModel,
};
use shared_types::{CellId, UserId};

/// What happened to a resolved neighbor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborMerge {
    /// Neighbors were stored. Schedule the token if one was issued.
    Applied(Option<TimerToken>),
    /// Neighbors were already shown; the result was dropped.
    Discarded,
}

/// Merged read model.
#[derive(Debug)]
pub struct EphemeralStateAggregator {
    messages: MessageMap,
    neighbors: NeighborSet,
    ripples: usize,
    debounce: DebounceTimer,
    cell: Option<CellId>,
    subscription: SubscriptionStatus,
    selected_message: String,
}

impl EphemeralStateAggregator {
    /// Empty state with `selected_message` as the default shout.
    pub fn new(selected_message: impl Into<String>) -> Self {
        Self {
            messages: MessageMap::new(),
            neighbors: NeighborSet::new(),
            ripples: 0,
            debounce: DebounceTimer::new(),
            cell: None,
            subscription: SubscriptionStatus::Unsubscribed,
            selected_message: selected_message.into(),
        }
    }

    /// Replace the message map with the latest snapshot projection.
    pub fn replace_messages(&mut self, messages: MessageMap) {
        self.messages = messages;
    }

    /// Drop the messages of `authors`. Returns how many were removed.
    pub fn expire_messages(&mut self, authors: &[UserId]) -> usize {
        let before = self.messages.len();
        self.messages.retain(|user, _| !authors.contains(user));
        before - self.messages.len()
    }

    /// Enter a new cell. Messages and neighbors of the old cell are dropped.
    pub fn enter_cell(&mut self, cell: CellId) {
        self.cell = Some(cell);
        self.messages.clear();
        self.neighbors.clear();
    }

    /// Record the subscription health.
    pub fn set_subscription(&mut self, status: SubscriptionStatus) {
        self.subscription = status;
    }

    /// Text of the next default shout.
    pub fn selected_message(&self) -> &str {
        &self.selected_message
    }

    /// Change the default shout.
    pub fn select_message(&mut self, text: String) {
        self.selected_message = text;
    }

    /// Whether any neighbor is shown.
    pub fn neighbors_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Current debounce state.
    pub fn debounce_state(&self) -> DebounceState {
        self.debounce.state()
    }

    /// Add one ripple. Returns a token to schedule if a window started.
    pub fn record_ripple(&mut self) -> Option<TimerToken> {
        self.ripples += 1;
        self.debounce.arm()
    }

    /// Store a resolved neighbor set unless one is already shown.
    pub fn merge_neighbors(&mut self, neighbors: NeighborSet) -> NeighborMerge {
        if !self.neighbors.is_empty() {
            return NeighborMerge::Discarded;
        }
        if neighbors.is_empty() {
            return NeighborMerge::Applied(None);
        }
        self.neighbors = neighbors;
        NeighborMerge::Applied(self.debounce.arm())
    }

    /// Handle a debounce wake-up. Returns whether anything was cleared.
    pub fn debounce_elapsed(&mut self, token: TimerToken) -> bool {
        if !self.debounce.fire(token) {
            return false;
        }
        self.neighbors.clear();
        self.ripples = 0;
        self.debounce.reset();
        true
    }

    /// Stop the debounce timer for good.
    pub fn teardown(&mut self) {
        self.debounce.cancel();
    }

    /// Render-ready view.
    pub fn view(&self) -> ViewModel {
        ViewModel {
            cell: self.cell.clone(),
            subscription: self.subscription.clone(),
            entries: merge_entries(&self.messages, &self.neighbors),
            ripples: self.ripples,
            selected_message: self.selected_message.clone(),
        }
    }
}
