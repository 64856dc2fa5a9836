//! Inbound Ports (Driving Ports / API)
//!
//! What the presentation layer calls. Every call is serialized through the
//! session's event queue, so callers never observe a half-applied update.

use crate::domain::{LocationUpdate, ShoutError, ShoutReceipt, ViewModel};
use async_trait::async_trait;
use tokio::sync::watch;

/// Shout session API.
#[async_trait]
pub trait ShoutApi: Send + Sync {
    /// Move the local user to the cell of `(lat, lon)`.
    ///
    /// Writes `cellId` and resubscribes only if the cell changed. On a write
    /// failure the previous cell is kept.
    async fn update_location(&self, lat: f64, lon: f64) -> Result<LocationUpdate, ShoutError>;

    /// Ask the location provider for a fix and apply it.
    async fn locate(&self) -> Result<LocationUpdate, ShoutError>;

    /// Publish a message. `None` shouts the selected preset.
    async fn shout(&self, content: Option<String>) -> Result<ShoutReceipt, ShoutError>;

    /// Pick the text used by the next default shout.
    async fn select_message(&self, text: String) -> Result<(), ShoutError>;

    /// Latest view model.
    fn view(&self) -> ViewModel;

    /// Change feed of the view model.
    fn watch(&self) -> watch::Receiver<ViewModel>;
}
