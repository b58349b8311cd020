//! Best-effort startup geolocation.
//!
//! One attempt runs on a background task and publishes into a
//! [`LocationSlot`]. Searches read the slot at dispatch time and never wait
//! for it. Failures are logged and otherwise ignored for the rest of the
//! session.

use std::sync::{Arc, OnceLock};

use mapscout_providers::{LocationError, LocationSource};
use mapscout_types::GeoLocation;
use tokio::task::JoinHandle;

/// Publish-once, read-many holder for the session's coordinates.
#[derive(Debug, Clone, Default)]
pub struct LocationSlot(Arc<OnceLock<GeoLocation>>);

impl LocationSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `location` unless one is already published. Returns whether it was stored.
    pub fn publish(&self, location: GeoLocation) -> bool {
        self.0.set(location).is_ok()
    }

    #[must_use]
    pub fn get(&self) -> Option<GeoLocation> {
        self.0.get().copied()
    }
}

/// Run a single lookup against `source` in the background.
///
/// Must be called from within a tokio runtime.
pub fn spawn_acquisition<S>(source: S, slot: LocationSlot) -> JoinHandle<()>
where
    S: LocationSource + 'static,
{
    tokio::spawn(async move {
        match source.locate().await {
            Ok(location) => {
                if slot.publish(location) {
                    tracing::info!(%location, "Location acquired");
                }
            }
            Err(LocationError::Disabled) => {
                tracing::debug!("Location lookup disabled");
            }
            Err(e) => {
                tracing::warn!("Location unavailable, continuing without it: {e}");
            }
        }
    })
}
