//! Playback coordinator: single source of truth for the active unit
//!
//! At most one unit may be active at any instant. The coordinator owns that
//! invariant plus the last progress sample, and broadcasts every transition
//! as a `PlayerEvent`. It is created once per service and handed to the
//! session explicitly; there is no global.
//!
//! Notifications from units that already lost activity are expected under
//! rapid activation changes and are dropped silently, never treated as
//! errors.

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use veriwave_common::events::{PlayerEvent, ProgressInfo};

/// Outcome of an activation request
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationChange {
    /// Unit that must stop playing, if any
    pub deactivated: Option<String>,
    /// Unit that should start playing; None means the request toggled off
    pub activated: Option<String>,
}

/// Coordinator state shared by all units of a session
pub struct PlaybackCoordinator {
    /// Key of the single active unit
    active_key: RwLock<Option<String>>,
    /// Last sample reported by the active unit; cleared with `active_key`
    last_progress: RwLock<Option<ProgressInfo>>,
    /// Event broadcaster for SSE listeners and tests
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            active_key: RwLock::new(None),
            last_progress: RwLock::new(None),
            event_tx,
        }
    }

    /// Request that `key` become the active unit.
    ///
    /// Requesting the already-active unit toggles playback off. The caller
    /// is responsible for pausing the deactivated unit before (or
    /// concurrently with) starting the activated one, so no two units ever
    /// produce sound at the same time.
    pub async fn request_activate(&self, key: &str) -> ActivationChange {
        let mut active = self.active_key.write().await;
        let previous = active.take();

        let change = if previous.as_deref() == Some(key) {
            info!(key, "toggling active unit off");
            ActivationChange {
                deactivated: previous,
                activated: None,
            }
        } else {
            info!(key, previous = ?previous, "activating unit");
            *active = Some(key.to_string());
            ActivationChange {
                deactivated: previous,
                activated: Some(key.to_string()),
            }
        };

        // lastProgress must never outlive the unit it belongs to
        *self.last_progress.write().await = None;

        self.broadcast(PlayerEvent::ActiveUnitChanged {
            active_key: active.clone(),
            timestamp: veriwave_common::time::now(),
        });

        change
    }

    /// A unit finished playing to its end.
    ///
    /// Stale notifications (the unit is no longer active) are tolerated
    /// silently.
    pub async fn notify_ended(&self, key: &str) {
        let mut active = self.active_key.write().await;
        if active.as_deref() != Some(key) {
            debug!(key, "dropping stale ended notification");
            return;
        }

        info!(key, "active unit ended");
        *active = None;
        *self.last_progress.write().await = None;

        self.broadcast(PlayerEvent::UnitEnded {
            key: key.to_string(),
            timestamp: veriwave_common::time::now(),
        });
        self.broadcast(PlayerEvent::ActiveUnitChanged {
            active_key: None,
            timestamp: veriwave_common::time::now(),
        });
    }

    /// Record a progress sample from a unit.
    ///
    /// Samples from anything but the active unit are dropped; a unit that
    /// was just deactivated may still have one sample in flight.
    pub async fn report_progress(&self, key: &str, position_secs: f64, duration_secs: f64) {
        let active = self.active_key.read().await;
        if active.as_deref() != Some(key) {
            debug!(key, "dropping progress sample from inactive unit");
            return;
        }

        let info = ProgressInfo {
            key: key.to_string(),
            position_secs,
            duration_secs,
        };
        *self.last_progress.write().await = Some(info);

        self.broadcast(PlayerEvent::PlaybackProgress {
            key: key.to_string(),
            position_secs,
            duration_secs,
            timestamp: veriwave_common::time::now(),
        });
    }

    /// Clear all coordination state (source replacement or explicit reset)
    pub async fn reset(&self) {
        *self.active_key.write().await = None;
        *self.last_progress.write().await = None;
        self.broadcast(PlayerEvent::SessionCleared {
            timestamp: veriwave_common::time::now(),
        });
    }

    pub async fn active_key(&self) -> Option<String> {
        self.active_key.read().await.clone()
    }

    pub async fn last_progress(&self) -> Option<ProgressInfo> {
        self.last_progress.read().await.clone()
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event, ignoring the no-receivers case
    pub fn broadcast(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
