//! Event types for the veriwave playback event system
//!
//! Every observable transition of the playback coordinator is broadcast as a
//! `PlayerEvent`. The host view consumes these over SSE; integration tests
//! consume them directly from the broadcast channel.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Last reported progress sample for the active unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Key of the unit that produced the sample
    pub key: String,
    /// Current position in seconds (resource-wide, not window-relative)
    pub position_secs: f64,
    /// Total resource duration in seconds
    pub duration_secs: f64,
}

/// Veriwave event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// The active unit changed (None = nothing is playing)
    ActiveUnitChanged {
        active_key: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress sample from the active unit (sent at display-refresh cadence)
    PlaybackProgress {
        key: String,
        position_secs: f64,
        duration_secs: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active unit reached its end (window boundary or end of resource)
    UnitEnded {
        key: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A unit was activated but its transport refused to start
    UnitStartFailed {
        key: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new recording and analysis report were loaded
    SessionLoaded {
        session_id: Uuid,
        media_path: String,
        duration_secs: f64,
        segment_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session was torn down (source replaced or explicit reset)
    SessionCleared {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// SSE event name for this variant
    pub fn kind(&self) -> &'static str {
        match self {
            PlayerEvent::ActiveUnitChanged { .. } => "active_unit_changed",
            PlayerEvent::PlaybackProgress { .. } => "playback_progress",
            PlayerEvent::UnitEnded { .. } => "unit_ended",
            PlayerEvent::UnitStartFailed { .. } => "unit_start_failed",
            PlayerEvent::SessionLoaded { .. } => "session_loaded",
            PlayerEvent::SessionCleared { .. } => "session_cleared",
        }
    }
}
