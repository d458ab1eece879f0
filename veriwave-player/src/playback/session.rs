//! Player session orchestration
//!
//! One session per loaded recording. The session owns the shared transport,
//! the whole-track presenter, one unit per resolved segment, and the
//! progress scheduler, and executes every activation transition: the
//! outgoing unit is paused and its sampling cancelled before the incoming
//! unit starts, so no two units ever produce sound at the same time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use veriwave_common::events::{PlayerEvent, ProgressInfo};
use veriwave_common::{time, PlaybackTuning};

use crate::analysis::resolver;
use crate::analysis::types::{AnalysisRecord, AnalysisSegment};
use crate::error::{Error, Result};
use crate::playback::boundary::Window;
use crate::playback::coordinator::PlaybackCoordinator;
use crate::playback::scheduler::ProgressScheduler;
use crate::playback::transport::Transport;
use crate::playback::unit::MediaUnit;
use crate::playback::waveform::{WaveformPresenter, WaveformView};

/// Status snapshot served by GET /session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub media_path: String,
    pub duration_secs: f64,
    pub active_key: Option<String>,
    pub last_progress: Option<ProgressInfo>,
    pub segment_count: usize,
    pub units: Vec<UnitStatus>,
}

/// Per-unit view of the session status
#[derive(Debug, Clone, Serialize)]
pub struct UnitStatus {
    pub key: String,
    pub window: Option<Window>,
    pub playing: bool,
    /// Window-relative position for the scrub bar
    pub display_position_secs: f64,
    pub display_length_secs: f64,
    /// `mm:ss` rendering of the display position
    pub display_clock: String,
}

/// One loaded recording with its playable units
pub struct PlayerSession {
    id: Uuid,
    media_path: PathBuf,
    duration_secs: f64,
    segments: Vec<AnalysisSegment>,
    units: HashMap<String, Arc<MediaUnit>>,
    /// Presentation order: whole track first, then segments in chunk order
    unit_order: Vec<String>,
    waveform: WaveformPresenter,
    coordinator: Arc<PlaybackCoordinator>,
    scheduler: ProgressScheduler,
    tuning: PlaybackTuning,
}

impl PlayerSession {
    /// Build a session from a shared transport and raw analysis records.
    ///
    /// Fails when the transport cannot report a duration (the resolver
    /// refuses to guess) or when the report is unusable.
    pub fn new(
        media_path: impl AsRef<Path>,
        transport: Arc<dyn Transport>,
        samples: Arc<Vec<f32>>,
        channels: u16,
        records: &[AnalysisRecord],
        coordinator: Arc<PlaybackCoordinator>,
        tuning: PlaybackTuning,
    ) -> Result<Self> {
        let duration_secs = transport
            .duration()
            .ok_or(Error::UnknownDuration(f64::NAN))?;
        let segments = resolver::resolve(records, duration_secs, &tuning)?;

        let waveform = WaveformPresenter::new(transport.clone(), samples, channels);

        let mut units = HashMap::new();
        let mut unit_order = vec![WaveformPresenter::KEY.to_string()];
        units.insert(WaveformPresenter::KEY.to_string(), waveform.unit());

        for segment in &segments {
            let unit = Arc::new(MediaUnit::new(
                segment.chunk_id.clone(),
                transport.clone(),
                Some(Window::new(segment.start, segment.end)),
            ));
            unit_order.push(segment.chunk_id.clone());
            units.insert(segment.chunk_id.clone(), unit);
        }

        let id = Uuid::new_v4();
        info!(
            session_id = %id,
            media = %media_path.as_ref().display(),
            duration_secs,
            segments = segments.len(),
            "session created"
        );

        Ok(Self {
            id,
            media_path: media_path.as_ref().to_path_buf(),
            duration_secs,
            segments,
            units,
            unit_order,
            waveform,
            coordinator,
            scheduler: ProgressScheduler::new(tuning.clone()),
            tuning,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn segments(&self) -> &[AnalysisSegment] {
        &self.segments
    }

    pub fn unit(&self, key: &str) -> Option<Arc<MediaUnit>> {
        self.units.get(key).cloned()
    }

    fn require_unit(&self, key: &str) -> Result<Arc<MediaUnit>> {
        self.unit(key)
            .ok_or_else(|| Error::NotFound(format!("unknown unit key: {key}")))
    }

    /// A unit was tapped: toggle it off if active, otherwise make it the
    /// single active unit. The outgoing unit stops before the incoming
    /// starts; a start rejection is recovered locally and surfaced as an
    /// event, leaving the active key untouched.
    pub async fn handle_play_request(&self, key: &str) -> Result<()> {
        let unit = self.require_unit(key)?;
        let change = self.coordinator.request_activate(key).await;

        self.scheduler.detach();
        if let Some(prev) = &change.deactivated {
            if let Some(previous_unit) = self.units.get(prev) {
                previous_unit.deactivate();
            }
        }

        if change.activated.is_some() {
            match unit.activate(&self.tuning) {
                Ok(()) => {
                    self.scheduler.attach(unit, self.coordinator.clone());
                }
                Err(e) => {
                    self.coordinator.broadcast(PlayerEvent::UnitStartFailed {
                        key: key.to_string(),
                        reason: e.to_string(),
                        timestamp: time::now(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Seek a unit to `target` seconds (resource-wide), clamped into its
    /// window. Scrubbing an inactive unit also requests its activation, so
    /// the bar always reflects the unit under the user's finger; seeking
    /// the active unit while its transport is paused resumes playback.
    pub async fn seek(&self, key: &str, target: f64) -> Result<f64> {
        let unit = self.require_unit(key)?;
        let applied = unit.seek(target);

        if self.coordinator.active_key().await.as_deref() != Some(key) {
            self.handle_play_request(key).await?;
        } else if !unit.is_playing() {
            match unit.activate(&self.tuning) {
                Ok(()) => {
                    self.scheduler.attach(unit, self.coordinator.clone());
                }
                Err(e) => {
                    self.coordinator.broadcast(PlayerEvent::UnitStartFailed {
                        key: key.to_string(),
                        reason: e.to_string(),
                        timestamp: time::now(),
                    });
                }
            }
        } else {
            // Push the discontinuity out immediately instead of waiting a tick
            self.coordinator
                .report_progress(key, applied, self.duration_secs)
                .await;
        }

        Ok(applied)
    }

    /// Stop whatever is playing
    pub async fn stop(&self) {
        if let Some(active) = self.coordinator.active_key().await {
            self.scheduler.detach();
            let change = self.coordinator.request_activate(&active).await;
            if let Some(prev) = change.deactivated {
                if let Some(unit) = self.units.get(&prev) {
                    unit.deactivate();
                }
            }
        }
    }

    /// Tear the session down before it is replaced: cancel sampling,
    /// silence every unit, clear coordinator state.
    pub async fn shutdown(&self) {
        self.scheduler.detach();
        for unit in self.units.values() {
            unit.deactivate();
        }
        self.coordinator.reset().await;
        info!(session_id = %self.id, "session shut down");
    }

    pub fn waveform_view(&self, buckets: usize) -> WaveformView {
        self.waveform.view(&self.segments, &self.tuning, buckets)
    }

    pub async fn status(&self) -> SessionStatus {
        let active_key = self.coordinator.active_key().await;
        let last_progress = self.coordinator.last_progress().await;

        let units = self
            .unit_order
            .iter()
            .filter_map(|key| self.units.get(key).map(|u| (key, u)))
            .map(|(key, unit)| {
                let (display_position_secs, display_length_secs) = unit.display_progress();
                UnitStatus {
                    key: key.clone(),
                    window: unit.window(),
                    playing: unit.is_playing(),
                    display_position_secs,
                    display_length_secs,
                    display_clock: time::format_clock(display_position_secs),
                }
            })
            .collect();

        SessionStatus {
            session_id: self.id,
            media_path: self.media_path.display().to_string(),
            duration_secs: self.duration_secs,
            active_key,
            last_progress,
            segment_count: self.segments.len(),
            units,
        }
    }
}
