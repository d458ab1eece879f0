//! Progress sampling loop for the active unit
//!
//! Attaches to exactly one unit at a time and samples its position at the
//! display-refresh cadence, forwarding each sample to the coordinator. The
//! loop exits on its own the moment the unit pauses, ends, or loses
//! activity; `detach()` cancels it synchronously so a deactivated unit
//! cannot emit another sample once the call returns (any sample already in
//! flight is dropped by the coordinator's active-key guard).
//!
//! Sampling itself never mutates transport state; boundary enforcement
//! happens inside `MediaUnit::observe_position`.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;
use veriwave_common::PlaybackTuning;

use crate::playback::coordinator::PlaybackCoordinator;
use crate::playback::unit::{MediaUnit, Observation};

/// Sampling loop with explicit attach/detach lifecycle
pub struct ProgressScheduler {
    tuning: PlaybackTuning,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressScheduler {
    pub fn new(tuning: PlaybackTuning) -> Self {
        Self {
            tuning,
            task: Mutex::new(None),
        }
    }

    /// Start sampling `unit`. Any previous attachment is cancelled first.
    pub fn attach(&self, unit: Arc<MediaUnit>, coordinator: Arc<PlaybackCoordinator>) {
        self.detach();

        let tuning = self.tuning.clone();
        let handle = tokio::spawn(async move {
            let mut tick = interval(Duration::from_millis(tuning.progress_interval_ms));
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tick.tick().await;

                if coordinator.active_key().await.as_deref() != Some(unit.key()) {
                    break;
                }
                if !unit.is_playing() {
                    break;
                }

                match unit.observe_position(&tuning) {
                    Observation::Playing { position, duration } => {
                        coordinator
                            .report_progress(unit.key(), position, duration)
                            .await;
                    }
                    Observation::Ended { position, duration } => {
                        coordinator
                            .report_progress(unit.key(), position, duration)
                            .await;
                        coordinator.notify_ended(unit.key()).await;
                        break;
                    }
                }
            }

            debug!(key = unit.key(), "progress sampling stopped");
        });

        *self.task.lock().unwrap() = Some(handle);
    }

    /// Cancel the sampling task immediately
    pub fn detach(&self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for ProgressScheduler {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::boundary::Window;
    use crate::playback::transport::{ManualTransport, Transport};

    fn fast_tuning() -> PlaybackTuning {
        PlaybackTuning {
            progress_interval_ms: 4,
            ..PlaybackTuning::default()
        }
    }

    #[tokio::test]
    async fn test_samples_reach_coordinator() {
        let tuning = fast_tuning();
        let coordinator = Arc::new(PlaybackCoordinator::new());
        let transport = Arc::new(ManualTransport::new(30.0));
        let unit = Arc::new(MediaUnit::new(
            "waveform",
            transport.clone() as Arc<dyn Transport>,
            None,
        ));

        coordinator.request_activate("waveform").await;
        unit.activate(&tuning).unwrap();
        transport.script_positions(&[1.0, 2.0, 3.0]);

        let scheduler = ProgressScheduler::new(tuning);
        scheduler.attach(unit, coordinator.clone());

        tokio::time::sleep(Duration::from_millis(60)).await;

        let progress = coordinator.last_progress().await.unwrap();
        assert_eq!(progress.key, "waveform");
        assert!(progress.position_secs >= 1.0);
        assert_eq!(progress.duration_secs, 30.0);
    }

    #[tokio::test]
    async fn test_boundary_crossing_ends_unit() {
        let tuning = fast_tuning();
        let coordinator = Arc::new(PlaybackCoordinator::new());
        let transport = Arc::new(ManualTransport::new(30.0));
        let unit = Arc::new(MediaUnit::new(
            "chunk_1",
            transport.clone() as Arc<dyn Transport>,
            Some(Window::new(2.0, 5.0)),
        ));

        coordinator.request_activate("chunk_1").await;
        unit.activate(&tuning).unwrap();
        transport.script_positions(&[4.0, 4.9, 5.02, 5.2]);

        let scheduler = ProgressScheduler::new(tuning);
        scheduler.attach(unit.clone(), coordinator.clone());

        tokio::time::sleep(Duration::from_millis(60)).await;

        // Boundary fired: active cleared, unit paused, head clamped
        assert_eq!(coordinator.active_key().await, None);
        assert!(!unit.is_playing());
        assert_eq!(transport.position(), 5.0);
    }

    #[tokio::test]
    async fn test_stops_when_unit_pauses() {
        let tuning = fast_tuning();
        let coordinator = Arc::new(PlaybackCoordinator::new());
        let transport = Arc::new(ManualTransport::new(30.0));
        let unit = Arc::new(MediaUnit::new(
            "waveform",
            transport.clone() as Arc<dyn Transport>,
            None,
        ));

        coordinator.request_activate("waveform").await;
        unit.activate(&tuning).unwrap();

        let scheduler = ProgressScheduler::new(tuning);
        scheduler.attach(unit.clone(), coordinator.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;

        unit.deactivate();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // No sample arrives after the pause
        let mut rx = coordinator.subscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_detach_cancels_task() {
        let tuning = fast_tuning();
        let coordinator = Arc::new(PlaybackCoordinator::new());
        let transport = Arc::new(ManualTransport::new(30.0));
        let unit = Arc::new(MediaUnit::new(
            "waveform",
            transport.clone() as Arc<dyn Transport>,
            None,
        ));

        coordinator.request_activate("waveform").await;
        unit.activate(&tuning).unwrap();

        let scheduler = ProgressScheduler::new(tuning);
        scheduler.attach(unit, coordinator.clone());
        scheduler.detach();

        let mut rx = coordinator.subscribe();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }
}
