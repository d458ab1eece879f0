//! Media unit: one logical, independently controllable playback view
//!
//! A unit is either the whole-track view or one analysis segment. Many
//! units share one physical transport; a unit only "drives" the transport
//! while it is the active one, so window state lives here and never leaks
//! into the shared resource.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};
use veriwave_common::PlaybackTuning;

use crate::error::Result;
use crate::playback::boundary::{self, Window};
use crate::playback::transport::Transport;

/// Result of observing the transport position for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Unit is still inside its playable range
    Playing { position: f64, duration: f64 },
    /// Unit just crossed its end; fired at most once per activation
    Ended { position: f64, duration: f64 },
}

/// One logical playback view over a shared transport
pub struct MediaUnit {
    key: String,
    window: RwLock<Option<Window>>,
    transport: Arc<dyn Transport>,
    /// True while this unit is the one driving the shared transport
    driving: AtomicBool,
    /// Latched once the boundary check fires, reset on (re)activation
    end_fired: AtomicBool,
}

impl MediaUnit {
    pub fn new(key: impl Into<String>, transport: Arc<dyn Transport>, window: Option<Window>) -> Self {
        Self {
            key: key.into(),
            window: RwLock::new(window),
            transport,
            driving: AtomicBool::new(false),
            end_fired: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn window(&self) -> Option<Window> {
        *self.window.read().unwrap()
    }

    /// Replace the window bounds without recreating the unit
    pub fn set_window(&self, window: Option<Window>) {
        *self.window.write().unwrap() = window;
    }

    /// Resource-wide duration, once the transport knows it
    pub fn duration(&self) -> Option<f64> {
        self.transport.duration()
    }

    /// Is this unit audibly playing right now?
    pub fn is_playing(&self) -> bool {
        self.driving.load(Ordering::Acquire) && self.transport.is_playing()
    }

    /// Start playback from the correct position for this unit.
    ///
    /// The shared head may sit anywhere after another unit played, so the
    /// window clamp is re-applied on every activation: resume at the
    /// current position when it lies inside the window, restart at the
    /// window start (or 0 for the whole track) when the unit previously
    /// finished or the head is outside the window.
    ///
    /// On a start rejection the transport stays paused, the unit reports
    /// itself as not playing and the error is returned for the caller to
    /// surface; nothing else changes.
    pub fn activate(&self, tuning: &PlaybackTuning) -> Result<()> {
        if self.is_playing() {
            return Ok(());
        }

        let position = self.transport.position();
        let finished = self.end_fired.load(Ordering::Acquire);

        let target = match self.window() {
            Some(w) => {
                if finished
                    || position < w.start
                    || boundary::end_reached(&w, position, tuning.boundary_tolerance_secs)
                {
                    w.start
                } else {
                    position
                }
            }
            None => {
                if finished || self.transport.has_ended() {
                    0.0
                } else {
                    position
                }
            }
        };

        if (target - position).abs() > f64::EPSILON {
            self.transport.seek(target);
        }
        self.end_fired.store(false, Ordering::Release);

        debug!(key = %self.key, start = target, "activating unit");
        match self.transport.play() {
            Ok(()) => {
                self.driving.store(true, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                warn!(key = %self.key, "playback start rejected: {}", e);
                self.driving.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Pause the transport if this unit is driving it. Idempotent.
    pub fn deactivate(&self) {
        if self.driving.swap(false, Ordering::AcqRel) {
            self.transport.pause();
            debug!(key = %self.key, "unit deactivated");
        }
    }

    /// Clamp a seek target into this unit's range and move the head.
    ///
    /// Returns the position actually applied. Clears the end latch so a
    /// finished segment can be replayed by scrubbing back into it.
    pub fn seek(&self, target: f64) -> f64 {
        let window = self.window();
        let clamped = boundary::clamp(window.as_ref(), self.transport.duration(), target);
        self.transport.seek(clamped);
        self.end_fired.store(false, Ordering::Release);
        clamped
    }

    /// Observe the current position, enforcing the window boundary.
    ///
    /// On the sample that crosses `window.end - tolerance` the head is
    /// clamped to the window end, the transport paused and `Ended`
    /// returned; the latch guarantees this happens at most once per
    /// activation. The whole-track unit ends only on natural end of
    /// resource.
    pub fn observe_position(&self, tuning: &PlaybackTuning) -> Observation {
        let position = self.transport.position();
        let duration = self.transport.duration();

        if let Some(w) = self.window() {
            // A corrected window may end a hair past the physical resource;
            // running off the end of the resource finishes the unit as well.
            let crossed = boundary::end_reached(&w, position, tuning.boundary_tolerance_secs)
                || self.transport.has_ended();
            if crossed && !self.end_fired.swap(true, Ordering::AcqRel) {
                self.transport.seek(w.end);
                self.transport.pause();
                self.driving.store(false, Ordering::Release);
                return Observation::Ended {
                    position: w.end,
                    duration: duration.unwrap_or(w.end),
                };
            }
        } else if self.transport.has_ended() && !self.end_fired.swap(true, Ordering::AcqRel) {
            self.transport.pause();
            self.driving.store(false, Ordering::Release);
            let end = duration.unwrap_or(position);
            return Observation::Ended {
                position: end,
                duration: end,
            };
        }

        Observation::Playing {
            position,
            duration: duration.unwrap_or(0.0),
        }
    }

    /// Window-relative progress for display: `(position, length)` with the
    /// position normalized into `[0, length]`. A finished segment reports
    /// its full length so the scrub bar rests at the end.
    pub fn display_progress(&self) -> (f64, f64) {
        let duration = self.transport.duration().unwrap_or(0.0);
        let (start, length) = match self.window() {
            Some(w) => (w.start, w.len_secs()),
            None => (0.0, duration),
        };

        if self.end_fired.load(Ordering::Acquire) && !self.is_playing() {
            return (length, length);
        }

        let played = (self.transport.position() - start).clamp(0.0, length);
        (played, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::transport::ManualTransport;

    fn unit_with_window(start: f64, end: f64) -> (Arc<ManualTransport>, MediaUnit) {
        let transport = Arc::new(ManualTransport::new(30.0));
        let unit = MediaUnit::new(
            "chunk_0",
            transport.clone() as Arc<dyn Transport>,
            Some(Window::new(start, end)),
        );
        (transport, unit)
    }

    #[test]
    fn test_seek_clamps_into_window() {
        let (_, unit) = unit_with_window(10.0, 20.0);
        assert_eq!(unit.seek(25.0), 20.0);
        assert_eq!(unit.seek(3.0), 10.0);
        assert_eq!(unit.seek(15.0), 15.0);
    }

    #[test]
    fn test_activate_starts_at_window_start() {
        let (transport, unit) = unit_with_window(2.0, 5.0);
        unit.activate(&PlaybackTuning::default()).unwrap();
        assert_eq!(transport.position(), 2.0);
        assert!(unit.is_playing());
    }

    #[test]
    fn test_activate_resumes_inside_window() {
        let (transport, unit) = unit_with_window(2.0, 5.0);
        transport.seek(3.5);
        unit.activate(&PlaybackTuning::default()).unwrap();
        assert_eq!(transport.position(), 3.5);
    }

    #[test]
    fn test_activate_restarts_after_finish() {
        let tuning = PlaybackTuning::default();
        let (transport, unit) = unit_with_window(2.0, 5.0);
        unit.activate(&tuning).unwrap();

        transport.script_positions(&[5.1]);
        assert!(matches!(
            unit.observe_position(&tuning),
            Observation::Ended { .. }
        ));

        unit.activate(&tuning).unwrap();
        assert_eq!(transport.position(), 2.0);
    }

    #[test]
    fn test_boundary_fires_exactly_once() {
        let tuning = PlaybackTuning::default();
        let (transport, unit) = unit_with_window(2.0, 5.0);
        unit.activate(&tuning).unwrap();

        // First sample already inside the tolerance band (4.9 >= 5.0 - 0.15)
        let mut ended = 0;
        for pos in [4.9, 5.02, 5.2] {
            transport.seek(pos);
            if matches!(unit.observe_position(&tuning), Observation::Ended { .. }) {
                ended += 1;
            }
        }
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_boundary_clamps_and_pauses() {
        let tuning = PlaybackTuning::default();
        let (transport, unit) = unit_with_window(2.0, 5.0);
        unit.activate(&tuning).unwrap();

        transport.script_positions(&[4.9]);
        match unit.observe_position(&tuning) {
            Observation::Ended { position, .. } => assert_eq!(position, 5.0),
            other => panic!("expected Ended, got {:?}", other),
        }
        assert!(!unit.is_playing());
        assert_eq!(transport.position(), 5.0);
    }

    #[test]
    fn test_start_rejection_leaves_unit_not_playing() {
        let (transport, unit) = unit_with_window(2.0, 5.0);
        transport.reject_play(true);

        assert!(unit.activate(&PlaybackTuning::default()).is_err());
        assert!(!unit.is_playing());
    }

    #[test]
    fn test_whole_track_restarts_after_natural_end() {
        let tuning = PlaybackTuning::default();
        let transport = Arc::new(ManualTransport::new(30.0));
        let unit = MediaUnit::new("waveform", transport.clone() as Arc<dyn Transport>, None);

        unit.activate(&tuning).unwrap();
        transport.set_ended();
        assert!(matches!(
            unit.observe_position(&tuning),
            Observation::Ended { position, .. } if position == 30.0
        ));

        unit.activate(&tuning).unwrap();
        assert_eq!(transport.position(), 0.0);
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let (transport, unit) = unit_with_window(2.0, 5.0);
        unit.activate(&PlaybackTuning::default()).unwrap();

        unit.deactivate();
        assert!(!transport.is_playing());
        unit.deactivate();
        assert!(!transport.is_playing());
    }

    #[test]
    fn test_display_progress_normalizes_into_window() {
        let (transport, unit) = unit_with_window(10.0, 20.0);
        transport.seek(14.0);
        let (played, length) = unit.display_progress();
        assert_eq!(played, 4.0);
        assert_eq!(length, 10.0);
    }

    #[test]
    fn test_display_progress_full_when_finished() {
        let tuning = PlaybackTuning::default();
        let (transport, unit) = unit_with_window(10.0, 20.0);
        unit.activate(&tuning).unwrap();
        transport.script_positions(&[19.95]);
        unit.observe_position(&tuning);

        let (played, length) = unit.display_progress();
        assert_eq!(played, length);
    }
}
