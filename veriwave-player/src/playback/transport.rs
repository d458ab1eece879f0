//! Transport abstraction over a physical playback resource
//!
//! One transport represents one decoded recording. Several logical units
//! (the whole-track view and every segment) share the same transport and
//! take turns driving it; exclusivity is enforced by the coordinator, never
//! by the transport itself. Keeping this seam narrow also keeps the
//! coordination logic independent of cpal and usable under test with a
//! scripted transport.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Low-level operations on a playable audio resource
pub trait Transport: Send + Sync {
    /// Total resource duration in seconds, if known
    fn duration(&self) -> Option<f64>;

    /// Current playback head position in seconds
    fn position(&self) -> f64;

    /// Move the playback head (callers clamp before seeking)
    fn seek(&self, secs: f64);

    /// Begin producing audio from the current position.
    ///
    /// Returns an error when the platform refuses to start the stream; the
    /// caller reports the unit as not playing and recovers locally.
    fn play(&self) -> Result<()>;

    /// Stop producing audio; the head stays put. Idempotent.
    fn pause(&self);

    /// Is the transport currently producing audio?
    fn is_playing(&self) -> bool;

    /// Did the head run off the end of the resource?
    fn has_ended(&self) -> bool;
}

/// Scripted transport for tests and offline diagnostics.
///
/// Positions are served from a script; once the script is exhausted the
/// last value repeats. `play`/`pause`/`seek` mutate plain state under a
/// mutex, so assertions can observe every transition.
pub struct ManualTransport {
    inner: Mutex<ManualState>,
}

struct ManualState {
    script: VecDeque<f64>,
    position: f64,
    duration: Option<f64>,
    playing: bool,
    ended: bool,
    reject_play: bool,
}

impl ManualTransport {
    pub fn new(duration: f64) -> Self {
        Self {
            inner: Mutex::new(ManualState {
                script: VecDeque::new(),
                position: 0.0,
                duration: Some(duration),
                playing: false,
                ended: false,
                reject_play: false,
            }),
        }
    }

    /// Queue positions to be returned by successive `position()` calls
    pub fn script_positions(&self, positions: &[f64]) {
        let mut inner = self.inner.lock().unwrap();
        inner.script.extend(positions.iter().copied());
    }

    /// Make the next `play()` calls fail, simulating a platform rejection
    pub fn reject_play(&self, reject: bool) {
        self.inner.lock().unwrap().reject_play = reject;
    }

    /// Mark the resource as naturally ended
    pub fn set_ended(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.ended = true;
        inner.playing = false;
        if let Some(d) = inner.duration {
            inner.position = d;
        }
    }
}

impl Transport for ManualTransport {
    fn duration(&self) -> Option<f64> {
        self.inner.lock().unwrap().duration
    }

    fn position(&self) -> f64 {
        let mut inner = self.inner.lock().unwrap();
        if let Some(next) = inner.script.pop_front() {
            inner.position = next;
        }
        inner.position
    }

    fn seek(&self, secs: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.position = secs;
        inner.script.clear();
        inner.ended = false;
    }

    fn play(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_play {
            return Err(Error::Playback("playback start rejected".to_string()));
        }
        inner.playing = true;
        inner.ended = false;
        Ok(())
    }

    fn pause(&self) {
        self.inner.lock().unwrap().playing = false;
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().unwrap().playing
    }

    fn has_ended(&self) -> bool {
        self.inner.lock().unwrap().ended
    }
}
