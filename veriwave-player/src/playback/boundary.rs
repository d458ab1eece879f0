//! Window boundary policy
//!
//! Decides when playback inside a `[start, end)` window has reached its end
//! and clamps seek targets into the playable range. The tolerance values
//! come from `PlaybackTuning`; nothing here carries its own constants.

use serde::{Deserialize, Serialize};

/// Playback window restricting a unit to a sub-range of the resource
///
/// `end > start` is guaranteed by the segment resolver; a whole-track unit
/// simply has no window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Window start within the resource (seconds)
    pub start: f64,
    /// Window end within the resource (seconds)
    pub end: f64,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Window length in seconds
    pub fn len_secs(&self) -> f64 {
        self.end - self.start
    }
}

/// Clamp a seek target into the playable range of a unit.
///
/// With a window the range is `[window.start, window.end]`; without one it
/// is `[0, duration]`. An unknown duration leaves the upper bound open
/// (the transport clamps physically at end of resource anyway).
pub fn clamp(window: Option<&Window>, duration: Option<f64>, target: f64) -> f64 {
    match window {
        Some(w) => target.clamp(w.start, w.end),
        None => {
            let upper = duration.unwrap_or(f64::INFINITY);
            target.clamp(0.0, upper)
        }
    }
}

/// Has playback reached the end of the window?
///
/// Fires slightly early (`tolerance` seconds) so that recordings whose last
/// samples were swallowed by capture/encoding still terminate cleanly.
pub fn end_reached(window: &Window, position: f64, tolerance: f64) -> bool {
    position >= window.end - tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_len() {
        let w = Window::new(2.0, 5.0);
        assert_eq!(w.len_secs(), 3.0);
    }

    #[test]
    fn test_clamp_inside_window() {
        let w = Window::new(10.0, 20.0);
        assert_eq!(clamp(Some(&w), Some(60.0), 15.0), 15.0);
    }

    #[test]
    fn test_clamp_above_window_end() {
        let w = Window::new(10.0, 20.0);
        assert_eq!(clamp(Some(&w), Some(60.0), 25.0), 20.0);
    }

    #[test]
    fn test_clamp_below_window_start() {
        let w = Window::new(10.0, 20.0);
        assert_eq!(clamp(Some(&w), Some(60.0), 3.0), 10.0);
    }

    #[test]
    fn test_clamp_whole_track() {
        assert_eq!(clamp(None, Some(30.0), -1.0), 0.0);
        assert_eq!(clamp(None, Some(30.0), 12.5), 12.5);
        assert_eq!(clamp(None, Some(30.0), 31.0), 30.0);
    }

    #[test]
    fn test_clamp_whole_track_unknown_duration() {
        // No upper bound until the duration is known
        assert_eq!(clamp(None, None, 1e6), 1e6);
        assert_eq!(clamp(None, None, -5.0), 0.0);
    }

    #[test]
    fn test_end_reached_with_tolerance() {
        let w = Window::new(2.0, 5.0);
        let tol = 0.15;

        assert!(!end_reached(&w, 4.8, tol));
        // 4.85 == 5.0 - 0.15, inclusive
        assert!(end_reached(&w, 4.85, tol));
        assert!(end_reached(&w, 4.9, tol));
        assert!(end_reached(&w, 5.02, tol));
        assert!(end_reached(&w, 5.2, tol));
    }

    #[test]
    fn test_end_reached_zero_tolerance() {
        let w = Window::new(0.0, 10.0);
        assert!(!end_reached(&w, 9.999, 0.0));
        assert!(end_reached(&w, 10.0, 0.0));
    }
}
