//! Playback tuning parameters
//!
//! All timing tolerances and display thresholds used by the coordination
//! subsystem live here as one named struct. The tuning is passed explicitly
//! to the components that need it; there is no global singleton, so tests
//! can vary individual values freely.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable parameters for playback coordination and segment display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackTuning {
    /// Tolerance when detecting that a windowed unit reached its end
    ///
    /// Valid range: [0.0, 1.0] seconds
    /// Default: 0.15 s
    /// Absorbs capture/encoding jitter near segment boundaries; a unit is
    /// considered ended once `position >= window.end - tolerance`.
    pub boundary_tolerance_secs: f64,

    /// Tolerance when reconciling analysis timestamps against media duration
    ///
    /// Valid range: [0.0, 1.0] seconds
    /// Default: 0.25 s
    /// An analysis record ending past the true duration by less than this is
    /// treated as encoder overrun and becomes the corrected duration ceiling.
    pub duration_overrun_tolerance_secs: f64,

    /// Minimum score for an analysis record to get its own playable segment
    ///
    /// Valid range: [0.0, 1.0]
    /// Default: 0.25 (see [`PlaybackTuning::conservative`] for the 0.4 preset)
    pub score_threshold: f64,

    /// Progress sampling cadence for the active unit
    ///
    /// Valid range: [4, 1000] ms
    /// Default: 16 ms (one sample per frame at a 60 Hz display)
    pub progress_interval_ms: u64,

    /// Fallback waveform grid-line spacing when no segments are displayed
    ///
    /// Valid range: (0.0, 60.0] seconds
    /// Default: 4.0 s
    pub default_gridline_secs: f64,
}

impl Default for PlaybackTuning {
    fn default() -> Self {
        Self {
            boundary_tolerance_secs: 0.15,
            duration_overrun_tolerance_secs: 0.25,
            score_threshold: 0.25,
            progress_interval_ms: 16,
            default_gridline_secs: 4.0,
        }
    }
}

impl PlaybackTuning {
    /// Preset with the stricter 0.4 score threshold
    ///
    /// Surfaces only segments the analyzer is fairly sure about; everything
    /// else matches the defaults.
    pub fn conservative() -> Self {
        Self {
            score_threshold: 0.4,
            ..Self::default()
        }
    }

    /// Validate that all parameters are inside their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.boundary_tolerance_secs) {
            return Err(Error::InvalidParameter(format!(
                "boundary_tolerance_secs out of range [0.0, 1.0]: {}",
                self.boundary_tolerance_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.duration_overrun_tolerance_secs) {
            return Err(Error::InvalidParameter(format!(
                "duration_overrun_tolerance_secs out of range [0.0, 1.0]: {}",
                self.duration_overrun_tolerance_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(Error::InvalidParameter(format!(
                "score_threshold out of range [0.0, 1.0]: {}",
                self.score_threshold
            )));
        }
        if !(4..=1000).contains(&self.progress_interval_ms) {
            return Err(Error::InvalidParameter(format!(
                "progress_interval_ms out of range [4, 1000]: {}",
                self.progress_interval_ms
            )));
        }
        if !(self.default_gridline_secs > 0.0 && self.default_gridline_secs <= 60.0) {
            return Err(Error::InvalidParameter(format!(
                "default_gridline_secs out of range (0.0, 60.0]: {}",
                self.default_gridline_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tuning = PlaybackTuning::default();
        assert_eq!(tuning.boundary_tolerance_secs, 0.15);
        assert_eq!(tuning.duration_overrun_tolerance_secs, 0.25);
        assert_eq!(tuning.score_threshold, 0.25);
        assert_eq!(tuning.progress_interval_ms, 16);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_conservative_preset() {
        let tuning = PlaybackTuning::conservative();
        assert_eq!(tuning.score_threshold, 0.4);
        // Everything else stays at the defaults
        assert_eq!(tuning.boundary_tolerance_secs, 0.15);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let tuning: PlaybackTuning = toml::from_str("score_threshold = 0.4").unwrap();
        assert_eq!(tuning.score_threshold, 0.4);
        assert_eq!(tuning.boundary_tolerance_secs, 0.15);
        assert_eq!(tuning.progress_interval_ms, 16);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let tuning = PlaybackTuning {
            score_threshold: 1.5,
            ..PlaybackTuning::default()
        };
        assert!(tuning.validate().is_err());

        let tuning = PlaybackTuning {
            progress_interval_ms: 0,
            ..PlaybackTuning::default()
        };
        assert!(tuning.validate().is_err());
    }
}
