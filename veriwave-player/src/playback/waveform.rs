//! Waveform presenter
//!
//! The whole-track view: one ordinary whole-track unit participating in the
//! coordinator/scheduler contracts, plus the visual overlay derived from the
//! decoded samples and the resolved segments. All horizontal placement is
//! proportional to duration, expressed as fractions in `[0, 1]` so the host
//! view can scale freely.

use std::sync::Arc;

use serde::Serialize;
use veriwave_common::PlaybackTuning;

use crate::analysis::types::{AnalysisSegment, Severity};
use crate::playback::transport::Transport;
use crate::playback::unit::MediaUnit;

/// Default number of peak buckets served when the client does not ask
pub const DEFAULT_PEAK_BUCKETS: usize = 400;

/// Bounds on the requested peak resolution
pub const MIN_PEAK_BUCKETS: usize = 16;
pub const MAX_PEAK_BUCKETS: usize = 4096;

/// Overlay region for one resolved segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveformRegion {
    /// Segment unit key (the upstream chunk id)
    pub key: String,
    pub label: String,
    pub score: f64,
    pub severity: Severity,
    /// Start as a fraction of the track duration
    pub start_frac: f64,
    /// End as a fraction of the track duration, clamped to 1.0
    pub end_frac: f64,
}

/// Renderable waveform description
#[derive(Debug, Clone, Serialize)]
pub struct WaveformView {
    pub duration_secs: f64,
    /// Normalized peak amplitude per bucket (0-1)
    pub peaks: Vec<f32>,
    pub regions: Vec<WaveformRegion>,
    /// Vertical grid-line positions as fractions of the track duration
    pub gridlines: Vec<f64>,
}

/// Whole-track presenter: the unit plus its visual source material
pub struct WaveformPresenter {
    unit: Arc<MediaUnit>,
    samples: Arc<Vec<f32>>,
    channels: u16,
}

impl WaveformPresenter {
    /// Key of the whole-track unit
    pub const KEY: &'static str = "waveform";

    pub fn new(transport: Arc<dyn Transport>, samples: Arc<Vec<f32>>, channels: u16) -> Self {
        Self {
            unit: Arc::new(MediaUnit::new(Self::KEY, transport, None)),
            samples,
            channels: channels.max(1),
        }
    }

    /// The whole-track media unit (shared with the session's unit table)
    pub fn unit(&self) -> Arc<MediaUnit> {
        self.unit.clone()
    }

    /// Build the renderable view at the requested peak resolution
    pub fn view(
        &self,
        segments: &[AnalysisSegment],
        tuning: &PlaybackTuning,
        buckets: usize,
    ) -> WaveformView {
        let duration = self.unit.duration().unwrap_or(0.0).max(0.0);

        let buckets = buckets.clamp(MIN_PEAK_BUCKETS, MAX_PEAK_BUCKETS);
        WaveformView {
            duration_secs: duration,
            peaks: peak_buckets(&self.samples, self.channels, buckets),
            regions: regions(segments, duration),
            gridlines: gridlines(segments, duration, tuning.default_gridline_secs),
        }
    }
}

/// Fold interleaved samples into normalized per-bucket peak amplitudes
fn peak_buckets(samples: &[f32], channels: u16, buckets: usize) -> Vec<f32> {
    let frames = samples.len() / channels as usize;
    if frames == 0 {
        return vec![0.0; buckets];
    }

    let mut peaks = vec![0.0_f32; buckets];
    let per_bucket = (frames as f64 / buckets as f64).max(1.0);

    for frame in 0..frames {
        let bucket = ((frame as f64 / per_bucket) as usize).min(buckets - 1);
        for ch in 0..channels as usize {
            let amp = samples[frame * channels as usize + ch].abs();
            if amp > peaks[bucket] {
                peaks[bucket] = amp;
            }
        }
    }

    let max = peaks.iter().cloned().fold(0.0_f32, f32::max);
    if max > 0.0 {
        for p in peaks.iter_mut() {
            *p /= max;
        }
    }
    peaks
}

fn regions(segments: &[AnalysisSegment], duration: f64) -> Vec<WaveformRegion> {
    if duration <= 0.0 {
        return Vec::new();
    }
    segments
        .iter()
        .map(|s| WaveformRegion {
            key: s.chunk_id.clone(),
            label: s.label.clone(),
            score: s.score,
            severity: s.severity,
            start_frac: (s.start / duration).clamp(0.0, 1.0),
            // A corrected segment may end a hair past the decoded duration
            end_frac: (s.end / duration).clamp(0.0, 1.0),
        })
        .collect()
}

/// Grid lines proportional to duration.
///
/// With segments present, a line marks each segment start (skipping 0) plus
/// the final segment's end, which may sit exactly at the track end. Without
/// segments, lines repeat at the fallback interval with a closing line at
/// the track end.
fn gridlines(segments: &[AnalysisSegment], duration: f64, fallback_step: f64) -> Vec<f64> {
    if duration <= 0.0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut push = |secs: f64, allow_end: bool| {
        let frac = secs / duration;
        if secs > 0.0 && (frac < 1.0 || (allow_end && frac <= 1.0)) {
            lines.push(frac.min(1.0));
        }
    };

    if !segments.is_empty() {
        for segment in segments {
            push(segment.start, false);
        }
        if let Some(last) = segments.last() {
            push(last.end, true);
        }
    } else {
        let mut step = 1;
        while (step as f64) * fallback_step < duration {
            push(step as f64 * fallback_step, false);
            step += 1;
        }
        push(duration, true);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::transport::ManualTransport;

    fn segment(chunk_id: &str, label: &str, score: f64, start: f64, end: f64) -> AnalysisSegment {
        AnalysisSegment {
            ordinal: 1,
            chunk_id: chunk_id.to_string(),
            label: label.to_string(),
            score,
            severity: Severity::from_score(score),
            start,
            end,
        }
    }

    #[test]
    fn test_peak_buckets_normalized() {
        // Stereo: two frames loud, two quiet
        let samples = vec![0.5, 0.5, 0.1, 0.1, 0.25, 0.25, 0.1, 0.1];
        let peaks = peak_buckets(&samples, 2, 2);

        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0], 1.0);
        assert_eq!(peaks[1], 0.5);
    }

    #[test]
    fn test_peak_buckets_empty_input() {
        let peaks = peak_buckets(&[], 2, 4);
        assert_eq!(peaks, vec![0.0; 4]);
    }

    #[test]
    fn test_regions_clamp_past_duration() {
        let segments = vec![segment("chunk_2", "3", 0.5, 20.0, 30.2)];
        let regions = regions(&segments, 30.0);

        assert_eq!(regions.len(), 1);
        assert!((regions[0].start_frac - 20.0 / 30.0).abs() < 1e-9);
        assert_eq!(regions[0].end_frac, 1.0);
    }

    #[test]
    fn test_gridlines_from_segments() {
        let segments = vec![
            segment("chunk_0", "1", 0.9, 0.0, 10.0),
            segment("chunk_2", "3", 0.5, 20.0, 30.0),
        ];
        let lines = gridlines(&segments, 30.0, 4.0);

        // No line at 0; one at 20s; closing line at the last segment end
        assert_eq!(lines.len(), 2);
        assert!((lines[0] - 20.0 / 30.0).abs() < 1e-9);
        assert_eq!(lines[1], 1.0);
    }

    #[test]
    fn test_gridlines_fallback_interval() {
        let lines = gridlines(&[], 10.0, 4.0);

        // 4s, 8s, then the closing line at the end
        assert_eq!(lines.len(), 3);
        assert!((lines[0] - 0.4).abs() < 1e-9);
        assert!((lines[1] - 0.8).abs() < 1e-9);
        assert_eq!(lines[2], 1.0);
    }

    #[test]
    fn test_view_uses_transport_duration() {
        let transport = Arc::new(ManualTransport::new(30.0));
        let presenter = WaveformPresenter::new(
            transport as Arc<dyn Transport>,
            Arc::new(vec![0.0; 64]),
            2,
        );

        let view = presenter.view(&[], &PlaybackTuning::default(), 32);
        assert_eq!(view.duration_secs, 30.0);
        assert_eq!(view.peaks.len(), 32);
    }
}
