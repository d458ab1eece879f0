//! Segment resolver
//!
//! Reconciles raw analysis timestamps against the true media duration and
//! produces the ordered list of display-ready segments. Recordings made in
//! a browser often report chunk ends a fraction of a second past the
//! decoded duration; a small overrun is absorbed by raising the correction
//! ceiling instead of discarding the tail segment.

use tracing::{debug, warn};
use veriwave_common::PlaybackTuning;

use crate::analysis::types::{AnalysisRecord, AnalysisSegment, Severity};
use crate::error::{Error, Result};

/// Resolve raw records into playable segments.
///
/// Fails fast when `total_duration` is unusable: producing segments against
/// a guessed duration would desynchronize every window from the audio.
/// Records at or below the score threshold, with an empty `chunk_id`, or
/// empty after correction are dropped; input order is preserved.
pub fn resolve(
    records: &[AnalysisRecord],
    total_duration: f64,
    tuning: &PlaybackTuning,
) -> Result<Vec<AnalysisSegment>> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(Error::UnknownDuration(total_duration));
    }

    let max_end = records
        .iter()
        .map(|r| r.end_time_seconds)
        .fold(0.0_f64, f64::max);

    // A slight overrun of the decoded duration is capture/encoding jitter;
    // adopt it as the ceiling so the last segment stays closed.
    let ceiling = if max_end > total_duration
        && max_end - total_duration < tuning.duration_overrun_tolerance_secs
    {
        debug!(max_end, total_duration, "adopting overrun end as duration ceiling");
        max_end
    } else {
        total_duration
    };

    let mut segments = Vec::new();
    for record in records {
        if record.score <= tuning.score_threshold {
            continue;
        }
        if record.chunk_id.is_empty() {
            warn!("dropping analysis record with empty chunk id");
            continue;
        }

        let mut end = record.end_time_seconds.min(ceiling);
        let start = record.start_time_seconds.min(end);

        // Close the final segment flush with the track end
        if record.end_time_seconds == max_end
            && (record.end_time_seconds - ceiling).abs() < tuning.duration_overrun_tolerance_secs
        {
            end = ceiling;
        }

        if end <= start {
            warn!(
                chunk_id = %record.chunk_id,
                start, end, "dropping empty segment after correction"
            );
            continue;
        }

        segments.push(AnalysisSegment {
            ordinal: segments.len() + 1,
            chunk_id: record.chunk_id.clone(),
            label: derive_label(&record.chunk_id),
            score: record.score,
            severity: Severity::from_score(record.score),
            start,
            end,
        });
    }

    debug!(
        resolved = segments.len(),
        raw = records.len(),
        "segment resolution complete"
    );
    Ok(segments)
}

/// Derive the human-facing label from a chunk id.
///
/// Ids shaped like `prefix_<integer>` label as the integer plus one (chunk
/// numbering is zero-based upstream); anything else is shown verbatim.
fn derive_label(chunk_id: &str) -> String {
    if let Some((_, index)) = chunk_id.rsplit_once('_') {
        if let Ok(n) = index.parse::<u64>() {
            return (n + 1).to_string();
        }
    }
    chunk_id.to_string()
}
