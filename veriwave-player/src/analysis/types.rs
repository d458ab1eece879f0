//! Analysis report types
//!
//! Raw records arrive from the upstream analyzer in chunk order; the
//! resolver turns them into display-ready segments. Field names follow the
//! analyzer's JSON wire format.

use serde::{Deserialize, Serialize};

/// One raw record from the upstream analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Analyzer chunk identifier, unique per session
    pub chunk_id: String,
    /// Probability that the chunk is synthetically generated (0-1)
    pub score: f64,
    pub start_time_seconds: f64,
    pub end_time_seconds: f64,
}

/// Response envelope produced by the upload/analysis collaborator.
///
/// Only `analysis_results` is consumed here; the service never performs
/// the upload itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub analysis_results: Vec<AnalysisRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error from the analyzer backend, if the analysis step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,
    /// General error from the upload collaborator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Severity band derived from the synthetic-speech score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Elevated,
    High,
    Critical,
}

impl Severity {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Severity::Critical
        } else if score >= 0.5 {
            Severity::High
        } else if score >= 0.25 {
            Severity::Elevated
        } else {
            Severity::Low
        }
    }
}

/// Display-ready, playable segment (immutable once produced)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSegment {
    /// 1-based position within the resolved list
    pub ordinal: usize,
    /// Upstream chunk identifier; doubles as the segment unit's key
    pub chunk_id: String,
    /// Human-facing label derived from the chunk id
    pub label: String,
    pub score: f64,
    pub severity: Severity,
    /// Corrected window start (seconds)
    pub start: f64,
    /// Corrected window end (seconds), always greater than `start`
    pub end: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_score(0.1), Severity::Low);
        assert_eq!(Severity::from_score(0.25), Severity::Elevated);
        assert_eq!(Severity::from_score(0.49), Severity::Elevated);
        assert_eq!(Severity::from_score(0.5), Severity::High);
        assert_eq!(Severity::from_score(0.75), Severity::Critical);
        assert_eq!(Severity::from_score(1.0), Severity::Critical);
    }

    #[test]
    fn test_report_envelope_parses_wire_format() {
        let json = r#"{
            "analysis_results": [
                {"chunk_id": "chunk_0", "score": 0.91, "start_time_seconds": 0.0, "end_time_seconds": 10.0}
            ],
            "message": "ok"
        }"#;

        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.analysis_results.len(), 1);
        assert_eq!(report.analysis_results[0].chunk_id, "chunk_0");
        assert_eq!(report.message.as_deref(), Some("ok"));
        assert!(report.error.is_none());
    }

    #[test]
    fn test_report_envelope_defaults() {
        let report: AnalysisReport = serde_json::from_str("{}").unwrap();
        assert!(report.analysis_results.is_empty());
    }
}
