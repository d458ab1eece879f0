//! Analysis report ingestion and segment resolution

pub mod resolver;
pub mod types;

pub use resolver::resolve;
pub use types::{AnalysisRecord, AnalysisReport, AnalysisSegment, Severity};
