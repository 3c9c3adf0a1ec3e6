//! JSON output format for analysis reports

use crate::gaps::UserGaps;
use crate::pipeline::AnalysisReport;
use serde::Serialize;

/// Gap-only JSON document (`--gaps-only`)
#[derive(Debug, Serialize)]
struct JsonGapReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    input_sha256: Option<&'a str>,
    baseline_threshold: f64,
    total_gaps: usize,
    users: Vec<&'a UserGaps>,
}

/// Render the full report as pretty-printed JSON
pub fn to_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Render only users that have gaps
pub fn gaps_to_json(report: &AnalysisReport) -> serde_json::Result<String> {
    let doc = JsonGapReport {
        input_sha256: report.input_sha256.as_deref(),
        baseline_threshold: report.config.baseline_threshold,
        total_gaps: report.gaps.total_gaps(),
        users: report.gaps.with_gaps().collect(),
    };
    serde_json::to_string_pretty(&doc)
}
