//! End-to-end analysis run
//!
//! ```text
//! bytes ─▶ schema ─▶ table ─▶ peer groups ─▶ prevalence ─▶ classification ─▶ gaps
//!                                                                       └──▶ user anomalies
//! ```
//!
//! Each stage reads the previous stage's result and returns a new value.
//! Configuration is validated up front, and validation errors abort the run
//! before any result exists.

use crate::anomaly::{user_anomalies, UserAnomaly};
use crate::classify::Classification;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::gaps::GapReport;
use crate::peer_group::PeerGroups;
use crate::prevalence::PrevalenceTable;
use crate::schema::{read_csv, validate_rows, ColumnLayout};
use crate::summary::DatasetSummary;
use crate::table::EntitlementTable;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    /// SHA-256 of the raw input, when analysed from bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,
    pub summary: DatasetSummary,
    /// Users left out of peer grouping
    pub excluded_users: usize,
    pub prevalence: PrevalenceTable,
    pub classification: Classification,
    pub gaps: GapReport,
    pub user_anomalies: Vec<UserAnomaly>,
}

/// Analyse a raw CSV extract
pub fn analyze_bytes(bytes: &[u8], config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let input = read_csv(bytes, ColumnLayout::for_tid(config.include_tid))?;
    let table = EntitlementTable::from_input(&input, config.row_error_policy)?;

    let mut report = analyze_table(&table, config)?;
    report.input_sha256 = Some(hex::encode(Sha256::digest(bytes)));
    Ok(report)
}

/// Analyse a CSV extract on disk
pub fn analyze_file<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Reading entitlement extract");
    let bytes = std::fs::read(path)?;
    analyze_bytes(&bytes, config)
}

/// Analyse rows a host application has already decoded
pub fn analyze_rows(header: &[String], rows: Vec<Vec<String>>, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let input = validate_rows(header, rows, ColumnLayout::for_tid(config.include_tid))?;
    let table = EntitlementTable::from_input(&input, config.row_error_policy)?;
    analyze_table(&table, config)
}

/// Run grouping, prevalence, classification and gap detection on a table
pub fn analyze_table(table: &EntitlementTable, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let thresholds = config.thresholds()?;

    let groups = PeerGroups::partition_with(table, config);
    let prevalence = PrevalenceTable::compute(table, &groups)?;
    let classification = Classification::classify(&prevalence, thresholds);
    let gaps = GapReport::detect(table, &groups, &classification);
    let anomalies = user_anomalies(table, &groups, &classification);

    tracing::info!(
        users = table.user_count(),
        groups = groups.len(),
        gaps = gaps.total_gaps(),
        anomalies = anomalies.len(),
        "Analysis complete"
    );

    Ok(AnalysisReport {
        config: config.clone(),
        input_sha256: None,
        summary: DatasetSummary::from_table(table),
        excluded_users: groups.excluded().len(),
        prevalence,
        classification,
        gaps,
        user_anomalies: anomalies,
    })
}
