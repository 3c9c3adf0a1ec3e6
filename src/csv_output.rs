//! CSV output format for analysis reports
//!
//! One table per rendering, for spreadsheet review. Percentages are written
//! with two decimals.

use crate::classify::ClassifiedEntitlement;
use crate::peer_group::PeerGroup;
use crate::pipeline::AnalysisReport;
use clap::ValueEnum;

/// Which report table to export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CsvTable {
    /// Baseline entitlements per peer group
    Baseline,
    /// Anomalous entitlements per peer group
    Anomalies,
    /// Missing baseline entitlements per user (default)
    #[default]
    Gaps,
    /// Full prevalence matrix
    Prevalence,
    /// Users holding anomalous entitlements
    UserAnomalies,
}

fn title(group: &PeerGroup) -> &str {
    group.title.as_deref().unwrap_or("")
}

fn percent(value: f64) -> String {
    format!("{:.2}", value)
}

/// Render `table` from `report` as CSV text with a header row
pub fn to_csv(report: &AnalysisReport, table: CsvTable) -> csv::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    match table {
        CsvTable::Baseline | CsvTable::Anomalies => {
            writer.write_record(["Department", "Title", "Entitlement", "Holders", "Group Size", "Percentage"])?;
            for group in report.classification.iter() {
                let entries: &[ClassifiedEntitlement] = if table == CsvTable::Baseline {
                    &group.baseline
                } else {
                    &group.anomalous
                };
                for entry in entries {
                    writer.write_record([
                        group.peer_group.department.as_str(),
                        title(&group.peer_group),
                        entry.entitlement.as_str(),
                        entry.holder_count.to_string().as_str(),
                        group.group_size.to_string().as_str(),
                        percent(entry.percentage).as_str(),
                    ])?;
                }
            }
        }
        CsvTable::Prevalence => {
            writer.write_record(["Department", "Title", "Entitlement", "Holders", "Group Size", "Percentage"])?;
            for group in report.prevalence.iter() {
                for (name, entry) in group.ranked() {
                    writer.write_record([
                        group.peer_group.department.as_str(),
                        title(&group.peer_group),
                        name,
                        entry.holder_count.to_string().as_str(),
                        entry.group_size.to_string().as_str(),
                        percent(entry.percentage).as_str(),
                    ])?;
                }
            }
        }
        CsvTable::Gaps => {
            writer.write_record(["UserID", "Department", "Title", "Missing Entitlement"])?;
            for gap in report.gaps.records() {
                writer.write_record([
                    gap.user_id.as_str(),
                    gap.peer_group.department.as_str(),
                    title(&gap.peer_group),
                    gap.missing_entitlement.as_str(),
                ])?;
            }
        }
        CsvTable::UserAnomalies => {
            writer.write_record(["Department", "Title", "UserID", "Username", "Entitlement", "Percentage"])?;
            for anomaly in &report.user_anomalies {
                writer.write_record([
                    anomaly.peer_group.department.as_str(),
                    title(&anomaly.peer_group),
                    anomaly.user_id.as_str(),
                    anomaly.username.as_str(),
                    anomaly.entitlement.as_str(),
                    percent(anomaly.percentage).as_str(),
                ])?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
