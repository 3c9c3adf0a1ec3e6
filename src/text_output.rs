//! Human-readable text rendering of an analysis report

use crate::pipeline::AnalysisReport;
use std::fmt;

const RULE: &str = "─────────────────────────────────────────";

/// Full text report: metrics, per-group classification, anomalies, gaps
pub fn render(report: &AnalysisReport) -> String {
    TextReport {
        report,
        gaps_only: false,
    }
    .to_string()
}

/// Gap section only
pub fn render_gaps_only(report: &AnalysisReport) -> String {
    TextReport {
        report,
        gaps_only: true,
    }
    .to_string()
}

struct TextReport<'a> {
    report: &'a AnalysisReport,
    gaps_only: bool,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.gaps_only {
            write_header(self.report, f)?;
            write_summary(self.report, f)?;
            write_groups(self.report, f)?;
            write_anomalies(self.report, f)?;
        }
        write_gaps(self.report, f)
    }
}

fn write_header(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let config = &report.config;
    writeln!(f, "=== Entitlement Review ===")?;
    writeln!(f, "Peer group:  {}", config.peer_group_key)?;
    writeln!(f, "Baseline:    >= {}%", config.baseline_threshold)?;
    writeln!(f, "Anomaly:     <= {}%", config.anomaly_threshold)?;
    if let Some(digest) = &report.input_sha256 {
        writeln!(f, "Input:       sha256:{}", digest)?;
    }
    if report.excluded_users > 0 {
        writeln!(f, "Excluded:    {} user(s) without a title", report.excluded_users)?;
    }
    writeln!(f)
}

fn write_summary(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = &report.summary;
    writeln!(f, "Dataset Metrics")?;
    writeln!(f, "{}", RULE)?;
    writeln!(f, "  Total records:            {}", s.total_records)?;
    writeln!(f, "  Unique users:             {}", s.unique_users)?;
    writeln!(f, "  Unique departments:       {}", s.unique_departments)?;
    writeln!(f, "  Unique titles:            {}", s.unique_titles)?;
    writeln!(f, "  Unique roles:             {}", s.unique_roles)?;
    writeln!(f, "  Unique access groups:     {}", s.unique_access_groups)?;
    writeln!(f, "  Unique access categories: {}", s.unique_access_categories)?;
    writeln!(f, "  Unique entitlements:      {}", s.unique_entitlements)?;
    writeln!(f, "  Users without title:      {}", s.users_without_title)?;
    writeln!(f)
}

fn write_groups(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for group in report.classification.iter() {
        writeln!(f, "[{}] {} user(s)", group.peer_group, group.group_size)?;
        if group.baseline.is_empty() {
            writeln!(f, "  baseline:  (none)")?;
        }
        for entry in &group.baseline {
            writeln!(
                f,
                "  baseline:  {:<32} {:>6.2}% ({}/{})",
                entry.entitlement, entry.percentage, entry.holder_count, group.group_size
            )?;
        }
        for entry in &group.anomalous {
            writeln!(
                f,
                "  anomalous: {:<32} {:>6.2}% ({}/{})",
                entry.entitlement, entry.percentage, entry.holder_count, group.group_size
            )?;
        }
    }
    writeln!(f)
}

fn write_anomalies(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Anomalous Access ({})", report.user_anomalies.len())?;
    writeln!(f, "{}", RULE)?;
    for a in &report.user_anomalies {
        writeln!(
            f,
            "  {} ({}) [{}]: {} {:.2}%",
            a.user_id, a.username, a.peer_group, a.entitlement, a.percentage
        )?;
    }
    writeln!(f)
}

fn write_gaps(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let with_gaps: Vec<_> = report.gaps.with_gaps().collect();
    writeln!(
        f,
        "Baseline Gaps ({} user(s), {} missing)",
        with_gaps.len(),
        report.gaps.total_gaps()
    )?;
    writeln!(f, "{}", RULE)?;
    for user in with_gaps {
        writeln!(f, "  {} [{}]: {}", user.user_id, user.peer_group, user.missing.join(", "))?;
    }
    Ok(())
}
