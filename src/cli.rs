//! CLI argument parsing for Peerscope

use crate::config::AnalysisConfig;
use crate::csv_output::CsvTable;
use crate::peer_group::PeerGroupKey;
use crate::table::RowErrorPolicy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis reports
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "peerscope")]
#[command(version)]
#[command(about = "Peer-group entitlement review: baseline access, anomalies and gaps", long_about = None)]
pub struct Cli {
    /// Entitlement extract (CSV, UTF-8)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// TOML configuration file (flags override its values)
    #[arg(short = 'C', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Peer group definition
    #[arg(short = 'g', long = "peer-group", value_enum)]
    pub peer_group: Option<PeerGroupKey>,

    /// Baseline threshold in percent (default: 95.0)
    #[arg(short = 'b', long = "baseline-threshold", value_name = "PCT")]
    pub baseline_threshold: Option<f64>,

    /// Anomaly threshold in percent (default: 2.0)
    #[arg(short = 'a', long = "anomaly-threshold", value_name = "PCT")]
    pub anomaly_threshold: Option<f64>,

    /// Input has a TID column after Username
    #[arg(long = "with-tid")]
    pub with_tid: bool,

    /// Row validation policy
    #[arg(long = "row-errors", value_enum)]
    pub row_errors: Option<RowErrorPolicy>,

    /// Leave users without a title out of department+title peer groups
    #[arg(long = "exclude-blank-titles")]
    pub exclude_blank_titles: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Table to export with --format csv
    #[arg(long = "table", value_enum, default_value = "gaps")]
    pub table: CsvTable,

    /// Only report users with baseline gaps
    #[arg(long = "gaps-only")]
    pub gaps_only: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Layer command-line overrides on top of `base`
    pub fn apply(&self, base: AnalysisConfig) -> AnalysisConfig {
        AnalysisConfig {
            peer_group_key: self.peer_group.unwrap_or(base.peer_group_key),
            baseline_threshold: self.baseline_threshold.unwrap_or(base.baseline_threshold),
            anomaly_threshold: self.anomaly_threshold.unwrap_or(base.anomaly_threshold),
            include_tid: self.with_tid || base.include_tid,
            row_error_policy: self.row_errors.unwrap_or(base.row_error_policy),
            exclude_blank_titles: self.exclude_blank_titles || base.exclude_blank_titles,
        }
    }
}
