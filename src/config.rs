//! Analysis configuration
//!
//! One immutable value passed explicitly to every stage. Loaded from TOML,
//! with CLI flags layered on top by the binary.
//!
//! # Example peerscope.toml
//!
//! ```toml
//! peer_group_key = "department-title"
//! baseline_threshold = 90.0
//! anomaly_threshold = 5.0
//! include_tid = true
//! row_error_policy = "fail-fast"
//! ```

use crate::classify::Thresholds;
use crate::error::{AnalysisError, Result};
use crate::peer_group::PeerGroupKey;
use crate::table::RowErrorPolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for one analysis run
///
/// # Example
/// ```
/// use peerscope::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.baseline_threshold, 95.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// How users are partitioned into peer groups
    pub peer_group_key: PeerGroupKey,

    /// Percentage at or above which an entitlement is baseline for a group
    ///
    /// Default: 95.0
    pub baseline_threshold: f64,

    /// Percentage at or below which an entitlement is anomalous for a group
    ///
    /// Default: 2.0. Not required to be below `baseline_threshold`; with
    /// overlapping ranges an entitlement can carry both labels.
    pub anomaly_threshold: f64,

    /// Expect a `TID` column after `Username`
    pub include_tid: bool,

    /// Abort on the first bad row, or report every bad row together
    pub row_error_policy: RowErrorPolicy,

    /// Leave users with a blank title out of department+title groups
    pub exclude_blank_titles: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            peer_group_key: PeerGroupKey::Department,
            baseline_threshold: 95.0,
            anomaly_threshold: 2.0,
            include_tid: false,
            row_error_policy: RowErrorPolicy::CollectAll,
            exclude_blank_titles: false,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    ///
    /// ```no_run
    /// use peerscope::config::AnalysisConfig;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = AnalysisConfig::from_file("peerscope.toml")?;
    /// println!("Baseline at {}%", config.baseline_threshold);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// An unknown grouping mode is a configuration error, not a syntax
    /// error, so it is checked before the typed parse.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let table: toml::Table = toml::from_str(content).context("Failed to parse TOML")?;
        if let Some(value) = table.get("peer_group_key") {
            check_peer_group_key(value)?;
        }

        let config: Self = toml::Value::Table(table)
            .try_into()
            .context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Both thresholds must be finite percentages in `[0, 100]`
    pub fn validate(&self) -> Result<()> {
        self.thresholds().map(|_| ())
    }

    /// Validated threshold pair for the classifier
    pub fn thresholds(&self) -> Result<Thresholds> {
        Thresholds::new(self.baseline_threshold, self.anomaly_threshold)
    }
}

fn check_peer_group_key(value: &toml::Value) -> Result<PeerGroupKey> {
    value.clone().try_into().map_err(|_| AnalysisError::Config {
        option: "peer_group_key",
        value: value.as_str().map_or_else(|| value.to_string(), String::from),
        reason: "must be one of: department, department-title".to_string(),
    })
}

/// Reject a percentage outside `[0, 100]` or not finite
pub(crate) fn check_percentage(option: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(AnalysisError::Config {
            option,
            value: value.to_string(),
            reason: "must be a percentage in [0, 100]".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.peer_group_key, PeerGroupKey::Department);
        assert_eq!(config.baseline_threshold, 95.0);
        assert_eq!(config.anomaly_threshold, 2.0);
        assert!(!config.include_tid);
        assert_eq!(config.row_error_policy, RowErrorPolicy::CollectAll);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            peer_group_key = "department-title"
            baseline_threshold = 90.0
            anomaly_threshold = 5.0
            include_tid = true
            row_error_policy = "fail-fast"
            exclude_blank_titles = true
        "#;

        let config = AnalysisConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.peer_group_key, PeerGroupKey::DepartmentTitle);
        assert_eq!(config.baseline_threshold, 90.0);
        assert_eq!(config.anomaly_threshold, 5.0);
        assert!(config.include_tid);
        assert_eq!(config.row_error_policy, RowErrorPolicy::FailFast);
        assert!(config.exclude_blank_titles);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("baseline_threshold = 70.0").unwrap();
        assert_eq!(config.baseline_threshold, 70.0);
        assert_eq!(config.anomaly_threshold, 2.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(AnalysisConfig::from_toml_str("baseline = 70.0").is_err());
    }

    #[test]
    fn test_unknown_peer_group_key_is_config_error() {
        let err = AnalysisConfig::from_toml_str("peer_group_key = \"team\"").unwrap_err();
        match err.downcast_ref::<AnalysisError>() {
            Some(AnalysisError::Config { option, value, .. }) => {
                assert_eq!(*option, "peer_group_key");
                assert_eq!(value, "team");
            }
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = AnalysisConfig::from_toml_str("baseline_threshold = ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_out_of_range_threshold_in_toml() {
        let err = AnalysisConfig::from_toml_str("anomaly_threshold = 120.0").unwrap_err();
        assert!(err.to_string().contains("anomaly_threshold"));
    }

    #[test]
    fn test_invalid_thresholds() {
        for bad in [-0.1, 100.5, f64::NAN, f64::INFINITY] {
            let config = AnalysisConfig {
                baseline_threshold: bad,
                ..Default::default()
            };
            match config.validate() {
                Err(AnalysisError::Config { option, .. }) => {
                    assert_eq!(option, "baseline_threshold")
                }
                other => panic!("Expected Config error for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_boundaries_are_valid() {
        let config = AnalysisConfig {
            baseline_threshold: 100.0,
            anomaly_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlapping_thresholds_allowed() {
        let config = AnalysisConfig {
            baseline_threshold: 10.0,
            anomaly_threshold: 50.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
