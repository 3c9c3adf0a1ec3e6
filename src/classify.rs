//! Baseline / anomaly classification of prevalence entries
//!
//! - Baseline: `percentage >= baseline_threshold`
//! - Anomaly: `percentage <= anomaly_threshold`
//!
//! The two thresholds are independent. If their ranges overlap an entry can
//! be both; if it falls strictly between them it is neither.

use crate::config::check_percentage;
use crate::error::Result;
use crate::peer_group::PeerGroup;
use crate::prevalence::{PrevalenceEntry, PrevalenceTable};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Validated threshold pair, both percentages in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    baseline: f64,
    anomaly: f64,
}

impl Thresholds {
    /// Fails with `Config` if either value is outside `[0, 100]`
    pub fn new(baseline: f64, anomaly: f64) -> Result<Self> {
        Ok(Self {
            baseline: check_percentage("baseline_threshold", baseline)?,
            anomaly: check_percentage("anomaly_threshold", anomaly)?,
        })
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn anomaly(&self) -> f64 {
        self.anomaly
    }

    /// Labels for an entry with the given percentage
    pub fn label(&self, percentage: f64) -> Labels {
        Labels {
            baseline: percentage >= self.baseline,
            anomaly: percentage <= self.anomaly,
        }
    }
}

/// Labels carried by one prevalence entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub baseline: bool,
    pub anomaly: bool,
}

impl Labels {
    pub fn is_unlabelled(&self) -> bool {
        !self.baseline && !self.anomaly
    }
}

/// An entitlement with its prevalence in a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEntitlement {
    pub entitlement: String,
    pub holder_count: usize,
    pub percentage: f64,
}

impl ClassifiedEntitlement {
    fn new(entitlement: &str, entry: &PrevalenceEntry) -> Self {
        Self {
            entitlement: entitlement.to_string(),
            holder_count: entry.holder_count,
            percentage: entry.percentage,
        }
    }

    /// Descending percentage, then ascending entitlement name
    fn presentation_order(a: &Self, b: &Self) -> Ordering {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.entitlement.cmp(&b.entitlement))
    }
}

/// Baseline and anomalous entitlements of one peer group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedGroup {
    pub peer_group: PeerGroup,
    pub group_size: usize,
    pub baseline: Vec<ClassifiedEntitlement>,
    pub anomalous: Vec<ClassifiedEntitlement>,
}

impl ClassifiedGroup {
    /// Baseline entitlement names, without percentages
    pub fn baseline_names(&self) -> BTreeSet<&str> {
        self.baseline.iter().map(|e| e.entitlement.as_str()).collect()
    }

    pub fn anomalous_names(&self) -> BTreeSet<&str> {
        self.anomalous.iter().map(|e| e.entitlement.as_str()).collect()
    }

    pub fn is_baseline(&self, entitlement: &str) -> bool {
        self.baseline.iter().any(|e| e.entitlement == entitlement)
    }

    pub fn is_anomalous(&self, entitlement: &str) -> bool {
        self.anomalous.iter().any(|e| e.entitlement == entitlement)
    }
}

/// Classification of every peer group, in peer-group order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub thresholds: Thresholds,
    pub groups: Vec<ClassifiedGroup>,
}

impl Classification {
    pub fn classify(prevalence: &PrevalenceTable, thresholds: Thresholds) -> Self {
        let groups: Vec<ClassifiedGroup> = prevalence
            .iter()
            .map(|group| {
                let mut baseline = Vec::new();
                let mut anomalous = Vec::new();

                for (name, entry) in &group.entries {
                    let labels = thresholds.label(entry.percentage);
                    if labels.baseline {
                        baseline.push(ClassifiedEntitlement::new(name, entry));
                    }
                    if labels.anomaly {
                        anomalous.push(ClassifiedEntitlement::new(name, entry));
                    }
                }

                baseline.sort_by(ClassifiedEntitlement::presentation_order);
                anomalous.sort_by(ClassifiedEntitlement::presentation_order);

                ClassifiedGroup {
                    peer_group: group.peer_group.clone(),
                    group_size: group.group_size,
                    baseline,
                    anomalous,
                }
            })
            .collect();

        tracing::debug!(
            baseline_threshold = thresholds.baseline(),
            anomaly_threshold = thresholds.anomaly(),
            baseline = groups.iter().map(|g| g.baseline.len()).sum::<usize>(),
            anomalous = groups.iter().map(|g| g.anomalous.len()).sum::<usize>(),
            "Classified entitlements"
        );

        Self { thresholds, groups }
    }

    pub fn group(&self, peer_group: &PeerGroup) -> Option<&ClassifiedGroup> {
        self.groups
            .binary_search_by(|g| g.peer_group.cmp(peer_group))
            .ok()
            .map(|i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedGroup> {
        self.groups.iter()
    }
}
