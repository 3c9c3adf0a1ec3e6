//! Per-group entitlement prevalence
//!
//! For every peer group `G` and every entitlement held by at least one of its
//! members:
//!
//! ```text
//! percentage(G, E) = 100 * holder_count(G, E) / group_size(G)
//! ```
//!
//! Entitlements nobody in `G` holds get no entry. Absence means "not
//! applicable to this group", which is different from a 0% entry.

use crate::error::{AnalysisError, Result};
use crate::peer_group::{PeerGroup, PeerGroups};
use crate::table::EntitlementTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// Prevalence of one entitlement within one peer group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrevalenceEntry {
    /// Distinct members holding the entitlement
    pub holder_count: usize,
    /// Distinct members of the group
    pub group_size: usize,
    /// `100 * holder_count / group_size`, in `[0, 100]`
    pub percentage: f64,
}

impl PrevalenceEntry {
    fn new(holder_count: usize, group_size: usize) -> Self {
        Self {
            holder_count,
            group_size,
            percentage: 100.0 * holder_count as f64 / group_size as f64,
        }
    }

    /// Every member of the group holds the entitlement
    pub fn is_universal(&self) -> bool {
        self.holder_count == self.group_size
    }
}

/// Prevalence entries for one peer group, keyed by entitlement name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPrevalence {
    pub peer_group: PeerGroup,
    pub group_size: usize,
    pub entries: BTreeMap<String, PrevalenceEntry>,
}

impl GroupPrevalence {
    pub fn get(&self, entitlement: &str) -> Option<&PrevalenceEntry> {
        self.entries.get(entitlement)
    }

    /// Entries by descending percentage, then ascending entitlement name
    pub fn ranked(&self) -> Vec<(&str, &PrevalenceEntry)> {
        let mut ranked: Vec<(&str, &PrevalenceEntry)> =
            self.entries.iter().map(|(name, entry)| (name.as_str(), entry)).collect();
        ranked.sort_by(|a, b| b.1.percentage.total_cmp(&a.1.percentage).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// The `n` most widely held entitlements
    pub fn top(&self, n: usize) -> Vec<(&str, &PrevalenceEntry)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// The `n` least widely held entitlements, rarest first
    ///
    /// Only observed entitlements are candidates; unobserved ones have no
    /// entry and never appear here.
    pub fn bottom(&self, n: usize) -> Vec<(&str, &PrevalenceEntry)> {
        let mut ranked: Vec<(&str, &PrevalenceEntry)> =
            self.entries.iter().map(|(name, entry)| (name.as_str(), entry)).collect();
        ranked.sort_by(|a, b| a.1.percentage.total_cmp(&b.1.percentage).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Prevalence matrix over all peer groups, in peer-group order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PrevalenceTable {
    groups: Vec<GroupPrevalence>,
}

impl PrevalenceTable {
    /// Count holders per (group, entitlement) over deduplicated held sets
    ///
    /// Fails with `DegenerateGroup` if a group has no members, which the
    /// peer grouper never produces.
    pub fn compute(table: &EntitlementTable, groups: &PeerGroups) -> Result<Self> {
        let mut out = Vec::with_capacity(groups.len());

        for (peer_group, members) in groups.iter() {
            let group_size = members.len();
            if group_size == 0 {
                return Err(AnalysisError::DegenerateGroup {
                    group: peer_group.to_string(),
                });
            }

            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for user in members.iter().filter_map(|id| table.user(id)) {
                for entitlement in &user.held {
                    *counts.entry(entitlement.as_str()).or_insert(0) += 1;
                }
            }

            let entries = counts
                .into_iter()
                .map(|(name, holders)| (name.to_string(), PrevalenceEntry::new(holders, group_size)))
                .collect();

            out.push(GroupPrevalence {
                peer_group: peer_group.clone(),
                group_size,
                entries,
            });
        }

        tracing::debug!(
            groups = out.len(),
            entries = out.iter().map(|g| g.entries.len()).sum::<usize>(),
            "Computed entitlement prevalence"
        );

        Ok(Self { groups: out })
    }

    pub fn group(&self, peer_group: &PeerGroup) -> Option<&GroupPrevalence> {
        self.groups
            .binary_search_by(|g| g.peer_group.cmp(peer_group))
            .ok()
            .map(|i| &self.groups[i])
    }

    /// Entry for `(peer_group, entitlement)`, `None` when not observed
    pub fn get(&self, peer_group: &PeerGroup, entitlement: &str) -> Option<&PrevalenceEntry> {
        self.group(peer_group).and_then(|g| g.get(entitlement))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupPrevalence> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
