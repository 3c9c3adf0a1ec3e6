//! Peer grouping of users by department, or by department and title
//!
//! Key equality is exact and case-sensitive. Groups only ever come from
//! observed users, and membership depends on the user set alone, never on
//! row order.

use crate::config::AnalysisConfig;
use crate::table::{EntitlementTable, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which user attributes define a peer group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PeerGroupKey {
    /// All users in the same department are peers
    #[default]
    Department,
    /// Users sharing both department and title are peers
    DepartmentTitle,
}

impl PeerGroupKey {
    /// Peer group a user falls into under this key
    pub fn group_of(self, user: &UserProfile) -> PeerGroup {
        match self {
            PeerGroupKey::Department => PeerGroup::department(&user.department),
            PeerGroupKey::DepartmentTitle => {
                PeerGroup::department_title(&user.department, &user.title)
            }
        }
    }
}

impl fmt::Display for PeerGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerGroupKey::Department => write!(f, "Department"),
            PeerGroupKey::DepartmentTitle => write!(f, "Department + Title"),
        }
    }
}

/// Identity of a peer group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerGroup {
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PeerGroup {
    pub fn department(department: &str) -> Self {
        Self {
            department: department.to_string(),
            title: None,
        }
    }

    pub fn department_title(department: &str, title: &str) -> Self {
        Self {
            department: department.to_string(),
            title: Some(title.to_string()),
        }
    }
}

impl fmt::Display for PeerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} / {}", self.department, title),
            None => write!(f, "{}", self.department),
        }
    }
}

/// Partition of users into peer groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerGroups {
    key: PeerGroupKey,
    groups: BTreeMap<PeerGroup, BTreeSet<String>>,
    membership: BTreeMap<String, PeerGroup>,
    excluded: BTreeSet<String>,
}

impl PeerGroups {
    /// Partition every user of `table` under `key`
    pub fn partition(table: &EntitlementTable, key: PeerGroupKey) -> Self {
        Self::build(table, key, false)
    }

    /// Partition using the grouping options of `config`
    ///
    /// With `exclude_blank_titles` under department+title grouping, users
    /// whose title is blank are left out of every group.
    pub fn partition_with(table: &EntitlementTable, config: &AnalysisConfig) -> Self {
        let exclude = config.exclude_blank_titles && config.peer_group_key == PeerGroupKey::DepartmentTitle;
        Self::build(table, config.peer_group_key, exclude)
    }

    /// Groups with exactly the given members, bypassing partitioning
    #[cfg(test)]
    pub(crate) fn from_groups(key: PeerGroupKey, groups: BTreeMap<PeerGroup, BTreeSet<String>>) -> Self {
        let membership = groups
            .iter()
            .flat_map(|(group, members)| members.iter().map(move |id| (id.clone(), group.clone())))
            .collect();
        Self {
            key,
            groups,
            membership,
            excluded: BTreeSet::new(),
        }
    }

    fn build(table: &EntitlementTable, key: PeerGroupKey, exclude_blank_titles: bool) -> Self {
        let mut groups: BTreeMap<PeerGroup, BTreeSet<String>> = BTreeMap::new();
        let mut membership = BTreeMap::new();
        let mut excluded = BTreeSet::new();

        for user in table.users() {
            if exclude_blank_titles && user.title.is_empty() {
                excluded.insert(user.user_id.clone());
                continue;
            }
            let group = key.group_of(user);
            groups
                .entry(group.clone())
                .or_default()
                .insert(user.user_id.clone());
            membership.insert(user.user_id.clone(), group);
        }

        tracing::debug!(
            key = %key,
            groups = groups.len(),
            excluded = excluded.len(),
            "Partitioned users into peer groups"
        );

        Self {
            key,
            groups,
            membership,
            excluded,
        }
    }

    pub fn key(&self) -> PeerGroupKey {
        self.key
    }

    /// Groups in ascending order, each with its members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (&PeerGroup, &BTreeSet<String>)> {
        self.groups.iter()
    }

    pub fn members(&self, group: &PeerGroup) -> Option<&BTreeSet<String>> {
        self.groups.get(group)
    }

    pub fn group_of(&self, user_id: &str) -> Option<&PeerGroup> {
        self.membership.get(user_id)
    }

    /// Users left out of grouping (blank title exclusion)
    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
