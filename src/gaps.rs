//! Gap detection: baseline entitlements a user does not hold
//!
//! `gaps(u) = baseline_names(group(u)) \ held(u)`. Users with no gaps stay
//! in the report with an empty list; filtering them out is up to the
//! caller.

use crate::classify::Classification;
use crate::peer_group::{PeerGroup, PeerGroups};
use crate::table::EntitlementTable;
use serde::Serialize;

/// One missing baseline entitlement for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapRecord {
    pub user_id: String,
    pub peer_group: PeerGroup,
    pub missing_entitlement: String,
}

/// All gaps of one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserGaps {
    pub peer_group: PeerGroup,
    pub user_id: String,
    /// Missing baseline entitlements, ascending
    pub missing: Vec<String>,
}

impl UserGaps {
    /// User holds every baseline entitlement of their group
    pub fn is_full_match(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Gaps for every grouped user, by peer group then user_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GapReport {
    users: Vec<UserGaps>,
}

impl GapReport {
    pub fn detect(table: &EntitlementTable, groups: &PeerGroups, classification: &Classification) -> Self {
        let mut users = Vec::with_capacity(table.user_count());

        for (peer_group, members) in groups.iter() {
            let baseline = classification
                .group(peer_group)
                .map(|g| g.baseline_names())
                .unwrap_or_default();

            for profile in members.iter().filter_map(|id| table.user(id)) {
                // BTreeSet iteration keeps `missing` sorted
                let missing = baseline
                    .iter()
                    .filter(|name| !profile.holds(name))
                    .map(|name| name.to_string())
                    .collect();

                users.push(UserGaps {
                    peer_group: peer_group.clone(),
                    user_id: profile.user_id.clone(),
                    missing,
                });
            }
        }

        let report = Self { users };
        tracing::debug!(
            users = report.users.len(),
            with_gaps = report.with_gaps().count(),
            gaps = report.total_gaps(),
            "Detected baseline gaps"
        );
        report
    }

    /// Every user, including full matches
    pub fn users(&self) -> &[UserGaps] {
        &self.users
    }

    pub fn user(&self, user_id: &str) -> Option<&UserGaps> {
        self.users.iter().find(|u| u.user_id == user_id)
    }

    /// Users missing at least one baseline entitlement
    pub fn with_gaps(&self) -> impl Iterator<Item = &UserGaps> {
        self.users.iter().filter(|u| !u.is_full_match())
    }

    /// Flattened `(user, group, missing entitlement)` records
    pub fn records(&self) -> impl Iterator<Item = GapRecord> + '_ {
        self.users.iter().flat_map(|u| {
            u.missing.iter().map(move |name| GapRecord {
                user_id: u.user_id.clone(),
                peer_group: u.peer_group.clone(),
                missing_entitlement: name.clone(),
            })
        })
    }

    pub fn total_gaps(&self) -> usize {
        self.users.iter().map(|u| u.missing.len()).sum()
    }
}
