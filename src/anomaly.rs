//! Per-user anomalous access
//!
//! Lists, for every grouped user, each entitlement they hold that is
//! anomalous (rarely held) within their own peer group. This is the
//! user-level view of the group-level anomaly sets.

use crate::classify::Classification;
use crate::peer_group::{PeerGroup, PeerGroups};
use crate::table::EntitlementTable;
use serde::Serialize;

/// A user holding an entitlement that is rare among their peers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAnomaly {
    pub peer_group: PeerGroup,
    pub user_id: String,
    pub username: String,
    pub entitlement: String,
    /// Prevalence of the entitlement in the user's group
    pub percentage: f64,
}

/// Anomalous holdings ordered by peer group, user_id, then entitlement
pub fn user_anomalies(
    table: &EntitlementTable,
    groups: &PeerGroups,
    classification: &Classification,
) -> Vec<UserAnomaly> {
    let mut anomalies = Vec::new();

    for (peer_group, members) in groups.iter() {
        let Some(classified) = classification.group(peer_group) else {
            continue;
        };
        if classified.anomalous.is_empty() {
            continue;
        }

        let mut rare: Vec<(&str, f64)> = classified
            .anomalous
            .iter()
            .map(|e| (e.entitlement.as_str(), e.percentage))
            .collect();
        rare.sort_by(|a, b| a.0.cmp(b.0));

        for user in members.iter().filter_map(|id| table.user(id)) {
            for (entitlement, percentage) in &rare {
                if user.holds(entitlement) {
                    anomalies.push(UserAnomaly {
                        peer_group: peer_group.clone(),
                        user_id: user.user_id.clone(),
                        username: user.username.clone(),
                        entitlement: entitlement.to_string(),
                        percentage: *percentage,
                    });
                }
            }
        }
    }

    tracing::debug!(count = anomalies.len(), "Collected per-user anomalous access");
    anomalies
}
