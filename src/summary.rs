//! Dataset metrics for an entitlement extract

use crate::table::EntitlementTable;
use serde::Serialize;
use std::collections::BTreeSet;

/// Distinct-value counts over the whole table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    pub unique_users: usize,
    pub unique_departments: usize,
    pub unique_titles: usize,
    pub unique_roles: usize,
    pub unique_access_groups: usize,
    pub unique_access_categories: usize,
    pub unique_entitlements: usize,
    /// Users whose resolved title is blank
    pub users_without_title: usize,
}

impl DatasetSummary {
    pub fn from_table(table: &EntitlementTable) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
            values.collect::<BTreeSet<_>>().len()
        }

        let records = table.records();
        Self {
            total_records: records.len(),
            unique_users: table.user_count(),
            unique_departments: distinct(records.iter().map(|r| r.department.as_str())),
            unique_titles: distinct(records.iter().map(|r| r.title.as_str())),
            unique_roles: distinct(records.iter().map(|r| r.role.as_str())),
            unique_access_groups: distinct(records.iter().map(|r| r.acc_priv_group.as_str())),
            unique_access_categories: distinct(records.iter().map(|r| r.acc_priv_category.as_str())),
            unique_entitlements: distinct(records.iter().map(|r| r.entitlement.as_str())),
            users_without_title: table.users().filter(|u| u.title.is_empty()).count(),
        }
    }
}
