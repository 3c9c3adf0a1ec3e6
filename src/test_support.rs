//! Fixtures shared by unit tests

use crate::table::{EntitlementRecord, EntitlementTable, RowErrorPolicy};

pub(crate) fn record(user: &str, entitlement: &str, department: &str, title: &str) -> EntitlementRecord {
    EntitlementRecord {
        user_id: user.to_string(),
        username: format!("name-{}", user),
        entitlement: entitlement.to_string(),
        department: department.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

/// Table from `(user, entitlement, department, title)` tuples
pub(crate) fn table(rows: &[(&str, &str, &str, &str)]) -> EntitlementTable {
    let records = rows
        .iter()
        .map(|(u, e, d, t)| record(u, e, d, t))
        .collect();
    EntitlementTable::from_records(records, RowErrorPolicy::CollectAll).unwrap()
}

/// Finance group of `size` users where the first `holders` hold `entitlement`
///
/// Every user also holds `Email` so that nobody has an empty held set.
pub(crate) fn finance(size: usize, holders: usize, entitlement: &str) -> EntitlementTable {
    let mut records = Vec::new();
    for i in 0..size {
        let user = format!("f{:02}", i);
        records.push(record(&user, "Email", "Finance", "Analyst"));
        if i < holders {
            records.push(record(&user, entitlement, "Finance", "Analyst"));
        }
    }
    EntitlementTable::from_records(records, RowErrorPolicy::CollectAll).unwrap()
}
