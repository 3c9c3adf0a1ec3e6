//! Entitlement table: validated rows turned into typed records
//!
//! Every string field is trimmed. `UserID` and `Entitlement` must be
//! non-empty after trimming; any other field may be blank, and the empty
//! string is an ordinary grouping value.
//!
//! Rows are never deduplicated. A user's held-entitlement set is the
//! deduplicated union over their rows, so duplicate rows have no effect on
//! any downstream computation.

use crate::error::{AnalysisError, Result, RowError};
use crate::schema::{Column, ColumnLayout, ValidatedInput};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What to do when a row fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RowErrorPolicy {
    /// Stop at the first bad row
    FailFast,
    /// Check every row, then fail with all row errors together
    #[default]
    CollectAll,
}

/// One row of a validated entitlement extract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    pub acc_priv_category: String,
    pub role: String,
    pub entitlement: String,
    pub acc_priv_group: String,
    pub title: String,
    pub department: String,
}

impl EntitlementRecord {
    /// Map a raw row through `layout`, trimming every field
    fn from_row(row_index: usize, row: &[String], layout: ColumnLayout) -> std::result::Result<Self, RowError> {
        if row.len() != layout.len() {
            return Err(RowError::field_count(row_index, layout.len(), row.len()));
        }

        let mut record = EntitlementRecord::default();
        for (column, value) in layout.columns().iter().zip(row) {
            let value = value.trim().to_string();
            match column {
                Column::UserId => record.user_id = value,
                Column::Username => record.username = value,
                Column::Tid => record.tid = Some(value),
                Column::AccPrivCategory => record.acc_priv_category = value,
                Column::Role => record.role = value,
                Column::Entitlement => record.entitlement = value,
                Column::AccPrivGroup => record.acc_priv_group = value,
                Column::Title => record.title = value,
                Column::Department => record.department = value,
            }
        }
        Ok(record)
    }

    fn trimmed(self) -> Self {
        let trim = |s: String| s.trim().to_string();
        Self {
            user_id: trim(self.user_id),
            username: trim(self.username),
            tid: self.tid.map(trim),
            acc_priv_category: trim(self.acc_priv_category),
            role: trim(self.role),
            entitlement: trim(self.entitlement),
            acc_priv_group: trim(self.acc_priv_group),
            title: trim(self.title),
            department: trim(self.department),
        }
    }

    fn blank_required(&self, row_index: usize) -> Vec<RowError> {
        let mut errors = Vec::new();
        if self.user_id.is_empty() {
            errors.push(RowError::blank(row_index, Column::UserId));
        }
        if self.entitlement.is_empty() {
            errors.push(RowError::blank(row_index, Column::Entitlement));
        }
        errors
    }
}

/// Per-user view derived from all of a user's rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    /// Smallest non-blank username seen for this user, or empty
    pub username: String,
    pub department: String,
    pub title: String,
    /// Deduplicated union of entitlements over the user's rows
    pub held: BTreeSet<String>,
}

impl UserProfile {
    pub fn holds(&self, entitlement: &str) -> bool {
        self.held.contains(entitlement)
    }
}

/// Validated, normalized entitlement records plus per-user profiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementTable {
    records: Vec<EntitlementRecord>,
    users: BTreeMap<String, UserProfile>,
}

impl EntitlementTable {
    /// Build the table from rows that passed header validation
    pub fn from_input(input: &ValidatedInput, policy: RowErrorPolicy) -> Result<Self> {
        let layout = input.layout();
        let mut collector = RowCollector::new(policy);

        for (row_index, row) in input.rows().iter().enumerate() {
            let line = input.source_line(row_index);
            match EntitlementRecord::from_row(row_index, row, layout) {
                Ok(record) => collector.push(row_index, line, record)?,
                Err(err) => collector.reject(vec![err.at_line(line)])?,
            }
        }

        collector.finish()
    }

    /// Build the table from records supplied by a host application
    ///
    /// Records go through the same trimming and required-field checks as
    /// parsed rows; `row_index` is the position in `records`.
    pub fn from_records(records: Vec<EntitlementRecord>, policy: RowErrorPolicy) -> Result<Self> {
        let mut collector = RowCollector::new(policy);
        for (row_index, record) in records.into_iter().enumerate() {
            collector.push(row_index, None, record.trimmed())?;
        }
        collector.finish()
    }

    fn index(records: Vec<EntitlementRecord>) -> Self {
        // user_id -> (usernames, (department, title) pairs, held)
        type Seen<'a> = (BTreeSet<&'a str>, BTreeSet<(&'a str, &'a str)>, BTreeSet<String>);
        let mut seen: BTreeMap<&str, Seen<'_>> = BTreeMap::new();

        for record in &records {
            let entry = seen.entry(record.user_id.as_str()).or_default();
            if !record.username.is_empty() {
                entry.0.insert(record.username.as_str());
            }
            entry.1.insert((record.department.as_str(), record.title.as_str()));
            entry.2.insert(record.entitlement.clone());
        }

        let users = seen
            .into_iter()
            .map(|(user_id, (usernames, attributes, held))| {
                if attributes.len() > 1 {
                    tracing::warn!(
                        user_id,
                        variants = attributes.len(),
                        "User rows disagree on department/title; using the smallest pair"
                    );
                }
                let (department, title) = attributes.into_iter().next().unwrap_or_default();
                let profile = UserProfile {
                    user_id: user_id.to_string(),
                    username: usernames.into_iter().next().unwrap_or_default().to_string(),
                    department: department.to_string(),
                    title: title.to_string(),
                    held,
                };
                (user_id.to_string(), profile)
            })
            .collect();

        Self { records, users }
    }

    pub fn records(&self) -> &[EntitlementRecord] {
        &self.records
    }

    /// Users in ascending `user_id` order
    pub fn users(&self) -> impl Iterator<Item = &UserProfile> {
        self.users.values()
    }

    pub fn user(&self, user_id: &str) -> Option<&UserProfile> {
        self.users.get(user_id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Applies a [`RowErrorPolicy`] while rows are converted
struct RowCollector {
    policy: RowErrorPolicy,
    records: Vec<EntitlementRecord>,
    errors: Vec<RowError>,
}

impl RowCollector {
    fn new(policy: RowErrorPolicy) -> Self {
        Self {
            policy,
            records: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, row_index: usize, line: Option<u64>, record: EntitlementRecord) -> Result<()> {
        let errors = record.blank_required(row_index);
        if errors.is_empty() {
            self.records.push(record);
            Ok(())
        } else {
            self.reject(errors.into_iter().map(|e| e.at_line(line)).collect())
        }
    }

    fn reject(&mut self, mut errors: Vec<RowError>) -> Result<()> {
        if self.policy == RowErrorPolicy::FailFast {
            errors.truncate(1);
            return Err(AnalysisError::Rows(errors));
        }
        self.errors.append(&mut errors);
        Ok(())
    }

    fn finish(self) -> Result<EntitlementTable> {
        if !self.errors.is_empty() {
            tracing::warn!(
                invalid = self.errors.len(),
                valid = self.records.len(),
                "Rejected entitlement extract with invalid rows"
            );
            return Err(AnalysisError::Rows(self.errors));
        }
        if self.records.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let table = EntitlementTable::index(self.records);
        tracing::debug!(
            records = table.len(),
            users = table.user_count(),
            "Built entitlement table"
        );
        Ok(table)
    }
}
