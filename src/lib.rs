//! Peerscope - peer-group entitlement review
//!
//! This library validates per-user entitlement extracts, partitions users
//! into peer groups, measures how widely each entitlement is held within a
//! group, and derives baseline access, anomalous access and per-user gaps.
//!
//! ```
//! use peerscope::config::AnalysisConfig;
//! use peerscope::pipeline::analyze_bytes;
//!
//! let csv = "\
//! UserID,Username,Acc Priv Category,Role,Entitlement,Acc Priv Group,Title,Department
//! u1,alice,Priv,Clerk,Read,G1,Analyst,Finance
//! u2,bob,Priv,Clerk,Write,G1,Analyst,Finance
//! ";
//! let config = AnalysisConfig { baseline_threshold: 50.0, ..Default::default() };
//! let report = analyze_bytes(csv.as_bytes(), &config).unwrap();
//! assert_eq!(report.gaps.total_gaps(), 2);
//! ```

pub mod anomaly;
pub mod classify;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod gaps;
pub mod json_output;
pub mod peer_group;
pub mod pipeline;
pub mod prevalence;
pub mod schema;
pub mod summary;
pub mod table;
pub mod text_output;

#[cfg(test)]
mod test_support;

pub use error::{AnalysisError, Result, RowError};
