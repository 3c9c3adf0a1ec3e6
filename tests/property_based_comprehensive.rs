//! Property-based tests for the analysis pipeline
//!
//! Properties covered:
//! 1. Determinism across repeated runs and row order
//! 2. Percentage bounds, and 100% exactly when every member holds
//! 3. Every baseline entitlement is either held or a gap, never both
//! 4. Threshold monotonicity for baseline and anomaly sets
//! 5. Appending a duplicate row changes nothing

use peerscope::config::AnalysisConfig;
use peerscope::peer_group::PeerGroupKey;
use peerscope::pipeline::{analyze_bytes, AnalysisReport};
use proptest::prelude::*;

const HEADER: &str =
    "UserID,Username,Acc Priv Category,Role,Entitlement,Acc Priv Group,Title,Department";

/// (user, entitlement) pairs; department and title derive from the user so
/// that every user has consistent attributes
fn rows_strategy() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..12, 0u8..8), 1..60)
}

fn to_csv(rows: &[(u8, u8)]) -> String {
    let mut csv = format!("{}\n", HEADER);
    for (user, entitlement) in rows {
        let department = ["Finance", "Ops", "Legal"][(*user % 3) as usize];
        let title = ["Analyst", "Lead"][(*user % 2) as usize];
        csv.push_str(&format!(
            "u{},name{},Priv,Role{},E{},G1,{},{}\n",
            user, user, entitlement, entitlement, title, department
        ));
    }
    csv
}

fn run(rows: &[(u8, u8)], config: &AnalysisConfig) -> AnalysisReport {
    analyze_bytes(to_csv(rows).as_bytes(), config).unwrap()
}

fn key_strategy() -> impl Strategy<Value = PeerGroupKey> {
    prop_oneof![
        Just(PeerGroupKey::Department),
        Just(PeerGroupKey::DepartmentTitle)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_pipeline_is_deterministic(
        rows in rows_strategy(),
        key in key_strategy(),
        baseline in 0.0f64..=100.0,
        anomaly in 0.0f64..=100.0,
    ) {
        let config = AnalysisConfig {
            peer_group_key: key,
            baseline_threshold: baseline,
            anomaly_threshold: anomaly,
            ..Default::default()
        };
        let first = run(&rows, &config);
        let second = run(&rows, &config);
        prop_assert_eq!(&first, &second);

        // Row order does not matter (digest of the raw bytes aside)
        let mut reversed = rows.clone();
        reversed.reverse();
        let third = run(&reversed, &config);
        prop_assert_eq!(&first.prevalence, &third.prevalence);
        prop_assert_eq!(&first.classification, &third.classification);
        prop_assert_eq!(&first.gaps, &third.gaps);
        prop_assert_eq!(&first.user_anomalies, &third.user_anomalies);
    }

    #[test]
    fn prop_percentages_bounded(rows in rows_strategy(), key in key_strategy()) {
        let config = AnalysisConfig { peer_group_key: key, ..Default::default() };
        let report = run(&rows, &config);

        for group in report.prevalence.iter() {
            prop_assert!(group.group_size > 0);
            for entry in group.entries.values() {
                prop_assert!(entry.holder_count >= 1);
                prop_assert!(entry.holder_count <= entry.group_size);
                prop_assert!((0.0..=100.0).contains(&entry.percentage));
                prop_assert_eq!(entry.percentage == 100.0, entry.holder_count == entry.group_size);
            }
        }
    }

    #[test]
    fn prop_baseline_held_xor_gap(
        rows in rows_strategy(),
        key in key_strategy(),
        baseline in 0.0f64..=100.0,
    ) {
        let config = AnalysisConfig {
            peer_group_key: key,
            baseline_threshold: baseline,
            ..Default::default()
        };
        let csv = to_csv(&rows);
        let report = analyze_bytes(csv.as_bytes(), &config).unwrap();

        for user in report.gaps.users() {
            let held: std::collections::BTreeSet<String> = rows
                .iter()
                .filter(|(u, _)| format!("u{}", u) == user.user_id)
                .map(|(_, e)| format!("E{}", e))
                .collect();
            let group = report.classification.group(&user.peer_group).unwrap();
            for name in group.baseline_names() {
                let is_held = held.contains(name);
                let is_gap = user.missing.iter().any(|m| m == name);
                prop_assert!(is_held ^ is_gap);
            }
            for missing in &user.missing {
                prop_assert!(group.is_baseline(missing));
            }
        }
    }

    #[test]
    fn prop_threshold_monotonicity(
        rows in rows_strategy(),
        low in 0.0f64..=100.0,
        high in 0.0f64..=100.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let at = |baseline: f64, anomaly: f64| {
            run(&rows, &AnalysisConfig {
                baseline_threshold: baseline,
                anomaly_threshold: anomaly,
                ..Default::default()
            })
        };
        let loose = at(low, high);
        let strict = at(high, low);

        for (l, s) in loose.classification.iter().zip(strict.classification.iter()) {
            prop_assert_eq!(&l.peer_group, &s.peer_group);
            // Raising the baseline threshold never grows the baseline set
            prop_assert!(s.baseline.len() <= l.baseline.len());
            // Lowering the anomaly threshold never grows the anomaly set
            prop_assert!(s.anomalous.len() <= l.anomalous.len());
        }
    }

    #[test]
    fn prop_duplicate_row_is_idempotent(
        rows in rows_strategy(),
        pick in any::<prop::sample::Index>(),
        key in key_strategy(),
    ) {
        let config = AnalysisConfig {
            peer_group_key: key,
            baseline_threshold: 60.0,
            anomaly_threshold: 30.0,
            ..Default::default()
        };
        let mut duplicated = rows.clone();
        duplicated.push(rows[pick.index(rows.len())]);

        let before = run(&rows, &config);
        let after = run(&duplicated, &config);
        prop_assert_eq!(&before.prevalence, &after.prevalence);
        prop_assert_eq!(&before.classification, &after.classification);
        prop_assert_eq!(&before.gaps, &after.gaps);
        prop_assert_eq!(after.summary.total_records, before.summary.total_records + 1);
    }
}
