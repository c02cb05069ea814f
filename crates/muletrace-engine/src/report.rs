//! Report assembly.
//!
//! Builds the ranked suspicious-account list, the fraud-ring list, and the
//! run summary from scored detection output.

use crate::types::{FraudRing, Summary, SuspiciousAccount};
use muletrace_core::error::{EngineError, Result};
use muletrace_detect::graph::TransactionGraph;
use muletrace_detect::types::{
    AccountProfile, CycleResult, PatternType, ShellResult, SmurfingResult,
};
use std::collections::{BTreeMap, BTreeSet};

/// Velocity above which a smurfing hit also earns the `high_velocity` tag.
const HIGH_VELOCITY: f64 = 5_000.0;

/// Suspicion score at or above which an account is highlighted in the
/// graph projection.
pub const SUSPICIOUS_THRESHOLD: f64 = 25.0;

/// Per-account pattern and ring membership, shared by the report and the
/// graph projection.
#[derive(Debug, Clone, Default)]
pub struct PatternMaps {
    /// account -> ring ids, sorted.
    pub rings: BTreeMap<String, BTreeSet<String>>,
    /// account -> raw pattern kinds, sorted.
    pub raw: BTreeMap<String, BTreeSet<PatternType>>,
    /// account -> report pattern labels, sorted.
    pub labels: BTreeMap<String, BTreeSet<String>>,
}

/// Walk all detections once, collecting ring membership and both pattern
/// vocabularies per account.
#[must_use]
pub fn collect_pattern_maps(
    cycles: &[CycleResult],
    smurfing: &[SmurfingResult],
    shells: &[ShellResult],
) -> PatternMaps {
    let mut maps = PatternMaps::default();

    for cycle in cycles {
        let label = format!("cycle_length_{}", cycle.length);
        for node in &cycle.nodes {
            maps.rings
                .entry(node.clone())
                .or_default()
                .insert(cycle.ring_id.clone());
            maps.raw
                .entry(node.clone())
                .or_default()
                .insert(PatternType::Cycle);
            maps.labels
                .entry(node.clone())
                .or_default()
                .insert(label.clone());
        }
    }

    for smurf in smurfing {
        let account = smurf.account_id.clone();
        maps.rings
            .entry(account.clone())
            .or_default()
            .insert(smurf.ring_id.clone());
        maps.raw
            .entry(account.clone())
            .or_default()
            .insert(smurf.pattern_type);
        let labels = maps.labels.entry(account).or_default();
        labels.insert(smurf.pattern_type.as_str().to_string());
        if smurf.velocity_per_hour > HIGH_VELOCITY {
            labels.insert("high_velocity".to_string());
        }
    }

    for shell in shells {
        for node in &shell.chain {
            maps.rings
                .entry(node.clone())
                .or_default()
                .insert(shell.ring_id.clone());
            maps.raw
                .entry(node.clone())
                .or_default()
                .insert(PatternType::Shell);
            maps.labels
                .entry(node.clone())
                .or_default()
                .insert("shell".to_string());
        }
    }

    maps
}

/// Build the ranked suspicious-account list: every account with a positive
/// score, enriched with profile fields, graph neighbours, and the report
/// pattern labels, sorted by score descending (stable on ties).
pub fn build_suspicious_accounts(
    scores: &BTreeMap<String, f64>,
    profiles: &BTreeMap<String, AccountProfile>,
    maps: &PatternMaps,
    graph: &TransactionGraph,
) -> Result<Vec<SuspiciousAccount>> {
    let mut accounts = Vec::new();

    for (account_id, &score) in scores {
        if score <= 0.0 {
            continue;
        }

        let profile = profiles.get(account_id).ok_or_else(|| {
            EngineError::internal(format!("profile missing for scored account {account_id}"))
        })?;

        let detected_patterns: Vec<String> = maps
            .labels
            .get(account_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        let ring_ids: Vec<String> = maps
            .rings
            .get(account_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        let ring_id = ring_ids.first().cloned().unwrap_or_default();

        accounts.push(SuspiciousAccount {
            account_id: account_id.clone(),
            suspicion_score: score,
            detected_patterns,
            ring_id,
            account_type: profile.account_type,
            total_inflow: profile.total_inflow,
            total_outflow: profile.total_outflow,
            transaction_count: profile.transaction_count,
            connected_accounts: graph.neighbours(account_id),
            ring_ids,
        });
    }

    accounts.sort_by(|a, b| {
        b.suspicion_score
            .partial_cmp(&a.suspicion_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(accounts)
}

/// Build one fraud ring per globally-unique ring id, sorted by risk score
/// descending (stable on ties in cycles -> smurfing -> shells walk order).
#[must_use]
pub fn build_fraud_rings(
    scores: &BTreeMap<String, f64>,
    cycles: &[CycleResult],
    smurfing: &[SmurfingResult],
    shells: &[ShellResult],
) -> Vec<FraudRing> {
    let max_score = |members: &BTreeSet<String>| -> f64 {
        members
            .iter()
            .filter_map(|m| scores.get(m).copied())
            .fold(0.0, f64::max)
    };

    let mut rings = Vec::new();

    for cycle in cycles {
        let members: BTreeSet<String> = cycle.nodes.iter().cloned().collect();
        rings.push(FraudRing {
            ring_id: cycle.ring_id.clone(),
            risk_score: max_score(&members),
            member_accounts: members.into_iter().collect(),
            pattern_type: PatternType::Cycle,
        });
    }

    for smurf in smurfing {
        let members: BTreeSet<String> = [smurf.account_id.clone()].into_iter().collect();
        rings.push(FraudRing {
            ring_id: smurf.ring_id.clone(),
            risk_score: max_score(&members),
            member_accounts: members.into_iter().collect(),
            pattern_type: smurf.pattern_type,
        });
    }

    for shell in shells {
        let members: BTreeSet<String> = shell.chain.iter().cloned().collect();
        rings.push(FraudRing {
            ring_id: shell.ring_id.clone(),
            risk_score: max_score(&members),
            member_accounts: members.into_iter().collect(),
            pattern_type: PatternType::Shell,
        });
    }

    rings.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    rings
}

/// Build the run summary. Total amount at risk sums the cycle and shell
/// totals.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn build_summary(
    total_transactions: usize,
    total_accounts: usize,
    suspicious: &[SuspiciousAccount],
    fraud_rings: &[FraudRing],
    cycles: &[CycleResult],
    smurfing: &[SmurfingResult],
    shells: &[ShellResult],
    processing_time_seconds: f64,
) -> Summary {
    let total_amount_at_risk = cycles.iter().map(|c| c.total_amount).sum::<f64>()
        + shells.iter().map(|s| s.total_amount).sum::<f64>();

    Summary {
        total_transactions,
        total_accounts_analyzed: total_accounts,
        suspicious_accounts_flagged: suspicious.len(),
        fraud_rings_detected: fraud_rings.len(),
        total_cycles: cycles.len(),
        total_smurfing_patterns: smurfing.len(),
        total_shell_patterns: shells.len(),
        total_amount_at_risk,
        processing_time_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn cycle(ring: &str, nodes: &[&str], length: usize) -> CycleResult {
        CycleResult {
            ring_id: ring.to_string(),
            nodes: nodes.iter().map(|s| s.to_string()).collect(),
            length,
            total_amount: 15_000.0,
            time_span_hours: 2.0,
            edge_count: nodes.len(),
            pattern_type: PatternType::Cycle,
        }
    }

    fn smurf(ring: &str, account: &str, velocity: f64) -> SmurfingResult {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        SmurfingResult {
            account_id: account.to_string(),
            pattern_type: PatternType::FanIn,
            unique_counterparties: 10,
            total_amount: 9_000.0,
            velocity_per_hour: velocity,
            window_start: ts,
            window_end: ts,
            ring_id: ring.to_string(),
        }
    }

    #[test]
    fn test_pattern_maps() {
        let cycles = vec![cycle("RING_001", &["A", "B", "C"], 3)];
        let smurfing = vec![smurf("RING_002", "R", 100_000.0)];
        let maps = collect_pattern_maps(&cycles, &smurfing, &[]);

        assert!(maps.labels["A"].contains("cycle_length_3"));
        assert!(maps.labels["R"].contains("fan_in"));
        assert!(maps.labels["R"].contains("high_velocity"));
        assert!(maps.rings["B"].contains("RING_001"));
        assert!(maps.raw["R"].contains(&PatternType::FanIn));
    }

    #[test]
    fn test_low_velocity_has_no_tag() {
        let smurfing = vec![smurf("RING_001", "R", 187.5)];
        let maps = collect_pattern_maps(&[], &smurfing, &[]);
        assert!(!maps.labels["R"].contains("high_velocity"));
    }

    #[test]
    fn test_fraud_rings_sorted_by_risk() {
        let cycles = vec![
            cycle("RING_001", &["A", "B", "C"], 3),
            cycle("RING_002", &["D", "E", "F", "G"], 4),
        ];
        let mut scores = BTreeMap::new();
        scores.insert("A".to_string(), 30.0);
        scores.insert("D".to_string(), 90.0);

        let rings = build_fraud_rings(&scores, &cycles, &[], &[]);
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].ring_id, "RING_002");
        assert_eq!(rings[0].risk_score, 90.0);
        assert_eq!(rings[1].risk_score, 30.0);
        assert_eq!(rings[0].member_accounts, vec!["D", "E", "F", "G"]);
    }

    #[test]
    fn test_summary_amount_at_risk() {
        let cycles = vec![cycle("RING_001", &["A", "B", "C"], 3)];
        let shells = vec![ShellResult {
            ring_id: "RING_002".to_string(),
            pattern_type: PatternType::Shell,
            chain: vec!["A".into(), "M".into(), "N".into(), "B".into()],
            intermediate_accounts: vec!["M".into(), "N".into()],
            total_amount: 3_000.0,
            shell_depth: 2,
            risk_score: 0.0,
        }];
        let summary = build_summary(100, 40, &[], &[], &cycles, &[], &shells, 0.5);

        assert_eq!(summary.total_amount_at_risk, 18_000.0);
        assert_eq!(summary.total_cycles, 1);
        assert_eq!(summary.total_shell_patterns, 1);
        assert_eq!(summary.total_transactions, 100);
        assert_eq!(summary.total_accounts_analyzed, 40);
    }
}
