//! Rule-based suspicion scoring kernel.
//!
//! Fuses detector evidence and account features into a 0-100 score per
//! account. Within each pattern kind the maximum contribution across items
//! hitting the account is taken, then contributions are summed across
//! kinds, so stacked detections of the same kind never double-count.

use muletrace_core::{domain::Domain, kernel::KernelMetadata, traits::AnalyticKernel};
use muletrace_detect::types::{
    AccountProfile, CycleResult, ShellResult, SmurfingResult,
};
use std::collections::{BTreeMap, HashMap};

/// Per-chain-member shell contribution.
const SHELL_BASE: f64 = 25.0;
/// Smurfing base contribution.
const SMURF_BASE: f64 = 25.0;
/// Velocity bonus threshold in amount per hour.
const HIGH_VELOCITY: f64 = 5_000.0;

/// Rule-based scoring kernel.
#[derive(Debug, Clone)]
pub struct RuleScorer {
    metadata: KernelMetadata,
}

impl Default for RuleScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleScorer {
    /// Create a new rule scorer kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("score/rule-scorer", Domain::RiskScoring)
                .with_description("Rule-based suspicion score fusion")
                .with_throughput(500_000)
                .with_latency_us(5.0),
        }
    }

    /// Calculate suspicion scores for every profiled account.
    ///
    /// Returns account_id -> score (0-100, rounded to one decimal), in
    /// account-id order.
    #[must_use]
    pub fn score_all(
        profiles: &BTreeMap<String, AccountProfile>,
        cycles: &[CycleResult],
        smurfing: &[SmurfingResult],
        shells: &[ShellResult],
    ) -> BTreeMap<String, f64> {
        // Cycle contribution: 20 * (6 - min(length, 5)), +10 for totals
        // above 10k. Shorter cycles score higher.
        let mut cycle_scores: HashMap<&str, f64> = HashMap::new();
        for cycle in cycles {
            let mut score = 20.0 * (6.0 - cycle.length.min(5) as f64);
            if cycle.total_amount > 10_000.0 {
                score += 10.0;
            }
            for node in &cycle.nodes {
                let entry = cycle_scores.entry(node.as_str()).or_insert(0.0);
                *entry = entry.max(score);
            }
        }

        // Smurfing contribution: base 25, +10 high velocity, +5 many
        // counterparties, +5 high volume.
        let mut smurf_scores: HashMap<&str, f64> = HashMap::new();
        for smurf in smurfing {
            let mut score = SMURF_BASE;
            if smurf.velocity_per_hour > HIGH_VELOCITY {
                score += 10.0;
            }
            if smurf.unique_counterparties > 20 {
                score += 5.0;
            }
            if smurf.total_amount > 100_000.0 {
                score += 5.0;
            }
            let entry = smurf_scores.entry(smurf.account_id.as_str()).or_insert(0.0);
            *entry = entry.max(score);
        }

        // Shell contribution: 25 for every chain member; intermediates get
        // an extra 10 per layer of depth.
        let mut shell_scores: HashMap<&str, f64> = HashMap::new();
        for shell in shells {
            for node in &shell.chain {
                let entry = shell_scores.entry(node.as_str()).or_insert(0.0);
                *entry = entry.max(SHELL_BASE);
            }
            let intermediate_score = SHELL_BASE + 10.0 * shell.shell_depth as f64;
            for node in &shell.intermediate_accounts {
                let entry = shell_scores.entry(node.as_str()).or_insert(0.0);
                *entry = entry.max(intermediate_score);
            }
        }

        let mut scores = BTreeMap::new();
        for (account_id, profile) in profiles {
            let mut score = 0.0;

            if let Some(s) = cycle_scores.get(account_id.as_str()) {
                score += s;
            }
            if let Some(s) = smurf_scores.get(account_id.as_str()) {
                score += s;
            }
            if let Some(s) = shell_scores.get(account_id.as_str()) {
                score += s;
            }

            // Centrality bonus: hubs with heavy traffic, capped at +15
            if profile.transaction_count > 10 {
                let centrality = (profile.transaction_count as f64).log10() * 5.0;
                score += centrality.min(15.0);
            }

            // Amount anomaly bonus: oversized average leg
            if profile.transaction_count > 0 {
                let avg_leg = (profile.total_inflow + profile.total_outflow)
                    / (2.0 * profile.transaction_count as f64);
                if avg_leg > 50_000.0 {
                    score += 10.0;
                }
            }

            // Legitimacy deductions
            if profile.is_payroll {
                score -= 50.0;
            }
            if profile.is_merchant {
                score -= 40.0;
            }
            if profile.is_salary {
                score -= 30.0;
            }
            if profile.is_established_business {
                score -= 40.0;
            }

            let score = score.clamp(0.0, 100.0);
            scores.insert(account_id.clone(), (score * 10.0).round() / 10.0);
        }

        scores
    }
}

impl AnalyticKernel for RuleScorer {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}
