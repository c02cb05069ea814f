//! Report types produced by the analysis pipeline.

use crate::projection::GraphView;
use muletrace_detect::types::{
    AccountType, AnalysisStatus, CycleResult, PatternType, ShellResult, SmurfingResult,
};
use serde::{Deserialize, Serialize};

/// An account flagged by the scorer, enriched with profile and graph data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    /// Account ID.
    pub account_id: String,
    /// Suspicion score in [0, 100].
    pub suspicion_score: f64,
    /// Report pattern labels (`cycle_length_3`, `fan_in`, ...).
    pub detected_patterns: Vec<String>,
    /// Primary ring ID (first of `ring_ids`).
    pub ring_id: String,
    /// Classification derived from the account id.
    pub account_type: AccountType,
    /// Sum of inbound amounts.
    pub total_inflow: f64,
    /// Sum of outbound amounts.
    pub total_outflow: f64,
    /// Inbound plus outbound transaction count.
    pub transaction_count: usize,
    /// Graph neighbours (successors union predecessors, minus self).
    pub connected_accounts: Vec<String>,
    /// Every ring this account belongs to.
    pub ring_ids: Vec<String>,
}

/// A named group of accounts flagged by a single detection event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    /// Ring ID (`RING_###`).
    pub ring_id: String,
    /// Member accounts, sorted.
    pub member_accounts: Vec<String>,
    /// Pattern that produced the ring.
    pub pattern_type: PatternType,
    /// Maximum suspicion score among members.
    pub risk_score: f64,
}

/// Aggregate counters for an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Transactions consumed.
    pub total_transactions: usize,
    /// Accounts analysed (graph node count).
    pub total_accounts_analyzed: usize,
    /// Accounts with a positive suspicion score.
    pub suspicious_accounts_flagged: usize,
    /// Globally unique rings detected.
    pub fraud_rings_detected: usize,
    /// Cycles detected.
    pub total_cycles: usize,
    /// Smurfing patterns detected.
    pub total_smurfing_patterns: usize,
    /// Shell chains detected.
    pub total_shell_patterns: usize,
    /// Sum of cycle and shell total amounts.
    pub total_amount_at_risk: f64,
    /// Wall-clock pipeline duration in seconds.
    pub processing_time_seconds: f64,
}

/// Complete output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Caller-chosen opaque analysis ID.
    pub analysis_id: String,
    /// Run status.
    pub status: AnalysisStatus,
    /// Aggregate counters.
    pub summary: Summary,
    /// Ranked suspicious accounts (score descending).
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Fraud rings (risk descending).
    pub fraud_rings: Vec<FraudRing>,
    /// Raw cycle detections.
    pub cycles: Vec<CycleResult>,
    /// Raw smurfing detections.
    pub smurfing: Vec<SmurfingResult>,
    /// Raw shell detections.
    pub shells: Vec<ShellResult>,
    /// Visualization projection of the graph.
    pub graph: GraphView,
    /// Failure message when status is `error`.
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Build an error result carrying no partial detection output.
    #[must_use]
    pub fn failed(analysis_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            status: AnalysisStatus::Failed,
            summary: Summary::default(),
            suspicious_accounts: Vec::new(),
            fraud_rings: Vec::new(),
            cycles: Vec::new(),
            smurfing: Vec::new(),
            shells: Vec::new(),
            graph: GraphView::default(),
            error: Some(message.into()),
        }
    }
}
