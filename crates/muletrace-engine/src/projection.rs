//! Consumer projections.
//!
//! Stable serialized shapes for external consumers:
//! - full result (polling surface)
//! - download result (reduced, frozen shape)
//! - graph view (visualization)

use crate::report::{PatternMaps, SUSPICIOUS_THRESHOLD};
use crate::types::{AnalysisResult, FraudRing, Summary, SuspiciousAccount};
use muletrace_detect::graph::TransactionGraph;
use muletrace_detect::types::{AccountType, AnalysisStatus, PatternType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full result projection: the polling surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    /// Caller-chosen analysis ID.
    pub analysis_id: String,
    /// Run status string ("pending" / "processing" / "complete" / "error").
    pub status: AnalysisStatus,
    /// Report payload; null until the run completes.
    pub result: Option<ResultView>,
    /// Failure message, present only on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report payload nested inside [`StatusView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    /// Aggregate counters.
    pub summary: Summary,
    /// Ranked suspicious accounts.
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Fraud rings.
    pub fraud_rings: Vec<FraudRing>,
}

/// Build the full result projection.
#[must_use]
pub fn status_view(result: &AnalysisResult) -> StatusView {
    let payload = if result.status == AnalysisStatus::Completed {
        Some(ResultView {
            summary: result.summary.clone(),
            suspicious_accounts: result.suspicious_accounts.clone(),
            fraud_rings: result.fraud_rings.clone(),
        })
    } else {
        None
    };

    StatusView {
        analysis_id: result.analysis_id.clone(),
        status: result.status,
        result: payload,
        error: result.error.clone(),
    }
}

/// Reduced suspicious-account shape for the download report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadAccount {
    /// Account ID.
    pub account_id: String,
    /// Suspicion score.
    pub suspicion_score: f64,
    /// Report pattern labels.
    pub detected_patterns: Vec<String>,
    /// Primary ring ID.
    pub ring_id: String,
}

/// Reduced summary shape for the download report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSummary {
    /// Accounts analysed.
    pub total_accounts_analyzed: usize,
    /// Accounts flagged.
    pub suspicious_accounts_flagged: usize,
    /// Rings detected.
    pub fraud_rings_detected: usize,
    /// Pipeline duration, rounded to three decimals.
    pub processing_time_seconds: f64,
}

/// Download projection: the reduced, frozen report shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadView {
    /// Reduced suspicious accounts.
    pub suspicious_accounts: Vec<DownloadAccount>,
    /// Fraud rings.
    pub fraud_rings: Vec<FraudRing>,
    /// Reduced summary.
    pub summary: DownloadSummary,
}

/// Build the download projection.
#[must_use]
pub fn download_view(result: &AnalysisResult) -> DownloadView {
    DownloadView {
        suspicious_accounts: result
            .suspicious_accounts
            .iter()
            .map(|sa| DownloadAccount {
                account_id: sa.account_id.clone(),
                suspicion_score: sa.suspicion_score,
                detected_patterns: sa.detected_patterns.clone(),
                ring_id: sa.ring_id.clone(),
            })
            .collect(),
        fraud_rings: result.fraud_rings.clone(),
        summary: DownloadSummary {
            total_accounts_analyzed: result.summary.total_accounts_analyzed,
            suspicious_accounts_flagged: result.summary.suspicious_accounts_flagged,
            fraud_rings_detected: result.summary.fraud_rings_detected,
            processing_time_seconds: (result.summary.processing_time_seconds * 1000.0).round()
                / 1000.0,
        },
    }
}

/// A node in the visualization projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNodeView {
    /// Account ID.
    pub id: String,
    /// Display label (same as the id).
    pub label: String,
    /// Classification derived from the account id.
    pub account_type: AccountType,
    /// Suspicion score.
    pub suspicion_score: f64,
    /// Sum of inbound amounts.
    pub total_inflow: f64,
    /// Sum of outbound amounts.
    pub total_outflow: f64,
    /// Inbound plus outbound transaction count.
    pub transaction_count: usize,
    /// True when the score reaches the highlight threshold.
    pub is_suspicious: bool,
    /// Rings this account belongs to.
    pub ring_ids: Vec<String>,
    /// Raw pattern kinds.
    pub patterns: Vec<PatternType>,
    /// Report pattern labels.
    pub detected_patterns: Vec<String>,
}

/// An aggregated edge in the visualization projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdgeView {
    /// Sender account.
    pub source: String,
    /// Receiver account.
    pub target: String,
    /// Aggregated amount over the directed pair.
    pub amount: f64,
    /// Transaction count over the directed pair.
    pub transaction_count: usize,
    /// True when either endpoint reaches the highlight threshold.
    pub is_suspicious: bool,
    /// First raw pattern of the source account, if any.
    pub pattern_type: Option<PatternType>,
}

/// Visualization projection of the analysed graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    /// Projected nodes, in id order.
    pub nodes: Vec<GraphNodeView>,
    /// Projected aggregated edges, in id order.
    pub edges: Vec<GraphEdgeView>,
}

/// Build the visualization projection.
#[must_use]
pub fn graph_view(
    graph: &TransactionGraph,
    scores: &BTreeMap<String, f64>,
    maps: &PatternMaps,
) -> GraphView {
    let score_of = |id: &str| scores.get(id).copied().unwrap_or(0.0);

    let nodes = graph
        .nodes()
        .map(|(id, stats)| {
            let score = score_of(id);
            GraphNodeView {
                id: id.to_string(),
                label: id.to_string(),
                account_type: graph.classify(id),
                suspicion_score: score,
                total_inflow: stats.total_inflow,
                total_outflow: stats.total_outflow,
                transaction_count: stats.transaction_count,
                is_suspicious: score >= SUSPICIOUS_THRESHOLD,
                ring_ids: maps
                    .rings
                    .get(id)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default(),
                patterns: maps
                    .raw
                    .get(id)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default(),
                detected_patterns: maps
                    .labels
                    .get(id)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default(),
            }
        })
        .collect();

    let edges = graph
        .aggregated_edges()
        .map(|(source, target, edge)| GraphEdgeView {
            source: source.to_string(),
            target: target.to_string(),
            amount: edge.total_amount,
            transaction_count: edge.transaction_count,
            is_suspicious: score_of(source) >= SUSPICIOUS_THRESHOLD
                || score_of(target) >= SUSPICIOUS_THRESHOLD,
            pattern_type: maps
                .raw
                .get(source)
                .and_then(|set| set.iter().next().copied()),
        })
        .collect();

    GraphView { nodes, edges }
}
