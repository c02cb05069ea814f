//! Shell chain detection kernel.
//!
//! Finds layered shell networks: simple paths A -> M1 -> M2 -> B where the
//! intermediate accounts have very low total activity and pass funds
//! through with closely matched in/out flows.

use crate::graph::TransactionGraph;
use crate::types::{round2, PatternType, ShellResult};
use muletrace_core::config::ShellConfig;
use muletrace_core::{domain::Domain, kernel::KernelMetadata, traits::AnalyticKernel};
use std::collections::HashSet;

/// Shell chain detection kernel.
///
/// DFS path enumeration from flow sources toward flow sinks, bounded by a
/// global path cap and a per-source cap.
#[derive(Debug, Clone)]
pub struct ShellScan {
    metadata: KernelMetadata,
}

impl Default for ShellScan {
    fn default() -> Self {
        Self::new()
    }
}

struct Frame {
    node: String,
    path: Vec<String>,
    in_path: HashSet<String>,
}

impl ShellScan {
    /// Create a new shell scan kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("detect/shell-scan", Domain::PatternDetection)
                .with_description("Layered shell chain detection (pass-through paths)")
                .with_throughput(30_000)
                .with_latency_us(300.0),
        }
    }

    /// Find layered shell chains.
    ///
    /// Never fails: empty input or no shell candidates yields an empty
    /// result. Ring ids are left empty until global assignment.
    #[must_use]
    pub fn detect(graph: &TransactionGraph, config: &ShellConfig) -> Vec<ShellResult> {
        // Shell candidates: low-activity nodes with at least one transaction
        let shell_candidates: HashSet<&str> = graph
            .nodes()
            .filter(|(_, stats)| {
                stats.transaction_count > 0
                    && stats.transaction_count <= config.max_intermediate_txns
            })
            .map(|(id, _)| id)
            .collect();

        if shell_candidates.is_empty() {
            return Vec::new();
        }

        // Sources push flow out, sinks absorb it
        let mut sources: Vec<&str> = Vec::new();
        let mut sinks: Vec<&str> = Vec::new();
        for (id, _) in graph.nodes() {
            let in_d = graph.in_degree(id);
            let out_d = graph.out_degree(id);
            if in_d == 0 || out_d > in_d {
                sources.push(id);
            }
            if out_d == 0 || in_d > out_d {
                sinks.push(id);
            }
        }
        if sources.is_empty() {
            sources = graph.nodes().map(|(id, _)| id).collect();
        }
        if sinks.is_empty() {
            sinks = graph.nodes().map(|(id, _)| id).collect();
        }
        let sink_set: HashSet<&str> = sinks.into_iter().collect();

        let mut results = Vec::new();
        let mut seen_chains: HashSet<String> = HashSet::new();

        for source in sources {
            if results.len() >= config.max_paths {
                break;
            }

            let mut stack = vec![Frame {
                node: source.to_string(),
                path: vec![source.to_string()],
                in_path: HashSet::from([source.to_string()]),
            }];
            let mut emitted_from_source = 0usize;

            'frames: while let Some(frame) = stack.pop() {
                if results.len() >= config.max_paths
                    || emitted_from_source >= config.max_paths_per_source
                {
                    break;
                }
                if frame.path.len() > config.max_chain_edges + 1 {
                    continue;
                }

                for next in graph.successors(&frame.node) {
                    if frame.in_path.contains(next) {
                        continue;
                    }

                    let mut path = frame.path.clone();
                    path.push(next.to_string());
                    let edges = path.len() - 1;

                    if edges >= config.min_chain_edges && sink_set.contains(next) {
                        if let Some(shell) = validate_shell_chain(
                            graph,
                            &path,
                            &shell_candidates,
                            &mut seen_chains,
                        ) {
                            results.push(shell);
                            emitted_from_source += 1;
                            if results.len() >= config.max_paths
                                || emitted_from_source >= config.max_paths_per_source
                            {
                                break 'frames;
                            }
                        }
                    }

                    if edges < config.max_chain_edges {
                        let mut in_path = frame.in_path.clone();
                        in_path.insert(next.to_string());
                        stack.push(Frame {
                            node: next.to_string(),
                            path,
                            in_path,
                        });
                    }
                }
            }
        }

        results
    }
}

/// Validate a candidate chain and materialize the result.
///
/// Intermediates must all be shell candidates with strictly positive
/// inflow and outflow balancing to at least 0.5; repeated chains are
/// dropped via the joined-node dedup key.
fn validate_shell_chain(
    graph: &TransactionGraph,
    path: &[String],
    shell_candidates: &HashSet<&str>,
    seen_chains: &mut HashSet<String>,
) -> Option<ShellResult> {
    let intermediates = &path[1..path.len() - 1];
    if intermediates.is_empty() {
        return None;
    }

    if !intermediates
        .iter()
        .all(|n| shell_candidates.contains(n.as_str()))
    {
        return None;
    }

    let chain_key = path.join("→");
    if !seen_chains.insert(chain_key) {
        return None;
    }

    for node in intermediates {
        let stats = graph.node(node)?;
        if stats.total_inflow <= 0.0 || stats.total_outflow <= 0.0 {
            return None;
        }
        let ratio = stats.total_inflow.min(stats.total_outflow)
            / stats.total_inflow.max(stats.total_outflow);
        if ratio < 0.5 {
            return None;
        }
    }

    let mut total_amount = 0.0;
    for pair in path.windows(2) {
        if let Some(edge) = graph.edge(&pair[0], &pair[1]) {
            total_amount += edge.total_amount;
        }
    }

    Some(ShellResult {
        ring_id: String::new(),
        pattern_type: PatternType::Shell,
        chain: path.to_vec(),
        intermediate_accounts: intermediates.to_vec(),
        total_amount: round2(total_amount),
        shell_depth: intermediates.len(),
        risk_score: 0.0,
    })
}

impl AnalyticKernel for ShellScan {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transaction;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour as i64)
    }

    fn chain_txns() -> Vec<Transaction> {
        vec![
            Transaction::new("A", "M1", 1000.0, ts(0)),
            Transaction::new("M1", "M2", 1000.0, ts(1)),
            Transaction::new("M2", "B", 1000.0, ts(2)),
        ]
    }

    #[test]
    fn test_shell_scan_metadata() {
        let kernel = ShellScan::new();
        assert_eq!(kernel.metadata().id, "detect/shell-scan");
        assert_eq!(kernel.metadata().domain, Domain::PatternDetection);
    }

    #[test]
    fn test_simple_shell_chain() {
        let graph = TransactionGraph::build(&chain_txns());
        let shells = ShellScan::detect(&graph, &ShellConfig::default());

        assert_eq!(shells.len(), 1);
        let s = &shells[0];
        assert_eq!(s.chain, vec!["A", "M1", "M2", "B"]);
        assert_eq!(s.intermediate_accounts, vec!["M1", "M2"]);
        assert_eq!(s.shell_depth, 2);
        assert_eq!(s.total_amount, 3000.0);
        assert_eq!(s.pattern_type, PatternType::Shell);
        assert!(s.ring_id.is_empty());
    }

    #[test]
    fn test_intermediate_activity_ceiling() {
        // M1 with a fourth transaction is no longer a shell candidate
        let mut txns = chain_txns();
        txns.push(Transaction::new("M1", "M2", 500.0, ts(3)));
        txns.push(Transaction::new("X", "M1", 500.0, ts(4)));
        let graph = TransactionGraph::build(&txns);
        assert_eq!(graph.node("M1").unwrap().transaction_count, 4);

        let shells = ShellScan::detect(&graph, &ShellConfig::default());
        assert!(shells.is_empty());
    }

    #[test]
    fn test_activity_boundary_at_three() {
        // Exactly 3 transactions keeps M1 eligible
        let mut txns = chain_txns();
        txns.push(Transaction::new("M1", "B", 100.0, ts(3)));
        let graph = TransactionGraph::build(&txns);
        assert_eq!(graph.node("M1").unwrap().transaction_count, 3);

        let shells = ShellScan::detect(&graph, &ShellConfig::default());
        assert!(shells.iter().any(|s| s.chain == vec!["A", "M1", "M2", "B"]));
    }

    #[test]
    fn test_pass_through_balance_rejection() {
        // M1 receives 1000 but forwards only 400: ratio 0.4 < 0.5
        let txns = vec![
            Transaction::new("A", "M1", 1000.0, ts(0)),
            Transaction::new("M1", "M2", 400.0, ts(1)),
            Transaction::new("M2", "B", 400.0, ts(2)),
        ];
        let graph = TransactionGraph::build(&txns);
        let shells = ShellScan::detect(&graph, &ShellConfig::default());
        assert!(shells.is_empty());
    }

    #[test]
    fn test_min_chain_length() {
        // Two edges only: below the three-edge minimum
        let txns = vec![
            Transaction::new("A", "M1", 1000.0, ts(0)),
            Transaction::new("M1", "B", 1000.0, ts(1)),
        ];
        let graph = TransactionGraph::build(&txns);
        let shells = ShellScan::detect(&graph, &ShellConfig::default());
        assert!(shells.is_empty());
    }

    #[test]
    fn test_no_duplicate_chains() {
        let graph = TransactionGraph::build(&chain_txns());
        let shells = ShellScan::detect(&graph, &ShellConfig::default());
        let mut keys: Vec<String> = shells.iter().map(|s| s.chain.join("→")).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), shells.len());
    }

    #[test]
    fn test_global_cap() {
        // Two parallel chains; cap results at 1
        let mut txns = chain_txns();
        txns.extend(vec![
            Transaction::new("A", "N1", 800.0, ts(0)),
            Transaction::new("N1", "N2", 800.0, ts(1)),
            Transaction::new("N2", "B", 800.0, ts(2)),
        ]);
        let graph = TransactionGraph::build(&txns);
        let config = ShellConfig {
            max_paths: 1,
            ..Default::default()
        };
        let shells = ShellScan::detect(&graph, &config);
        assert_eq!(shells.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let graph = TransactionGraph::build(&[]);
        assert!(ShellScan::detect(&graph, &ShellConfig::default()).is_empty());
    }
}
