//! Cycle detection kernel.
//!
//! Finds circular fund routing: simple directed cycles of 3 to 5 hops whose
//! transactions all fall within a sliding time window.
//!
//! Bounded for dense graphs:
//! - O(1) path-membership checks via a hash set carried in each DFS frame
//! - a hard frame budget per root node
//! - roots explored in descending out-degree order so hubs are mined first
//! - zero-out-degree nodes skipped outright

use crate::graph::TransactionGraph;
use crate::types::{round2, CycleResult, PatternType};
use chrono::{DateTime, Duration, Utc};
use muletrace_core::config::CycleConfig;
use muletrace_core::{domain::Domain, kernel::KernelMetadata, traits::AnalyticKernel};
use std::collections::HashSet;

/// Cycle detection kernel.
///
/// Enumerates simple cycles with an explicit frame-stack DFS, applies the
/// temporal coherence check, and deduplicates rotations of the same cycle.
#[derive(Debug, Clone)]
pub struct CycleScan {
    metadata: KernelMetadata,
}

impl Default for CycleScan {
    fn default() -> Self {
        Self::new()
    }
}

struct Frame {
    node: String,
    path: Vec<String>,
    in_path: HashSet<String>,
}

impl CycleScan {
    /// Create a new cycle scan kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("detect/cycle-scan", Domain::PatternDetection)
                .with_description("Circular fund routing detection (DFS, 3-5 hops)")
                .with_throughput(50_000)
                .with_latency_us(200.0),
        }
    }

    /// Find all temporally coherent simple cycles of length 3..=`max_length`.
    ///
    /// Never fails: empty input yields an empty result, and candidates
    /// rejected by the temporal or dedup checks are silently dropped.
    /// Ring ids are left empty; global assignment happens after all
    /// detectors complete.
    #[must_use]
    pub fn detect(graph: &TransactionGraph, config: &CycleConfig) -> Vec<CycleResult> {
        let window = Duration::seconds((config.time_window_hours * 3600.0).round() as i64);

        // Roots: skip nodes that cannot start a cycle, then order by
        // out-degree descending (id ascending on ties) so hubs are mined
        // first and the result cap is hit early on dense graphs.
        let mut roots: Vec<&str> = graph
            .nodes()
            .filter(|(id, _)| graph.out_degree(id) > 0)
            .map(|(id, _)| id)
            .collect();
        roots.sort_by(|a, b| {
            graph
                .out_degree(b)
                .cmp(&graph.out_degree(a))
                .then_with(|| a.cmp(b))
        });

        let mut results = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();

        for root in roots {
            if results.len() >= config.max_cycles {
                break;
            }

            let mut stack = vec![Frame {
                node: root.to_string(),
                path: vec![root.to_string()],
                in_path: HashSet::from([root.to_string()]),
            }];
            let mut frames_this_root = 0usize;

            'frames: while let Some(frame) = stack.pop() {
                if results.len() >= config.max_cycles {
                    break;
                }
                frames_this_root += 1;
                if frames_this_root > config.max_frames_per_root {
                    break;
                }

                let depth = frame.path.len();
                if depth > config.max_length + 1 {
                    continue;
                }

                for next in graph.successors(&frame.node) {
                    // Cycle closes back to the root
                    if next == root && depth >= 3 {
                        if let Some(cycle) = check_temporal_coherence(graph, &frame.path, window) {
                            if seen_keys.insert(canonical_key(&frame.path)) {
                                results.push(cycle);
                                if results.len() >= config.max_cycles {
                                    break 'frames;
                                }
                            }
                        }
                        continue;
                    }

                    if depth < config.max_length && !frame.in_path.contains(next) {
                        let mut path = frame.path.clone();
                        let mut in_path = frame.in_path.clone();
                        path.push(next.to_string());
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

/// Validate a candidate cycle against the time window and materialize it.
///
/// Enumerates every transaction across the cycle's aggregated edges
/// (including the wrap-around edge). A missing edge or an empty
/// transaction list rejects the candidate; so does a timestamp spread
/// wider than the window.
fn check_temporal_coherence(
    graph: &TransactionGraph,
    path: &[String],
    window: Duration,
) -> Option<CycleResult> {
    let mut min_ts: Option<DateTime<Utc>> = None;
    let mut max_ts: Option<DateTime<Utc>> = None;
    let mut total_amount = 0.0;

    for i in 0..path.len() {
        let u = &path[i];
        let v = &path[(i + 1) % path.len()];
        let edge = graph.edge(u, v)?;
        if edge.transactions.is_empty() {
            return None;
        }
        for &(amount, ts) in &edge.transactions {
            total_amount += amount;
            min_ts = Some(min_ts.map_or(ts, |m| m.min(ts)));
            max_ts = Some(max_ts.map_or(ts, |m| m.max(ts)));
        }
    }

    let (min_ts, max_ts) = (min_ts?, max_ts?);
    let span = max_ts - min_ts;
    if span > window {
        return None;
    }

    Some(CycleResult {
        ring_id: String::new(),
        nodes: path.to_vec(),
        length: path.len(),
        total_amount: round2(total_amount),
        time_span_hours: round2(span.num_seconds() as f64 / 3600.0),
        edge_count: path.len(),
        pattern_type: PatternType::Cycle,
    })
}

/// Lexicographically smallest rotation of the node sequence, joined by a
/// separator. Rotations of the same cycle share a key.
fn canonical_key(nodes: &[String]) -> String {
    let mut best: Option<String> = None;
    for start in 0..nodes.len() {
        let mut key = String::new();
        for i in 0..nodes.len() {
            if !key.is_empty() {
                key.push(',');
            }
            key.push_str(&nodes[(start + i) % nodes.len()]);
        }
        if best.as_ref().map_or(true, |b| key < *b) {
            best = Some(key);
        }
    }
    best.unwrap_or_default()
}

impl AnalyticKernel for CycleScan {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transaction;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour as i64)
    }

    fn triangle() -> Vec<Transaction> {
        vec![
            Transaction::new("A", "B", 5000.0, ts(0)),
            Transaction::new("B", "C", 5000.0, ts(1)),
            Transaction::new("C", "A", 5000.0, ts(2)),
        ]
    }

    #[test]
    fn test_cycle_scan_metadata() {
        let kernel = CycleScan::new();
        assert_eq!(kernel.metadata().id, "detect/cycle-scan");
        assert_eq!(kernel.metadata().domain, Domain::PatternDetection);
    }

    #[test]
    fn test_triangle_cycle() {
        let txns = triangle();
        let graph = TransactionGraph::build(&txns);
        let cycles = CycleScan::detect(&graph, &CycleConfig::default());

        assert_eq!(cycles.len(), 1);
        let c = &cycles[0];
        assert_eq!(c.length, 3);
        assert_eq!(c.edge_count, 3);
        assert_eq!(c.total_amount, 15000.0);
        assert_eq!(c.time_span_hours, 2.0);
        assert_eq!(c.pattern_type, PatternType::Cycle);
        let mut nodes = c.nodes.clone();
        nodes.sort();
        assert_eq!(nodes, vec!["A", "B", "C"]);
        assert!(c.ring_id.is_empty());
    }

    #[test]
    fn test_no_cycle_below_three_nodes() {
        let txns = vec![
            Transaction::new("A", "B", 100.0, ts(0)),
            Transaction::new("B", "A", 100.0, ts(1)),
        ];
        let graph = TransactionGraph::build(&txns);
        let cycles = CycleScan::detect(&graph, &CycleConfig::default());
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_window_boundary() {
        // Exactly 72h span is accepted
        let txns = vec![
            Transaction::new("A", "B", 100.0, ts(0)),
            Transaction::new("B", "C", 100.0, ts(10)),
            Transaction::new("C", "A", 100.0, ts(72)),
        ];
        let graph = TransactionGraph::build(&txns);
        let cycles = CycleScan::detect(&graph, &CycleConfig::default());
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].time_span_hours, 72.0);

        // 72h + 1s is rejected
        let mut txns = vec![
            Transaction::new("A", "B", 100.0, ts(0)),
            Transaction::new("B", "C", 100.0, ts(10)),
        ];
        txns.push(Transaction::new(
            "C",
            "A",
            100.0,
            ts(72) + Duration::seconds(1),
        ));
        let graph = TransactionGraph::build(&txns);
        let cycles = CycleScan::detect(&graph, &CycleConfig::default());
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_rotation_dedup() {
        // A->B->C->A and the same cycle re-entered from B must collapse
        let txns = triangle();
        let graph = TransactionGraph::build(&txns);
        let cycles = CycleScan::detect(&graph, &CycleConfig::default());
        assert_eq!(cycles.len(), 1);

        // Reordered input yields the identical cycle set
        let mut reordered = triangle();
        reordered.rotate_left(1);
        let graph2 = TransactionGraph::build(&reordered);
        let cycles2 = CycleScan::detect(&graph2, &CycleConfig::default());
        assert_eq!(cycles, cycles2);
    }

    #[test]
    fn test_canonical_key_rotations() {
        let a = vec!["B".to_string(), "C".to_string(), "A".to_string()];
        let b = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(canonical_key(&a), canonical_key(&b));
        assert_eq!(canonical_key(&b), "A,B,C");
    }

    #[test]
    fn test_length_bound() {
        // 6-node cycle exceeds the default maximum of 5
        let txns = vec![
            Transaction::new("A", "B", 1.0, ts(0)),
            Transaction::new("B", "C", 1.0, ts(0)),
            Transaction::new("C", "D", 1.0, ts(0)),
            Transaction::new("D", "E", 1.0, ts(0)),
            Transaction::new("E", "F", 1.0, ts(0)),
            Transaction::new("F", "A", 1.0, ts(0)),
        ];
        let graph = TransactionGraph::build(&txns);
        let cycles = CycleScan::detect(&graph, &CycleConfig::default());
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_max_cycles_cap() {
        // Dense bidirectional clique produces many 3-cycles; cap at 2
        let mut txns = Vec::new();
        let ids = ["A", "B", "C", "D", "E"];
        for u in &ids {
            for v in &ids {
                if u != v {
                    txns.push(Transaction::new(*u, *v, 10.0, ts(0)));
                }
            }
        }
        let graph = TransactionGraph::build(&txns);
        let config = CycleConfig {
            max_cycles: 2,
            ..Default::default()
        };
        let cycles = CycleScan::detect(&graph, &config);
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let graph = TransactionGraph::build(&[]);
        assert!(CycleScan::detect(&graph, &CycleConfig::default()).is_empty());
    }
}
