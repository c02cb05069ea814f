//! Smurfing (structuring) detection kernel.
//!
//! Fan-in:  a receiver with >= T unique senders within a W-hour window.
//! Fan-out: a sender with >= T unique receivers within a W-hour window.
//!
//! Sorts once globally through the [`TimeIndex`], groups per account, and
//! runs a two-pointer sliding window with a counterparty frequency map so
//! unique-count maintenance is O(1) amortised per transaction. Overall
//! complexity O(N log N).

use crate::timeindex::TimeIndex;
use crate::types::{round2, PatternType, SmurfingResult, Transaction};
use chrono::{DateTime, Duration, Utc};
use muletrace_core::config::SmurfingConfig;
use muletrace_core::{domain::Domain, kernel::KernelMetadata, traits::AnalyticKernel};
use std::collections::{BTreeMap, HashMap};

/// Smurfing detection kernel.
///
/// Reports at most one record per (account, direction): the window with
/// the maximum unique-counterparty count.
#[derive(Debug, Clone)]
pub struct SmurfingScan {
    metadata: KernelMetadata,
}

impl Default for SmurfingScan {
    fn default() -> Self {
        Self::new()
    }
}

impl SmurfingScan {
    /// Create a new smurfing scan kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("detect/smurfing-scan", Domain::PatternDetection)
                .with_description("Fan-in / fan-out structuring detection (sliding window)")
                .with_throughput(200_000)
                .with_latency_us(20.0),
        }
    }

    /// Detect fan-in and fan-out structuring patterns.
    ///
    /// Never fails: empty input yields an empty result. Ring ids carry a
    /// provisional `SMURF_` prefix until global assignment.
    #[must_use]
    pub fn detect(transactions: &[Transaction], config: &SmurfingConfig) -> Vec<SmurfingResult> {
        if transactions.is_empty() {
            return Vec::new();
        }

        let index = TimeIndex::new(transactions);
        let window = Duration::seconds((config.window_hours * 3600.0).round() as i64);

        let mut results = Vec::new();
        detect_fan(
            transactions,
            &index,
            config.fan_threshold,
            window,
            PatternType::FanIn,
            &mut results,
        );
        detect_fan(
            transactions,
            &index,
            config.fan_threshold,
            window,
            PatternType::FanOut,
            &mut results,
        );
        results
    }
}

/// Sliding-window fan detection for one direction.
///
/// Group positions by account (sorted order is preserved per group, so
/// each group is already timestamp-ordered), then slide the window while
/// maintaining a counterparty frequency map: an insertion taking a count
/// 0 -> 1 increments the unique counter, a removal 1 -> 0 decrements it.
fn detect_fan(
    transactions: &[Transaction],
    index: &TimeIndex<'_>,
    threshold: usize,
    window: Duration,
    direction: PatternType,
    results: &mut Vec<SmurfingResult>,
) {
    let fan_out = direction == PatternType::FanOut;

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &pos in index.sorted_positions() {
        let txn = &transactions[pos];
        let account = if fan_out { &txn.sender } else { &txn.receiver };
        groups.entry(account.as_str()).or_default().push(pos);
    }

    for (account, positions) in groups {
        let n = positions.len();
        if n < threshold {
            continue;
        }

        let mut counterparty_count: HashMap<&str, usize> = HashMap::new();
        let mut unique_in_window = 0usize;
        let mut total_in_window = 0.0;

        let mut best_unique = 0usize;
        let mut best_total = 0.0;
        let mut best_window: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

        let mut left = 0usize;
        for right in 0..n {
            let rt = &transactions[positions[right]];
            let rcp = if fan_out { &rt.receiver } else { &rt.sender };
            let count = counterparty_count.entry(rcp.as_str()).or_insert(0);
            if *count == 0 {
                unique_in_window += 1;
            }
            *count += 1;
            total_in_window += rt.amount;

            // Shrink from the left until the window fits
            while left < right && rt.timestamp - transactions[positions[left]].timestamp > window {
                let lt = &transactions[positions[left]];
                let lcp = if fan_out { &lt.receiver } else { &lt.sender };
                if let Some(count) = counterparty_count.get_mut(lcp.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        unique_in_window -= 1;
                    }
                }
                total_in_window -= lt.amount;
                left += 1;
            }

            if unique_in_window > best_unique {
                best_unique = unique_in_window;
                best_total = total_in_window;
                best_window = Some((transactions[positions[left]].timestamp, rt.timestamp));
            }
        }

        if best_unique >= threshold {
            if let Some((start, end)) = best_window {
                let hours_span = ((end - start).num_seconds() as f64 / 3600.0).max(1.0);
                let prefix: String = account.chars().take(8).collect();
                results.push(SmurfingResult {
                    account_id: account.to_string(),
                    pattern_type: direction,
                    unique_counterparties: best_unique,
                    total_amount: round2(best_total),
                    velocity_per_hour: round2(best_total / hours_span),
                    window_start: start,
                    window_end: end,
                    ring_id: format!("SMURF_{}", prefix),
                });
            }
        }
    }
}

impl AnalyticKernel for SmurfingScan {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}
