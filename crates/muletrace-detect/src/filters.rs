//! Legitimacy filter kernel.
//!
//! False-positive reduction: tags accounts whose activity looks like
//! ordinary payroll, merchant, salary, or established-business traffic so
//! the scorer can dampen them.

use crate::graph::looks_like_business;
use crate::types::{AccountProfile, Transaction};
use chrono::{DateTime, Utc};
use muletrace_core::{domain::Domain, kernel::KernelMetadata, traits::AnalyticKernel};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Cent values treated as "round" price points.
const ROUND_CENTS: &[i64] = &[0, 49, 50, 95, 99];

/// Legitimacy filter kernel.
///
/// Enriches account profiles with the four legitimacy booleans.
#[derive(Debug, Clone)]
pub struct LegitimacyFilter {
    metadata: KernelMetadata,
}

impl Default for LegitimacyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LegitimacyFilter {
    /// Create a new legitimacy filter kernel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: KernelMetadata::batch("profile/legitimacy-filter", Domain::Profiling)
                .with_description("Payroll / merchant / salary / established-business tagging")
                .with_throughput(100_000)
                .with_latency_us(50.0),
        }
    }

    /// Enrich each profile with the legitimacy booleans. Mutates profiles
    /// in place.
    pub fn apply(profiles: &mut BTreeMap<String, AccountProfile>, transactions: &[Transaction]) {
        let mut incoming: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        let mut outgoing: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for txn in transactions {
            incoming.entry(txn.receiver.as_str()).or_default().push(txn);
            outgoing.entry(txn.sender.as_str()).or_default().push(txn);
        }

        for (account_id, profile) in profiles.iter_mut() {
            let inc = incoming
                .get(account_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let out = outgoing
                .get(account_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            profile.is_payroll = is_payroll(inc, 0.10);
            profile.is_merchant = is_merchant(inc, out);
            profile.is_salary = is_salary(inc, out);
            profile.is_established_business = is_established_business(inc, out, account_id);
        }
    }
}

/// Payroll: a single dominant sender paying a consistent amount roughly
/// monthly.
fn is_payroll(inc: &[&Transaction], tolerance: f64) -> bool {
    if inc.len() < 3 {
        return false;
    }

    let mut sender_counts: HashMap<&str, usize> = HashMap::new();
    for txn in inc {
        *sender_counts.entry(txn.sender.as_str()).or_insert(0) += 1;
    }
    let (dominant, max_count) = match sender_counts
        .into_iter()
        .max_by_key(|&(sender, count)| (count, std::cmp::Reverse(sender)))
    {
        Some(pair) => pair,
        None => return false,
    };

    if (max_count as f64) / (inc.len() as f64) < 0.80 {
        return false;
    }

    let mut dominant_txns: Vec<(DateTime<Utc>, f64)> = inc
        .iter()
        .filter(|t| t.sender == dominant)
        .map(|t| (t.timestamp, t.amount))
        .collect();
    dominant_txns.sort_by_key(|&(ts, _)| ts);
    if dominant_txns.len() < 3 {
        return false;
    }

    // Amount consistency via coefficient of variation
    let n = dominant_txns.len() as f64;
    let sum: f64 = dominant_txns.iter().map(|&(_, a)| a).sum();
    let sum_sq: f64 = dominant_txns.iter().map(|&(_, a)| a * a).sum();
    let mean = sum / n;
    if mean == 0.0 {
        return false;
    }
    let variance = (sum_sq / n - mean * mean).max(0.0);
    if variance.sqrt() / mean > tolerance {
        return false;
    }

    // Roughly monthly cadence between dominant-sender payments
    let timestamps: Vec<DateTime<Utc>> = dominant_txns.iter().map(|&(ts, _)| ts).collect();
    median_interval_days(&timestamps).is_some_and(|days| (25.0..=35.0).contains(&days))
}

/// Merchant: business-looking id, or many small round-priced inflows with
/// fewer, larger outflows.
fn is_merchant(inc: &[&Transaction], out: &[&Transaction]) -> bool {
    if let Some(first) = inc.first() {
        if looks_like_business(&first.receiver) {
            return true;
        }
    }

    if inc.len() < 20 {
        return false;
    }

    let avg_in: f64 = inc.iter().map(|t| t.amount).sum::<f64>() / inc.len() as f64;
    let avg_out = if out.is_empty() {
        0.0
    } else {
        out.iter().map(|t| t.amount).sum::<f64>() / out.len() as f64
    };

    if avg_out <= avg_in {
        return false;
    }
    if inc.len() < 5 * out.len().max(1) {
        return false;
    }

    let round_count = inc.iter().filter(|t| is_round_number(t.amount)).count();
    (round_count as f64) / (inc.len() as f64) > 0.3
}

/// Salary: recurring large deposits on a monthly cadence plus regular
/// outgoing payments.
fn is_salary(inc: &[&Transaction], out: &[&Transaction]) -> bool {
    if inc.len() < 2 {
        return false;
    }

    let max_amount = inc.iter().map(|t| t.amount).fold(0.0, f64::max);
    let mut large_ts: Vec<DateTime<Utc>> = inc
        .iter()
        .filter(|t| t.amount > 0.7 * max_amount)
        .map(|t| t.timestamp)
        .collect();
    if large_ts.len() < 2 {
        return false;
    }
    large_ts.sort();

    if !median_interval_days(&large_ts).is_some_and(|days| (25.0..=35.0).contains(&days)) {
        return false;
    }

    out.len() >= 3
}

/// Established business: long history, high volume, diverse counterparties.
fn is_established_business(inc: &[&Transaction], out: &[&Transaction], account_id: &str) -> bool {
    let total = inc.len() + out.len();
    if total < 20 {
        return false;
    }

    let mut min_ts: Option<DateTime<Utc>> = None;
    let mut max_ts: Option<DateTime<Utc>> = None;
    for txn in inc.iter().chain(out.iter()) {
        min_ts = Some(min_ts.map_or(txn.timestamp, |m| m.min(txn.timestamp)));
        max_ts = Some(max_ts.map_or(txn.timestamp, |m| m.max(txn.timestamp)));
    }
    let (min_ts, max_ts) = match (min_ts, max_ts) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return false,
    };
    let history_days = (max_ts - min_ts).num_hours() as f64 / 24.0;
    if history_days < 180.0 {
        return false;
    }

    let mut counterparties: HashSet<&str> = HashSet::new();
    for txn in inc {
        counterparties.insert(txn.sender.as_str());
    }
    for txn in out {
        counterparties.insert(txn.receiver.as_str());
    }
    if counterparties.len() < 10 {
        return false;
    }

    looks_like_business(account_id) || total > 100
}

/// Median gap in days between consecutive sorted timestamps.
fn median_interval_days(sorted_ts: &[DateTime<Utc>]) -> Option<f64> {
    if sorted_ts.len() < 2 {
        return None;
    }
    let mut diffs: Vec<f64> = sorted_ts
        .windows(2)
        .map(|w| (w[1] - w[0]).num_hours() as f64 / 24.0)
        .collect();
    diffs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(diffs[diffs.len() / 2])
}

fn is_round_number(amount: f64) -> bool {
    let cents = ((amount * 100.0).round() as i64).rem_euclid(100);
    ROUND_CENTS.contains(&cents)
}

impl AnalyticKernel for LegitimacyFilter {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TransactionGraph;
    use chrono::TimeZone;

    fn monthly(month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, 1, 9, 0, 0).unwrap()
    }

    fn profiles_for(txns: &[Transaction]) -> BTreeMap<String, AccountProfile> {
        let graph = TransactionGraph::build(txns);
        let mut profiles = graph.build_profiles();
        LegitimacyFilter::apply(&mut profiles, txns);
        profiles
    }

    #[test]
    fn test_filter_metadata() {
        let kernel = LegitimacyFilter::new();
        assert_eq!(kernel.metadata().id, "profile/legitimacy-filter");
        assert_eq!(kernel.metadata().domain, Domain::Profiling);
    }

    #[test]
    fn test_payroll_detection() {
        // Six months of identical salary from one employer
        let txns: Vec<Transaction> = (1..=6)
            .map(|m| Transaction::new("EMPLOYER_X", "E", 5000.0, monthly(m)))
            .collect();
        let profiles = profiles_for(&txns);
        assert!(profiles.get("E").unwrap().is_payroll);
    }

    #[test]
    fn test_payroll_requires_dominance() {
        // Six senders, no dominant one
        let txns: Vec<Transaction> = (1..=6)
            .map(|m| Transaction::new(format!("S{}", m), "E", 5000.0, monthly(m)))
            .collect();
        let profiles = profiles_for(&txns);
        assert!(!profiles.get("E").unwrap().is_payroll);
    }

    #[test]
    fn test_payroll_requires_consistent_amounts() {
        // Wildly varying amounts fail the coefficient-of-variation gate
        let amounts = [5000.0, 9000.0, 2000.0, 7500.0, 1000.0, 6000.0];
        let txns: Vec<Transaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, &a)| Transaction::new("EMPLOYER_X", "E", a, monthly(i as u32 + 1)))
            .collect();
        let profiles = profiles_for(&txns);
        assert!(!profiles.get("E").unwrap().is_payroll);
    }

    #[test]
    fn test_payroll_requires_monthly_cadence() {
        // Weekly payments: median interval ~7 days, outside [25, 35]
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let txns: Vec<Transaction> = (0..6)
            .map(|w| {
                Transaction::new(
                    "EMPLOYER_X",
                    "E",
                    5000.0,
                    base + chrono::Duration::weeks(w),
                )
            })
            .collect();
        let profiles = profiles_for(&txns);
        assert!(!profiles.get("E").unwrap().is_payroll);
    }

    #[test]
    fn test_merchant_by_name() {
        let txns = vec![Transaction::new("alice", "CORNER_STORE", 4.99, monthly(1))];
        let profiles = profiles_for(&txns);
        assert!(profiles.get("CORNER_STORE").unwrap().is_merchant);
    }

    #[test]
    fn test_merchant_by_volume() {
        // 25 round-priced sales in, 2 larger settlements out
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut txns: Vec<Transaction> = (0..25)
            .map(|i| {
                Transaction::new(
                    format!("BUYER{}", i),
                    "M",
                    9.99,
                    base + chrono::Duration::hours(i as i64),
                )
            })
            .collect();
        txns.push(Transaction::new("M", "SUPPLIER", 120.0, monthly(2)));
        txns.push(Transaction::new("M", "SUPPLIER", 110.0, monthly(3)));
        let profiles = profiles_for(&txns);
        assert!(profiles.get("M").unwrap().is_merchant);
    }

    #[test]
    fn test_merchant_needs_round_prices() {
        // Same shape as above but odd cent values
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut txns: Vec<Transaction> = (0..25)
            .map(|i| {
                Transaction::new(
                    format!("BUYER{}", i),
                    "M",
                    9.37,
                    base + chrono::Duration::hours(i as i64),
                )
            })
            .collect();
        txns.push(Transaction::new("M", "SUPPLIER", 120.0, monthly(2)));
        txns.push(Transaction::new("M", "SUPPLIER", 110.0, monthly(3)));
        let profiles = profiles_for(&txns);
        assert!(!profiles.get("M").unwrap().is_merchant);
    }

    #[test]
    fn test_salary_detection() {
        // Monthly deposits plus at least three outgoing bills
        let mut txns: Vec<Transaction> = (1..=4)
            .map(|m| Transaction::new("job", "W", 4200.0, monthly(m)))
            .collect();
        txns.push(Transaction::new("W", "landlord", 1500.0, monthly(1)));
        txns.push(Transaction::new("W", "utility", 140.0, monthly(2)));
        txns.push(Transaction::new("W", "grocer", 300.0, monthly(3)));
        let profiles = profiles_for(&txns);
        assert!(profiles.get("W").unwrap().is_salary);
    }

    #[test]
    fn test_salary_requires_outgoing() {
        let txns: Vec<Transaction> = (1..=4)
            .map(|m| Transaction::new("job", "W", 4200.0, monthly(m)))
            .collect();
        let profiles = profiles_for(&txns);
        assert!(!profiles.get("W").unwrap().is_salary);
    }

    #[test]
    fn test_established_business() {
        // 26 transactions over ~2 years with 13 distinct counterparties
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        let mut txns = Vec::new();
        for i in 0..13 {
            txns.push(Transaction::new(
                format!("CLIENT{}", i),
                "NORTHWIND_LLC",
                1000.0 + i as f64,
                base + chrono::Duration::days(i as i64 * 28),
            ));
            txns.push(Transaction::new(
                "NORTHWIND_LLC",
                format!("VENDOR{}", i),
                400.0,
                base + chrono::Duration::days(i as i64 * 56),
            ));
        }
        let profiles = profiles_for(&txns);
        assert!(profiles.get("NORTHWIND_LLC").unwrap().is_established_business);
    }

    #[test]
    fn test_established_business_needs_history() {
        // Same volume compressed into a week fails the 180-day gate
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut txns = Vec::new();
        for i in 0..13 {
            txns.push(Transaction::new(
                format!("CLIENT{}", i),
                "NORTHWIND_LLC",
                1000.0,
                base + chrono::Duration::hours(i as i64),
            ));
            txns.push(Transaction::new(
                "NORTHWIND_LLC",
                format!("VENDOR{}", i),
                400.0,
                base + chrono::Duration::hours(100 + i as i64),
            ));
        }
        let profiles = profiles_for(&txns);
        assert!(!profiles.get("NORTHWIND_LLC").unwrap().is_established_business);
    }

    #[test]
    fn test_round_number_cents() {
        assert!(is_round_number(100.00));
        assert!(is_round_number(9.99));
        assert!(is_round_number(4.95));
        assert!(is_round_number(2.49));
        assert!(is_round_number(7.50));
        assert!(!is_round_number(9.37));
        assert!(!is_round_number(12.34));
    }
}
