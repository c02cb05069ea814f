//! Time-ordered transaction index.
//!
//! Sort-once index over a transaction slice, shared by the sliding-window
//! scans. Provides the timestamp-ordered traversal and O(log n) range
//! queries the window algorithms rely on, keeping the overall smurfing
//! pass at O(N log N).

use crate::types::Transaction;
use chrono::{DateTime, Utc};

/// Timestamp-ordered view over a borrowed transaction slice.
///
/// The sort is stable: transactions with equal timestamps keep their
/// input order, which keeps downstream window selection deterministic.
#[derive(Debug)]
pub struct TimeIndex<'a> {
    transactions: &'a [Transaction],
    order: Vec<usize>,
}

impl<'a> TimeIndex<'a> {
    /// Build the index by sorting positions once by timestamp.
    #[must_use]
    pub fn new(transactions: &'a [Transaction]) -> Self {
        let mut order: Vec<usize> = (0..transactions.len()).collect();
        order.sort_by_key(|&i| transactions[i].timestamp);
        Self {
            transactions,
            order,
        }
    }

    /// Number of indexed transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no transactions are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Positions into the underlying slice, in timestamp order.
    #[must_use]
    pub fn sorted_positions(&self) -> &[usize] {
        &self.order
    }

    /// Transactions in timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.order.iter().map(|&i| &self.transactions[i])
    }

    /// All transactions with `start <= timestamp <= end`, in timestamp order.
    pub fn range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a Transaction> + '_ {
        let lo = self
            .order
            .partition_point(|&i| self.transactions[i].timestamp < start);
        let hi = self
            .order
            .partition_point(|&i| self.transactions[i].timestamp <= end);
        self.order[lo..hi].iter().map(|&i| &self.transactions[i])
    }

    /// Earliest and latest indexed timestamps.
    #[must_use]
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.order.first().map(|&i| self.transactions[i].timestamp)?;
        let last = self.order.last().map(|&i| self.transactions[i].timestamp)?;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn create_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new("A", "B", 10.0, ts(5)),
            Transaction::new("B", "C", 20.0, ts(1)),
            Transaction::new("C", "D", 30.0, ts(3)),
            Transaction::new("D", "E", 40.0, ts(1)),
        ]
    }

    #[test]
    fn test_sorted_order_is_stable() {
        let txns = create_transactions();
        let index = TimeIndex::new(&txns);

        let order: Vec<f64> = index.iter().map(|t| t.amount).collect();
        // Equal timestamps (positions 1 and 3) keep input order
        assert_eq!(order, vec![20.0, 40.0, 30.0, 10.0]);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_range_is_inclusive() {
        let txns = create_transactions();
        let index = TimeIndex::new(&txns);

        let hits: Vec<f64> = index.range(ts(1), ts(3)).map(|t| t.amount).collect();
        assert_eq!(hits, vec![20.0, 40.0, 30.0]);

        let none: Vec<f64> = index.range(ts(6), ts(8)).map(|t| t.amount).collect();
        assert!(none.is_empty());
    }

    #[test]
    fn test_span() {
        let txns = create_transactions();
        let index = TimeIndex::new(&txns);
        assert_eq!(index.span(), Some((ts(1), ts(5))));

        let empty: Vec<Transaction> = Vec::new();
        assert!(TimeIndex::new(&empty).span().is_none());
        assert!(TimeIndex::new(&empty).is_empty());
    }
}
