//! Directed transaction multi-graph.
//!
//! Adjacency-list representation built in a single linear pass over the
//! transaction sequence. The graph is frozen after construction: detectors
//! hold shared borrows and never mutate it.
//!
//! Node and edge containers are ordered maps so that every iteration that
//! feeds user-visible output is deterministic by construction.

use crate::types::{AccountProfile, AccountType, Transaction};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Business-suggesting tokens matched case-insensitively against account ids.
const BUSINESS_TOKENS: &[&str] = &[
    "corp", "inc", "llc", "ltd", "merchant", "store", "shop", "pay", "bank", "services",
];

/// Returns true if the account id looks like a business name.
///
/// Plain substring match for every token except `co`, which only counts
/// when followed by a non-alphanumeric character or the end of the id
/// (otherwise ids like `ACCOUNT_1` would classify as business).
#[must_use]
pub fn looks_like_business(id: &str) -> bool {
    let lower = id.to_lowercase();
    if BUSINESS_TOKENS.iter().any(|t| lower.contains(t)) {
        return true;
    }
    lower.match_indices("co").any(|(i, _)| {
        lower[i + 2..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Per-node aggregates maintained during the build pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStats {
    /// Sum of inbound amounts.
    pub total_inflow: f64,
    /// Sum of outbound amounts.
    pub total_outflow: f64,
    /// Inbound plus outbound transaction count (multi-edge multiplicity).
    pub transaction_count: usize,
    /// Earliest observed timestamp.
    pub first_seen: Option<DateTime<Utc>>,
    /// Latest observed timestamp.
    pub last_seen: Option<DateTime<Utc>>,
}

impl NodeStats {
    fn observe(&mut self, ts: DateTime<Utc>) {
        self.first_seen = Some(match self.first_seen {
            Some(first) => first.min(ts),
            None => ts,
        });
        self.last_seen = Some(match self.last_seen {
            Some(last) => last.max(ts),
            None => ts,
        });
    }
}

/// Aggregate over all transactions sharing a (sender, receiver) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedEdge {
    /// Sum of amounts for this directed pair.
    pub total_amount: f64,
    /// Number of transactions for this directed pair.
    pub transaction_count: usize,
    /// Earliest transaction timestamp on this pair.
    pub earliest: DateTime<Utc>,
    /// Latest transaction timestamp on this pair.
    pub latest: DateTime<Utc>,
    /// Every (amount, timestamp) pair for this directed pair, in input order.
    pub transactions: Vec<(f64, DateTime<Utc>)>,
}

impl AggregatedEdge {
    fn new(amount: f64, ts: DateTime<Utc>) -> Self {
        Self {
            total_amount: amount,
            transaction_count: 1,
            earliest: ts,
            latest: ts,
            transactions: vec![(amount, ts)],
        }
    }

    fn add(&mut self, amount: f64, ts: DateTime<Utc>) {
        self.total_amount += amount;
        self.transaction_count += 1;
        self.earliest = self.earliest.min(ts);
        self.latest = self.latest.max(ts);
        self.transactions.push((amount, ts));
    }
}

/// Directed multi-graph over accounts and transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    nodes: BTreeMap<String, NodeStats>,
    edges: BTreeMap<String, BTreeMap<String, AggregatedEdge>>,
    adjacency: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
    transaction_count: usize,
    business_cache: HashMap<String, bool>,
}

impl TransactionGraph {
    /// Build the graph from a transaction sequence in a single pass.
    ///
    /// No transaction is ignored; duplicates are additive.
    #[must_use]
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = Self::default();

        for txn in transactions {
            let sender = graph.nodes.entry(txn.sender.clone()).or_default();
            sender.total_outflow += txn.amount;
            sender.transaction_count += 1;
            sender.observe(txn.timestamp);

            let receiver = graph.nodes.entry(txn.receiver.clone()).or_default();
            receiver.total_inflow += txn.amount;
            receiver.transaction_count += 1;
            receiver.observe(txn.timestamp);

            graph
                .edges
                .entry(txn.sender.clone())
                .or_default()
                .entry(txn.receiver.clone())
                .and_modify(|e| e.add(txn.amount, txn.timestamp))
                .or_insert_with(|| AggregatedEdge::new(txn.amount, txn.timestamp));

            graph
                .adjacency
                .entry(txn.sender.clone())
                .or_default()
                .insert(txn.receiver.clone());
            graph
                .reverse
                .entry(txn.receiver.clone())
                .or_default()
                .insert(txn.sender.clone());

            graph.transaction_count += 1;
        }

        // Classification is cached once per node so repeated lookups during
        // profile building and projection avoid rescanning the id.
        graph.business_cache = graph
            .nodes
            .keys()
            .map(|id| (id.clone(), looks_like_business(id)))
            .collect();

        graph
    }

    // ── Node accessors ─────────────────────────────────────────────────

    /// All nodes with their aggregates, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeStats)> {
        self.nodes.iter().map(|(id, stats)| (id.as_str(), stats))
    }

    /// Aggregates for a single node.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeStats> {
        self.nodes.get(id)
    }

    /// True if the node exists in the graph.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of distinct accounts.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of transactions consumed (multi-edge multiplicity).
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    // ── Edge accessors ─────────────────────────────────────────────────

    /// Aggregated edge for a directed pair, if at least one transaction
    /// has sender `u` and receiver `v`.
    #[must_use]
    pub fn edge(&self, u: &str, v: &str) -> Option<&AggregatedEdge> {
        self.edges.get(u)?.get(v)
    }

    /// All aggregated edges as (sender, receiver, edge), in id order.
    pub fn aggregated_edges(&self) -> impl Iterator<Item = (&str, &str, &AggregatedEdge)> {
        self.edges.iter().flat_map(|(u, targets)| {
            targets
                .iter()
                .map(move |(v, edge)| (u.as_str(), v.as_str(), edge))
        })
    }

    /// Number of distinct directed (sender, receiver) pairs.
    #[must_use]
    pub fn aggregated_edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    // ── Adjacency ──────────────────────────────────────────────────────

    /// Unique successors of a node, in id order.
    pub fn successors(&self, node: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(node)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Unique predecessors of a node, in id order.
    pub fn predecessors(&self, node: &str) -> impl Iterator<Item = &str> {
        self.reverse
            .get(node)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Unique-successor count.
    #[must_use]
    pub fn out_degree(&self, node: &str) -> usize {
        self.adjacency.get(node).map_or(0, BTreeSet::len)
    }

    /// Unique-predecessor count.
    #[must_use]
    pub fn in_degree(&self, node: &str) -> usize {
        self.reverse.get(node).map_or(0, BTreeSet::len)
    }

    /// Graph neighbours: successors union predecessors, minus the node
    /// itself, in id order.
    #[must_use]
    pub fn neighbours(&self, node: &str) -> Vec<String> {
        let mut connected: BTreeSet<&str> =
            self.successors(node).chain(self.predecessors(node)).collect();
        connected.remove(node);
        connected.into_iter().map(str::to_string).collect()
    }

    // ── Classification & profiles ──────────────────────────────────────

    /// Classification for a node id, using the cached token-match result.
    #[must_use]
    pub fn classify(&self, id: &str) -> AccountType {
        match self.business_cache.get(id) {
            Some(true) => AccountType::Business,
            Some(false) => AccountType::Individual,
            None => AccountType::Unknown,
        }
    }

    /// Build an account profile for every node, in id order.
    ///
    /// Legitimacy tags are left false; the legitimacy filter fills them in.
    #[must_use]
    pub fn build_profiles(&self) -> BTreeMap<String, AccountProfile> {
        self.nodes
            .iter()
            .map(|(id, stats)| {
                let profile = AccountProfile {
                    account_id: id.clone(),
                    is_payroll: false,
                    is_merchant: false,
                    is_salary: false,
                    is_established_business: false,
                    account_type: self.classify(id),
                    total_inflow: stats.total_inflow,
                    total_outflow: stats.total_outflow,
                    transaction_count: stats.transaction_count,
                    first_seen: stats.first_seen,
                    last_seen: stats.last_seen,
                };
                (id.clone(), profile)
            })
            .collect()
    }
}
