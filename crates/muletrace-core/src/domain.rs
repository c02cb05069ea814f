//! Domain definitions for kernel categorization.
//!
//! Kernels are organized into domains representing the distinct analytical
//! areas of the pipeline. Domains are used for kernel discovery,
//! organization, and log filtering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Analytical domain for kernel categorization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Domain {
    /// Graph analytics: transaction multi-graph, adjacency, degree statistics
    GraphAnalytics,

    /// Pattern detection: cycles, structuring, shell chains
    PatternDetection,

    /// Profiling: account aggregates and legitimacy heuristics
    Profiling,

    /// Risk scoring: rule-based suspicion score fusion
    RiskScoring,

    /// Core: orchestration and infrastructure
    #[default]
    Core,
}

impl Domain {
    /// All available domains.
    pub const ALL: &'static [Domain] = &[
        Domain::GraphAnalytics,
        Domain::PatternDetection,
        Domain::Profiling,
        Domain::RiskScoring,
        Domain::Core,
    ];

    /// Returns the domain name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Domain::GraphAnalytics => "GraphAnalytics",
            Domain::PatternDetection => "PatternDetection",
            Domain::Profiling => "Profiling",
            Domain::RiskScoring => "RiskScoring",
            Domain::Core => "Core",
        }
    }

    /// Parse a domain from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GraphAnalytics" => Some(Domain::GraphAnalytics),
            "PatternDetection" => Some(Domain::PatternDetection),
            "Profiling" => Some(Domain::Profiling),
            "RiskScoring" => Some(Domain::RiskScoring),
            "Core" => Some(Domain::Core),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_all_count() {
        assert_eq!(Domain::ALL.len(), 5);
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!(
            Domain::parse("PatternDetection"),
            Some(Domain::PatternDetection)
        );
        assert_eq!(Domain::parse("Unknown"), None);
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::GraphAnalytics.to_string(), "GraphAnalytics");
        assert_eq!(Domain::RiskScoring.to_string(), "RiskScoring");
    }

    #[test]
    fn test_domain_default() {
        assert_eq!(Domain::default(), Domain::Core);
    }
}
