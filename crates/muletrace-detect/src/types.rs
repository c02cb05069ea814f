//! Detection types and data structures.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use muletrace_core::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Transaction Types
// ============================================================================

/// A financial transaction, validated by the ingestion front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Optional transaction ID from the source data.
    #[serde(default)]
    pub id: Option<String>,
    /// Sender account ID.
    pub sender: String,
    /// Receiver account ID.
    pub receiver: String,
    /// Transaction amount (non-negative).
    pub amount: f64,
    /// Timestamp (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction without a source transaction ID.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            timestamp,
        }
    }
}

/// Analysis run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    /// Queued, not yet started.
    #[serde(rename = "pending")]
    Pending,
    /// Analysis in progress.
    #[serde(rename = "processing")]
    Processing,
    /// Analysis finished successfully.
    #[serde(rename = "complete")]
    Completed,
    /// Analysis failed; see the error message.
    #[serde(rename = "error")]
    Failed,
}

impl AnalysisStatus {
    /// Returns the external status string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "complete",
            AnalysisStatus::Failed => "error",
        }
    }
}

/// Detected laundering pattern kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Circular fund routing.
    Cycle,
    /// Many senders into one receiver.
    FanIn,
    /// One sender out to many receivers.
    FanOut,
    /// Layered pass-through chain.
    Shell,
}

impl PatternType {
    /// Returns the external pattern string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PatternType::Cycle => "cycle",
            PatternType::FanIn => "fan_in",
            PatternType::FanOut => "fan_out",
            PatternType::Shell => "shell",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account classification derived from the account id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Personal account.
    Individual,
    /// Business account (id matches a business token).
    Business,
    /// Not yet classified.
    #[default]
    Unknown,
}

impl AccountType {
    /// Returns the external classification string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccountType::Individual => "individual",
            AccountType::Business => "business",
            AccountType::Unknown => "unknown",
        }
    }
}

// ============================================================================
// Detection Results
// ============================================================================

/// A detected simple cycle of circular fund routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    /// Globally assigned ring ID (empty until assignment).
    pub ring_id: String,
    /// Cycle nodes in path order.
    pub nodes: Vec<String>,
    /// Cycle length (node count).
    pub length: usize,
    /// Total amount across the cycle's edge transactions.
    pub total_amount: f64,
    /// Hours between the earliest and latest edge transaction.
    pub time_span_hours: f64,
    /// Number of edges in the cycle.
    pub edge_count: usize,
    /// Pattern tag, always `cycle`.
    pub pattern_type: PatternType,
}

/// A detected fan-in or fan-out structuring pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmurfingResult {
    /// Account at the center of the fan.
    pub account_id: String,
    /// `fan_in` or `fan_out`.
    pub pattern_type: PatternType,
    /// Unique counterparties within the best window.
    pub unique_counterparties: usize,
    /// Total amount within the best window.
    pub total_amount: f64,
    /// Amount per hour across the best window.
    pub velocity_per_hour: f64,
    /// Best window start.
    #[serde(with = "iso_seconds")]
    pub window_start: DateTime<Utc>,
    /// Best window end.
    #[serde(with = "iso_seconds")]
    pub window_end: DateTime<Utc>,
    /// Ring ID; provisional `SMURF_` prefix until global assignment.
    pub ring_id: String,
}

/// A detected layered shell chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellResult {
    /// Globally assigned ring ID (empty until assignment).
    pub ring_id: String,
    /// Pattern tag, always `shell`.
    pub pattern_type: PatternType,
    /// Full chain including endpoints, in path order.
    pub chain: Vec<String>,
    /// Chain minus endpoints.
    pub intermediate_accounts: Vec<String>,
    /// Total amount through the chain's edges.
    pub total_amount: f64,
    /// Number of intermediate accounts.
    pub shell_depth: usize,
    /// Risk score, populated by the scoring engine.
    pub risk_score: f64,
}

/// Per-account aggregates enriched with legitimacy tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Account ID.
    pub account_id: String,
    /// Looks like a payroll-receiving account.
    pub is_payroll: bool,
    /// Looks like a merchant account.
    pub is_merchant: bool,
    /// Looks like a salary account.
    pub is_salary: bool,
    /// Looks like an established business.
    pub is_established_business: bool,
    /// Classification derived from the account id.
    pub account_type: AccountType,
    /// Sum of inbound amounts.
    pub total_inflow: f64,
    /// Sum of outbound amounts.
    pub total_outflow: f64,
    /// Inbound plus outbound transaction count.
    pub transaction_count: usize,
    /// Earliest observed timestamp.
    pub first_seen: Option<DateTime<Utc>>,
    /// Latest observed timestamp.
    pub last_seen: Option<DateTime<Utc>>,
}

// ============================================================================
// Timestamp helpers
// ============================================================================

/// ISO-8601 rendering at seconds precision without a zone suffix.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse a timestamp in any of the accepted input formats.
///
/// Accepted: ISO-8601 with `T` or space separator, date-only, and
/// US `MM/DD/YYYY [HH:MM:SS]`. All values resolve to UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc());
            }
        }
    }
    Err(EngineError::validation(format!(
        "Unparseable timestamp: {s:?}"
    )))
}

/// Serde adapter for the zone-suffix-free ISO-8601 rendering.
pub mod iso_seconds {
    use super::{format_timestamp, parse_timestamp, DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as `YYYY-MM-DDTHH:MM:SS`.
    pub fn serialize<S: Serializer>(
        ts: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    /// Deserialize from any accepted input format.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_timestamp(&s).map_err(de::Error::custom)
    }
}

/// Round to two decimal places (monetary amounts, hour spans).
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_strings() {
        assert_eq!(AnalysisStatus::Pending.as_str(), "pending");
        assert_eq!(AnalysisStatus::Processing.as_str(), "processing");
        assert_eq!(AnalysisStatus::Completed.as_str(), "complete");
        assert_eq!(AnalysisStatus::Failed.as_str(), "error");
    }

    #[test]
    fn test_pattern_type_serialization() {
        assert_eq!(
            serde_json::to_string(&PatternType::FanIn).unwrap(),
            "\"fan_in\""
        );
        assert_eq!(
            serde_json::to_string(&PatternType::Cycle).unwrap(),
            "\"cycle\""
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15T10:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("01/15/2024 10:30:00").unwrap(), expected);

        let midnight = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15").unwrap(), midnight);
        assert_eq!(parse_timestamp("01/15/2024").unwrap(), midnight);

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_format_timestamp_no_zone_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-15T10:30:00");
    }

    #[test]
    fn test_smurfing_window_serialization() {
        let result = SmurfingResult {
            account_id: "R".to_string(),
            pattern_type: PatternType::FanIn,
            unique_counterparties: 10,
            total_amount: 9000.0,
            velocity_per_hour: 187.5,
            window_start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            ring_id: "SMURF_R".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["window_start"], "2024-01-01T00:00:00");
        assert_eq!(json["window_end"], "2024-01-03T00:00:00");
        assert_eq!(json["pattern_type"], "fan_in");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(15000.004), 15000.0);
        assert_eq!(round2(3000.0), 3000.0);
        assert_eq!(round2(187.499), 187.5);
    }
}
