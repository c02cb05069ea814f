//! # Muletrace Engine
//!
//! Analysis orchestrator for the muletrace money-muling detection core.
//!
//! The engine runs the batch pipeline end to end:
//!
//! 1. Build the frozen transaction graph
//! 2. Run the three detectors on parallel workers
//! 3. Re-number every detected ring into one dense global sequence
//! 4. Build account profiles and apply the legitimacy filter
//! 5. Fuse all evidence into per-account suspicion scores
//! 6. Assemble the ranked report and consumer projections
//!
//! Callers receive either a completed [`types::AnalysisResult`] or an error
//! result; there is no partial success.

#![warn(missing_docs)]

pub mod engine;
pub mod projection;
pub mod report;
pub mod rings;
pub mod scoring;
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::engine::AnalysisEngine;
    pub use crate::projection::{DownloadView, GraphView, StatusView};
    pub use crate::scoring::RuleScorer;
    pub use crate::types::{AnalysisResult, FraudRing, Summary, SuspiciousAccount};
}

pub use engine::AnalysisEngine;
pub use types::AnalysisResult;
