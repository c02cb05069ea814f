//! Analysis orchestrator.
//!
//! Runs the batch pipeline: graph build, three parallel detector workers,
//! global ring assignment, profiling and filtering, scoring, and report
//! assembly. The graph and transaction sequence are frozen before detector
//! dispatch and shared read-only; workers return owned result vectors.

use crate::projection::{self, GraphView};
use crate::report;
use crate::rings;
use crate::scoring::RuleScorer;
use crate::types::AnalysisResult;
use async_trait::async_trait;
use muletrace_core::config::EngineConfig;
use muletrace_core::error::{EngineError, Result};
use muletrace_core::{domain::Domain, kernel::KernelMetadata};
use muletrace_core::traits::{AnalyticKernel, BatchKernel};
use muletrace_detect::graph::TransactionGraph;
use muletrace_detect::types::{AnalysisStatus, Transaction};
use muletrace_detect::{CycleScan, LegitimacyFilter, ShellScan, SmurfingScan};
use std::sync::Arc;
use std::time::Instant;

/// Batch analysis orchestrator.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    metadata: KernelMetadata,
    config: EngineConfig,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine {
    /// Create an engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            metadata: KernelMetadata::batch("core/analysis-engine", Domain::Core)
                .with_description("Money-muling batch analysis pipeline")
                .with_throughput(100_000)
                .with_latency_us(1_000.0),
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full analysis pipeline.
    ///
    /// Always returns an `AnalysisResult`: on any failure the result
    /// carries status `error` with a message and no partial detection
    /// output.
    pub async fn run(
        &self,
        analysis_id: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> AnalysisResult {
        let analysis_id = analysis_id.into();
        match self.run_inner(&analysis_id, transactions).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(analysis_id = %analysis_id, error = %err, "analysis failed");
                AnalysisResult::failed(analysis_id, err.to_string())
            }
        }
    }

    async fn run_inner(
        &self,
        analysis_id: &str,
        transactions: Vec<Transaction>,
    ) -> Result<AnalysisResult> {
        let started = Instant::now();

        if transactions.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        tracing::info!(
            analysis_id = %analysis_id,
            transactions = transactions.len(),
            "starting analysis"
        );

        // Freeze the inputs before detector dispatch; workers only borrow.
        let transactions = Arc::new(transactions);
        let graph = Arc::new(TransactionGraph::build(transactions.as_slice()));
        tracing::debug!(
            nodes = graph.node_count(),
            aggregated_edges = graph.aggregated_edge_count(),
            "graph frozen"
        );

        let cycle_cfg = self.config.cycle;
        let smurf_cfg = self.config.smurfing;
        let shell_cfg = self.config.shell;

        let cycle_graph = Arc::clone(&graph);
        let cycle_task =
            tokio::task::spawn_blocking(move || CycleScan::detect(&cycle_graph, &cycle_cfg));

        let smurf_txns = Arc::clone(&transactions);
        let smurf_task = tokio::task::spawn_blocking(move || {
            SmurfingScan::detect(smurf_txns.as_slice(), &smurf_cfg)
        });

        let shell_graph = Arc::clone(&graph);
        let shell_task =
            tokio::task::spawn_blocking(move || ShellScan::detect(&shell_graph, &shell_cfg));

        // A failed worker fails the whole run; partial results are dropped.
        let (mut cycles, mut smurfing, mut shells) =
            tokio::try_join!(cycle_task, smurf_task, shell_task)
                .map_err(|e| EngineError::internal(format!("detector worker failed: {e}")))?;

        tracing::debug!(
            cycles = cycles.len(),
            smurfing = smurfing.len(),
            shells = shells.len(),
            "detectors complete"
        );

        rings::assign_global_ring_ids(&mut cycles, &mut smurfing, &mut shells);

        let mut profiles = graph.build_profiles();
        LegitimacyFilter::apply(&mut profiles, transactions.as_slice());

        let scores = RuleScorer::score_all(&profiles, &cycles, &smurfing, &shells);

        let maps = report::collect_pattern_maps(&cycles, &smurfing, &shells);
        let suspicious_accounts =
            report::build_suspicious_accounts(&scores, &profiles, &maps, &graph)?;
        let fraud_rings = report::build_fraud_rings(&scores, &cycles, &smurfing, &shells);
        let graph_view: GraphView = projection::graph_view(&graph, &scores, &maps);

        let elapsed = started.elapsed().as_secs_f64();
        let summary = report::build_summary(
            transactions.len(),
            graph.node_count(),
            &suspicious_accounts,
            &fraud_rings,
            &cycles,
            &smurfing,
            &shells,
            elapsed,
        );

        tracing::info!(
            analysis_id = %analysis_id,
            suspicious = suspicious_accounts.len(),
            rings = fraud_rings.len(),
            elapsed_seconds = elapsed,
            "analysis complete"
        );

        Ok(AnalysisResult {
            analysis_id: analysis_id.to_string(),
            status: AnalysisStatus::Completed,
            summary,
            suspicious_accounts,
            fraud_rings,
            cycles,
            smurfing,
            shells,
            graph: graph_view,
            error: None,
        })
    }
}

impl AnalyticKernel for AnalysisEngine {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()
    }
}

#[async_trait]
impl BatchKernel<(String, Vec<Transaction>), AnalysisResult> for AnalysisEngine {
    async fn execute(&self, input: (String, Vec<Transaction>)) -> Result<AnalysisResult> {
        let (analysis_id, transactions) = input;
        Ok(self.run(analysis_id, transactions).await)
    }
}
