use super::id_assigner::finalize;
use super::suite_generator::PassReport;
use super::TestSuitePipeline;
use crate::domain::error::Result;
use crate::domain::requirement::RequirementDocument;
use crate::domain::test_suite::{FinalizedSuite, TestSuite};
use crate::domain::validation::ValidationReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// How a run ended when it did not hit a fatal error.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// The document failed validation; no generation call was made.
    Rejected(ValidationReport),
    Completed(GeneratedSuite),
}

impl PipelineOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, PipelineOutcome::Rejected(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSuite {
    pub suite: FinalizedSuite,
    pub diagnostics: RunDiagnostics,
}

/// Per-run bookkeeping, kept apart from the suite itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunDiagnostics {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub passes: Vec<PassReport>,
}

impl RunDiagnostics {
    pub fn schema_failure_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.schema_failures.len()).sum()
    }

    pub fn duplicates_discarded(&self) -> usize {
        self.passes.iter().map(|pass| pass.duplicates).sum()
    }

    pub fn degraded_passes(&self) -> impl Iterator<Item = &PassReport> {
        self.passes.iter().filter(|pass| pass.degraded.is_some())
    }
}

impl TestSuitePipeline {
    /// Validation, main pass, edge pass, gap analysis, one pass per gap, ids.
    ///
    /// Returns `Err` only for fatal conditions: validation could not be
    /// completed, or the main pass failed.
    pub async fn generate_suite(&self, document: &RequirementDocument) -> Result<PipelineOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("generate_suite", run_id = %run_id);
        self.run(document, run_id).instrument(span).await
    }

    async fn run(&self, document: &RequirementDocument, run_id: String) -> Result<PipelineOutcome> {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!(document_chars = document.text().chars().count(), "Starting run");

        let report = self.validator.validate(document).await?;
        if !report.is_valid() {
            warn!(issues = report.issues.len(), "Requirements document rejected");
            return Ok(PipelineOutcome::Rejected(report));
        }

        let mut suite = TestSuite::new();
        let mut passes = Vec::new();

        passes.push(self.generator.main_pass(document, &mut suite).await?);
        passes.push(self.generator.edge_pass(document, &mut suite).await);

        let (gaps, analysis) = self.analyzer.analyze(document, suite.cases()).await;
        passes.push(analysis);
        passes.extend(self.generator.gap_passes(document, &gaps, &mut suite).await);

        let finalized = finalize(suite, gaps, self.id_base);
        let diagnostics = RunDiagnostics {
            run_id,
            started_at,
            elapsed_ms: timer.elapsed().as_millis() as u64,
            passes,
        };

        info!(
            main_cases = finalized.main_cases.len(),
            edge_cases = finalized.edge_cases.len(),
            gaps = finalized.gaps.len(),
            gap_cases = finalized.gap_derived_cases.len(),
            duplicates = diagnostics.duplicates_discarded(),
            schema_failures = diagnostics.schema_failure_count(),
            degraded_passes = diagnostics.degraded_passes().count(),
            elapsed_ms = diagnostics.elapsed_ms,
            "Run finished"
        );

        Ok(PipelineOutcome::Completed(GeneratedSuite {
            suite: finalized,
            diagnostics,
        }))
    }
}
