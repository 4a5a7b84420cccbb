//! Main, edge and per-gap generation passes over one shared [`TestSuite`].
//!
//! Every pass is oracle call -> record parsing -> one-at-a-time
//! deduplication. Only the main pass may fail the run; edge and gap passes
//! degrade to zero cases and say why in their [`PassReport`].

use super::dedup::Deduplicator;
use super::prompts::{build_edge_cases_prompt, build_gap_cases_prompt, build_main_cases_prompt};
use super::record_parser::{parse_records, require_records, split_entries, SchemaFailure};
use super::types::TestCaseDraft;
use crate::domain::error::{AppError, Result};
use crate::domain::gap::Gap;
use crate::domain::pipeline_config::PipelineConfig;
use crate::domain::requirement::RequirementDocument;
use crate::domain::test_case::{GapRef, Origin};
use crate::domain::test_suite::TestSuite;
use crate::infrastructure::oracle::{OracleGateway, OraclePrompt, OracleTask};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Bookkeeping for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub task: OracleTask,
    /// Set for gap-case passes.
    pub gap: Option<GapRef>,
    pub accepted: usize,
    pub duplicates: usize,
    pub schema_failures: Vec<SchemaFailure>,
    /// Why the pass contributed nothing, when it was absorbed as a partial result.
    pub degraded: Option<String>,
}

impl PassReport {
    pub(crate) fn new(task: OracleTask, gap: Option<GapRef>) -> Self {
        Self {
            task,
            gap,
            accepted: 0,
            duplicates: 0,
            schema_failures: Vec::new(),
            degraded: None,
        }
    }

    pub(crate) fn degrade(mut self, error: &AppError) -> Self {
        warn!(
            task = %self.task,
            gap = ?self.gap.map(|gap| gap.0),
            error = %error,
            "Pass degraded, continuing without its cases"
        );
        self.degraded = Some(error.to_string());
        self
    }

    pub(crate) fn log_finished(&self) {
        info!(
            task = %self.task,
            gap = ?self.gap.map(|gap| gap.0),
            accepted = self.accepted,
            duplicates = self.duplicates,
            schema_failures = self.schema_failures.len(),
            "Pass finished"
        );
    }
}

pub struct SuiteGenerator {
    gateway: Arc<OracleGateway>,
    dedup: Deduplicator,
    language: String,
    edge_case_target: usize,
    concurrent_gap_passes: bool,
    gap_pass_concurrency: usize,
}

impl SuiteGenerator {
    pub fn new(gateway: Arc<OracleGateway>, config: &PipelineConfig) -> Self {
        Self {
            gateway,
            dedup: Deduplicator,
            language: config.output_language.clone(),
            edge_case_target: config.edge_case_target.max(1),
            concurrent_gap_passes: config.concurrent_gap_passes,
            gap_pass_concurrency: config.gap_pass_concurrency.max(1),
        }
    }

    /// Fails the run when the oracle gives up or no valid case comes back.
    pub async fn main_pass(
        &self,
        document: &RequirementDocument,
        suite: &mut TestSuite,
    ) -> Result<PassReport> {
        let task = OracleTask::MainCases;
        let prompt = build_main_cases_prompt(document, &self.language);
        let raw = self.gateway.call(&prompt).await?;

        let (drafts, failures) = split_entries(task, parse_records::<TestCaseDraft>(&raw)?);
        require_records(task, &drafts, &failures)?;

        let mut report = PassReport::new(task, None);
        report.schema_failures = failures;
        self.merge(&mut report, drafts, Origin::Main, None, suite);
        report.log_finished();
        Ok(report)
    }

    /// Asks for `edge_case_target` cases the accepted set does not cover yet.
    pub async fn edge_pass(&self, document: &RequirementDocument, suite: &mut TestSuite) -> PassReport {
        let task = OracleTask::EdgeCases;
        let mut report = PassReport::new(task, None);
        let prompt =
            build_edge_cases_prompt(document, suite.cases(), self.edge_case_target, &self.language);

        let raw = match self.gateway.call(&prompt).await {
            Ok(raw) => raw,
            Err(err) => return report.degrade(&err),
        };
        let entries = match parse_records::<TestCaseDraft>(&raw) {
            Ok(entries) => entries,
            Err(err) => return report.degrade(&err),
        };

        let (drafts, failures) = split_entries(task, entries);
        report.schema_failures = failures;
        if let Err(err) = require_records(task, &drafts, &report.schema_failures) {
            return report.degrade(&err);
        }

        // The target caps accepted cases, so duplicates do not use up slots.
        let returned = drafts.len();
        let mut considered = 0;
        for draft in drafts {
            if report.accepted == self.edge_case_target {
                break;
            }
            considered += 1;
            let outcome = self
                .dedup
                .accept_if_unique(draft.into_case(Origin::Edge, None), suite);
            if outcome.is_accepted() {
                report.accepted += 1;
            } else {
                report.duplicates += 1;
            }
        }
        if considered < returned {
            info!(
                returned,
                dropped = returned - considered,
                target = self.edge_case_target,
                "Dropping edge cases beyond the target"
            );
        }

        report.log_finished();
        report
    }

    /// One sub-pass per gap, in gap order. Reports come back in the same order.
    pub async fn gap_passes(
        &self,
        document: &RequirementDocument,
        gaps: &[Gap],
        suite: &mut TestSuite,
    ) -> Vec<PassReport> {
        if self.concurrent_gap_passes && gaps.len() > 1 {
            self.run_gap_passes_concurrently(document, gaps, suite).await
        } else {
            self.run_gap_passes_sequentially(document, gaps, suite).await
        }
    }

    async fn run_gap_passes_sequentially(
        &self,
        document: &RequirementDocument,
        gaps: &[Gap],
        suite: &mut TestSuite,
    ) -> Vec<PassReport> {
        let mut reports = Vec::with_capacity(gaps.len());
        for (index, gap) in gaps.iter().enumerate() {
            let prompt = build_gap_cases_prompt(document, gap, suite.cases(), &self.language);
            let reply = self.gateway.call(&prompt).await;
            reports.push(self.absorb_gap_reply(GapRef(index), reply, suite));
        }
        reports
    }

    /// Oracle calls overlap; merging does not. Every prompt is seeded with
    /// the same snapshot and replies are deduplicated in gap order, so an
    /// earlier gap's case wins over a later duplicate.
    async fn run_gap_passes_concurrently(
        &self,
        document: &RequirementDocument,
        gaps: &[Gap],
        suite: &mut TestSuite,
    ) -> Vec<PassReport> {
        let semaphore = Arc::new(Semaphore::new(self.gap_pass_concurrency));
        let mut join_set = JoinSet::new();

        for (index, gap) in gaps.iter().enumerate() {
            let prompt: OraclePrompt =
                build_gap_cases_prompt(document, gap, suite.cases(), &self.language);
            let gateway = self.gateway.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let reply = match semaphore.acquire_owned().await {
                    Ok(_permit) => gateway.call(&prompt).await,
                    Err(err) => Err(AppError::Internal(format!(
                        "gap pass limiter closed: {}",
                        err
                    ))),
                };
                (index, reply)
            });
        }

        let mut replies: Vec<Option<Result<String>>> = (0..gaps.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, reply)) => replies[index] = Some(reply),
                Err(err) => warn!(error = %err, "Gap pass task did not complete"),
            }
        }

        replies
            .into_iter()
            .enumerate()
            .map(|(index, reply)| {
                let reply = reply.unwrap_or_else(|| {
                    Err(AppError::Internal("gap pass task did not complete".to_string()))
                });
                self.absorb_gap_reply(GapRef(index), reply, suite)
            })
            .collect()
    }

    /// A gap may legitimately yield no cases, so an empty batch is not degraded.
    fn absorb_gap_reply(
        &self,
        gap: GapRef,
        reply: Result<String>,
        suite: &mut TestSuite,
    ) -> PassReport {
        let task = OracleTask::GapCases;
        let mut report = PassReport::new(task, Some(gap));

        let entries = match reply.and_then(|raw| parse_records::<TestCaseDraft>(&raw)) {
            Ok(entries) => entries,
            Err(err) => return report.degrade(&err),
        };
        let (drafts, failures) = split_entries(task, entries);
        report.schema_failures = failures;

        self.merge(&mut report, drafts, Origin::GapDerived, Some(gap), suite);
        report.log_finished();
        report
    }

    fn merge(
        &self,
        report: &mut PassReport,
        drafts: Vec<TestCaseDraft>,
        origin: Origin,
        gap: Option<GapRef>,
        suite: &mut TestSuite,
    ) {
        let candidates = drafts
            .into_iter()
            .map(|draft| draft.into_case(origin, gap))
            .collect();
        let stats = self.dedup.merge_batch(report.task, candidates, suite);
        report.accepted += stats.accepted;
        report.duplicates += stats.duplicates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gap::Confidence;
    use crate::testing::{case_json, fast_policy, Reply, ScriptedOracle};
    use serde_json::json;

    fn generator(oracle: Arc<ScriptedOracle>, config: &PipelineConfig) -> SuiteGenerator {
        SuiteGenerator::new(Arc::new(OracleGateway::new(oracle, fast_policy())), config)
    }

    fn document() -> RequirementDocument {
        RequirementDocument::new("Users create extension tokens from the Tokens page.")
    }

    fn gaps() -> Vec<Gap> {
        vec![
            Gap::new("Token expiry is unspecified", "Tokens expire after 30 days", Confidence::High),
            Gap::new("Revocation is unspecified", "Users can revoke tokens", Confidence::Medium),
        ]
    }

    #[tokio::test]
    async fn main_pass_failure_is_fatal() {
        let oracle = Arc::new(ScriptedOracle::new().on(OracleTask::MainCases, Reply::Fail));
        let mut suite = TestSuite::new();
        let err = generator(oracle, &PipelineConfig::default())
            .main_pass(&document(), &mut suite)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LLMError(_)));
        assert!(suite.is_empty());
    }

    #[tokio::test]
    async fn main_pass_with_no_valid_record_is_fatal() {
        let oracle = Arc::new(ScriptedOracle::new().on(
            OracleTask::MainCases,
            Reply::text(json!([{"module": "Tokens"}]).to_string()),
        ));
        let mut suite = TestSuite::new();
        let err = generator(oracle, &PipelineConfig::default())
            .main_pass(&document(), &mut suite)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[tokio::test]
    async fn edge_pass_failure_degrades() {
        let oracle = Arc::new(ScriptedOracle::new().on(OracleTask::EdgeCases, Reply::Fail));
        let mut suite = TestSuite::new();
        let report = generator(oracle, &PipelineConfig::default())
            .edge_pass(&document(), &mut suite)
            .await;
        assert_eq!(report.accepted, 0);
        assert!(report.degraded.as_deref().unwrap_or("").contains("edge_cases"));
    }

    #[tokio::test]
    async fn edge_pass_keeps_at_most_the_target() {
        let batch: Vec<_> = (0..4)
            .map(|i| case_json("Tokens", &[format!("Edge step {i}").as_str()], &["Handled"]))
            .collect();
        let oracle = Arc::new(
            ScriptedOracle::new().on(OracleTask::EdgeCases, Reply::text(json!(batch).to_string())),
        );
        let config = PipelineConfig {
            edge_case_target: 2,
            ..PipelineConfig::default()
        };
        let mut suite = TestSuite::new();
        let report = generator(oracle, &config).edge_pass(&document(), &mut suite).await;

        assert_eq!(report.accepted, 2);
        assert!(suite.cases().iter().all(|case| case.origin == Origin::Edge));
    }

    #[tokio::test]
    async fn edge_duplicates_do_not_count_toward_the_target() {
        let mut suite = TestSuite::new();
        suite
            .insert_if_unique(
                TestCaseDraft {
                    title: None,
                    module: "Tokens".to_string(),
                    priority: crate::domain::test_case::Priority::High,
                    test_type: crate::domain::test_case::TestType::Functional,
                    prerequisites: None,
                    steps: vec!["Open the Tokens page".to_string()],
                    expected_results: vec!["Tokens listed".to_string()],
                }
                .into_case(Origin::Main, None),
            )
            .unwrap();

        let batch = json!([
            case_json("Tokens", &["OPEN the tokens page"], &["tokens listed"]),
            case_json("Tokens", &["Create two tokens at once"], &["Only one is kept"]),
            case_json("Tokens", &["Create a token while offline"], &["An error is shown"]),
            case_json("Tokens", &["Create a token with a long name"], &["The name is truncated"]),
        ]);
        let oracle = Arc::new(
            ScriptedOracle::new().on(OracleTask::EdgeCases, Reply::text(batch.to_string())),
        );
        let config = PipelineConfig {
            edge_case_target: 2,
            ..PipelineConfig::default()
        };
        let report = generator(oracle, &config).edge_pass(&document(), &mut suite).await;

        assert_eq!(report.accepted, 2);
        assert_eq!(report.duplicates, 1);
        let edge_steps: Vec<_> = suite
            .cases_with_origin(Origin::Edge)
            .map(|case| case.steps[0].as_str())
            .collect();
        assert_eq!(
            edge_steps,
            vec!["Create two tokens at once", "Create a token while offline"]
        );
    }

    #[tokio::test]
    async fn gap_pass_links_cases_and_tolerates_empty_batches() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .on_matching(
                    OracleTask::GapCases,
                    "Token expiry",
                    Reply::text(json!([case_json("Tokens", &["Wait 31 days"], &["Token rejected"])]).to_string()),
                )
                .on_matching(OracleTask::GapCases, "Revocation", Reply::text("[]")),
        );
        let mut suite = TestSuite::new();
        let reports = generator(oracle, &PipelineConfig::default())
            .gap_passes(&document(), &gaps(), &mut suite)
            .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].accepted, 1);
        assert_eq!(reports[1].accepted, 0);
        assert!(reports[1].degraded.is_none());
        assert_eq!(suite.cases()[0].origin_gap_ref, Some(GapRef(0)));
    }

    #[tokio::test]
    async fn sequential_gap_prompts_see_earlier_gap_cases() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .on_matching(
                    OracleTask::GapCases,
                    "Token expiry",
                    Reply::text(json!([case_json("Tokens", &["Wait 31 days"], &["Token rejected"])]).to_string()),
                )
                .on_matching(OracleTask::GapCases, "Revocation", Reply::text("[]")),
        );
        let mut suite = TestSuite::new();
        generator(oracle.clone(), &PipelineConfig::default())
            .gap_passes(&document(), &gaps(), &mut suite)
            .await;

        let calls = oracle.calls();
        assert!(calls[1].user.contains("Wait 31 days"));
    }

    #[tokio::test]
    async fn concurrent_duplicates_resolve_to_the_earlier_gap() {
        let shared = json!([case_json("Tokens", &["Revoke an expired token"], &["Error shown"])]).to_string();
        let oracle = Arc::new(
            ScriptedOracle::new()
                .on_matching(
                    OracleTask::GapCases,
                    "Token expiry",
                    Reply::Delayed(std::time::Duration::from_millis(5), shared.clone()),
                )
                .on_matching(OracleTask::GapCases, "Revocation", Reply::text(shared)),
        );
        let config = PipelineConfig {
            concurrent_gap_passes: true,
            ..PipelineConfig::default()
        };
        let mut suite = TestSuite::new();
        let reports = generator(oracle, &config)
            .gap_passes(&document(), &gaps(), &mut suite)
            .await;

        assert_eq!(suite.len(), 1);
        assert_eq!(suite.cases()[0].origin_gap_ref, Some(GapRef(0)));
        assert_eq!(reports[0].accepted, 1);
        assert_eq!(reports[1].duplicates, 1);
    }

    #[tokio::test]
    async fn failed_gap_pass_does_not_stop_the_others() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .on_matching(OracleTask::GapCases, "Token expiry", Reply::Fail)
                .on_matching(
                    OracleTask::GapCases,
                    "Revocation",
                    Reply::text(json!([case_json("Tokens", &["Revoke"], &["Gone"])]).to_string()),
                ),
        );
        let mut suite = TestSuite::new();
        let reports = generator(oracle, &PipelineConfig::default())
            .gap_passes(&document(), &gaps(), &mut suite)
            .await;

        assert!(reports[0].degraded.is_some());
        assert_eq!(reports[1].accepted, 1);
        assert_eq!(suite.cases()[0].origin_gap_ref, Some(GapRef(1)));
    }
}
