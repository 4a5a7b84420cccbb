use super::prompts::build_gap_analysis_prompt;
use super::record_parser::{parse_records, split_entries};
use super::suite_generator::PassReport;
use super::types::GapDraft;
use crate::domain::gap::Gap;
use crate::domain::requirement::RequirementDocument;
use crate::domain::test_case::TestCase;
use crate::infrastructure::oracle::{OracleGateway, OracleTask};
use std::sync::Arc;

pub struct GapAnalyzer {
    gateway: Arc<OracleGateway>,
    language: String,
}

impl GapAnalyzer {
    pub fn new(gateway: Arc<OracleGateway>, language: &str) -> Self {
        Self {
            gateway,
            language: language.to_string(),
        }
    }

    /// Gaps in production order. Gaps are not deduplicated against each other.
    /// A failed analysis is treated like "no gaps found" and reported as degraded.
    pub async fn analyze(
        &self,
        document: &RequirementDocument,
        accepted: &[TestCase],
    ) -> (Vec<Gap>, PassReport) {
        let task = OracleTask::GapAnalysis;
        let mut report = PassReport::new(task, None);
        let prompt = build_gap_analysis_prompt(document, accepted, &self.language);

        let entries = match self.gateway.call(&prompt).await {
            Ok(raw) => match parse_records::<GapDraft>(&raw) {
                Ok(entries) => entries,
                Err(err) => return (Vec::new(), report.degrade(&err)),
            },
            Err(err) => return (Vec::new(), report.degrade(&err)),
        };

        let (drafts, failures) = split_entries(task, entries);
        let gaps: Vec<Gap> = drafts.into_iter().map(GapDraft::into_gap).collect();
        report.accepted = gaps.len();
        report.schema_failures = failures;
        report.log_finished();
        (gaps, report)
    }
}
