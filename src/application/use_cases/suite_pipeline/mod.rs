mod dedup;
mod document_validator;
mod gap_analyzer;
mod id_assigner;
mod llm_output;
mod pipeline;
mod prompts;
mod record_parser;
mod suite_generator;
mod summaries;
mod types;

use crate::domain::pipeline_config::PipelineConfig;
use crate::infrastructure::oracle::{OracleGateway, RetryPolicy, TextGenerationOracle};
use std::sync::Arc;

pub use dedup::{DedupOutcome, Deduplicator, MergeStats};
pub use document_validator::DocumentValidator;
pub use gap_analyzer::GapAnalyzer;
pub use id_assigner::finalize;
pub use pipeline::{GeneratedSuite, PipelineOutcome, RunDiagnostics};
pub use record_parser::SchemaFailure;
pub use suite_generator::{PassReport, SuiteGenerator};

/// Requirements document in, finalized test suite out.
pub struct TestSuitePipeline {
    validator: DocumentValidator,
    generator: SuiteGenerator,
    analyzer: GapAnalyzer,
    id_base: u32,
}

impl TestSuitePipeline {
    pub fn new(
        oracle: Arc<dyn TextGenerationOracle>,
        policy: RetryPolicy,
        config: &PipelineConfig,
    ) -> Self {
        let gateway = Arc::new(OracleGateway::new(oracle, policy));
        Self {
            validator: DocumentValidator::new(
                gateway.clone(),
                config.stop_validation_at_first_failure,
                &config.output_language,
            ),
            generator: SuiteGenerator::new(gateway.clone(), config),
            analyzer: GapAnalyzer::new(gateway, &config.output_language),
            id_base: config.id_base,
        }
    }
}
