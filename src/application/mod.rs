pub mod use_cases;

pub use use_cases::suite_pipeline::{
    GeneratedSuite, PipelineOutcome, RunDiagnostics, TestSuitePipeline,
};
