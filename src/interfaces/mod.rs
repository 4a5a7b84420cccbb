pub mod cli;
pub mod markdown;

use crate::domain::test_suite::FinalizedSuite;

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content: String,
}

/// Turns a finalized suite into display documents. Never feeds back into
/// generation.
pub trait OutputFormatter {
    fn render(&self, suite: &FinalizedSuite) -> Vec<RenderedDocument>;
}
