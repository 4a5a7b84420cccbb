use crate::domain::gap::{Confidence, Gap};
use crate::domain::test_case::{GapRef, Origin, Priority, TestCase, TestType};
use serde::Deserialize;
use validator::Validate;

/// One test case as the oracle wrote it, before it is given an origin.
/// Oracle-supplied ids are ignored.
#[derive(Debug, Deserialize, Validate, Clone, PartialEq)]
pub(crate) struct TestCaseDraft {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[validate(length(min = 1))]
    pub(crate) module: String,
    pub(crate) priority: Priority,
    #[serde(rename = "type", alias = "test_type")]
    pub(crate) test_type: TestType,
    #[serde(default)]
    pub(crate) prerequisites: Option<Vec<String>>,
    #[validate(length(min = 1))]
    pub(crate) steps: Vec<String>,
    #[validate(length(min = 1))]
    #[serde(alias = "expected")]
    pub(crate) expected_results: Vec<String>,
}

impl TestCaseDraft {
    pub(crate) fn into_case(self, origin: Origin, origin_gap_ref: Option<GapRef>) -> TestCase {
        TestCase {
            id: None,
            title: self
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty()),
            module: self.module.trim().to_string(),
            priority: self.priority,
            test_type: self.test_type,
            prerequisites: trimmed_lines(self.prerequisites.unwrap_or_default()),
            steps: trimmed_lines(self.steps),
            expected_results: trimmed_lines(self.expected_results),
            origin,
            origin_gap_ref,
        }
    }
}

fn trimmed_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[derive(Debug, Deserialize, Validate, Clone, PartialEq)]
pub(crate) struct GapDraft {
    #[validate(length(min = 1))]
    pub(crate) description: String,
    #[validate(length(min = 1))]
    #[serde(alias = "clarification")]
    pub(crate) suggested_clarification: String,
    #[serde(alias = "confidence_level")]
    pub(crate) confidence: Confidence,
}

impl GapDraft {
    pub(crate) fn into_gap(self) -> Gap {
        Gap::new(
            self.description.trim(),
            self.suggested_clarification.trim(),
            self.confidence,
        )
    }
}

/// Reply of one document check.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct CheckOutput {
    #[serde(default)]
    pub(crate) is_valid: Option<bool>,
    #[serde(default)]
    pub(crate) issues: Option<Vec<IssueEntry>>,
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub(crate) enum IssueEntry {
    Text(String),
    Detailed {
        #[serde(alias = "description", alias = "message", alias = "issue")]
        detail: String,
    },
}

impl IssueEntry {
    pub(crate) fn detail(&self) -> &str {
        match self {
            IssueEntry::Text(text) => text.trim(),
            IssueEntry::Detailed { detail } => detail.trim(),
        }
    }
}
