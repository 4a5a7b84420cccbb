use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Ambiguity,
    Incompleteness,
    Contradiction,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Ambiguity => write!(f, "ambiguity"),
            IssueKind::Incompleteness => write!(f, "incompleteness"),
            IssueKind::Contradiction => write!(f, "contradiction"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub detail: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Outcome of the three document checks. Issues are kept in check order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub verdict: Verdict,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// The verdict is derived, never set independently of the issue list.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let verdict = if issues.is_empty() {
            Verdict::Valid
        } else {
            Verdict::Invalid
        };
        Self { verdict, issues }
    }

    pub fn is_valid(&self) -> bool {
        self.verdict == Verdict::Valid
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }
}
