use crate::domain::test_case::enum_token;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match enum_token(value).as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            _ => Err(format!("unknown confidence '{}'", value)),
        }
    }
}

impl TryFrom<String> for Confidence {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        f.write_str(label)
    }
}

/// A missing or under-specified requirement found by gap analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gap {
    pub description: String,
    pub suggested_clarification: String,
    pub confidence: Confidence,
    /// Filled in by id assignment with the ids of the gap's derived cases.
    pub related_test_case_ids: Vec<u32>,
}

impl Gap {
    pub fn new(
        description: impl Into<String>,
        suggested_clarification: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            description: description.into(),
            suggested_clarification: suggested_clarification.into(),
            confidence,
            related_test_case_ids: Vec::new(),
        }
    }
}
