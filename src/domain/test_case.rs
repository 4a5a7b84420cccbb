use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lower-cases and drops separators so "Error Handling", "error_handling"
/// and "ErrorHandling" land on the same token.
pub(crate) fn enum_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match enum_token(value).as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("unknown priority '{}'", value)),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum TestType {
    Functional,
    UI,
    Negative,
    Positive,
    ErrorHandling,
    Concurrency,
    Integration,
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match enum_token(value).as_str() {
            "functional" => Ok(TestType::Functional),
            "ui" => Ok(TestType::UI),
            "negative" => Ok(TestType::Negative),
            "positive" => Ok(TestType::Positive),
            "errorhandling" => Ok(TestType::ErrorHandling),
            "concurrency" => Ok(TestType::Concurrency),
            "integration" => Ok(TestType::Integration),
            _ => Err(format!("unknown test type '{}'", value)),
        }
    }
}

impl TryFrom<String> for TestType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestType::Functional => "Functional",
            TestType::UI => "UI",
            TestType::Negative => "Negative",
            TestType::Positive => "Positive",
            TestType::ErrorHandling => "Error Handling",
            TestType::Concurrency => "Concurrency",
            TestType::Integration => "Integration",
        };
        f.write_str(label)
    }
}

/// Which generation pass produced a case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Origin {
    Main,
    Edge,
    GapDerived,
}

/// Position of a gap in the order the gap analysis produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GapRef(pub usize);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCase {
    /// Unset until the suite is finalized.
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub module: String,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub prerequisites: Vec<String>,
    pub steps: Vec<String>,
    pub expected_results: Vec<String>,
    pub origin: Origin,
    pub origin_gap_ref: Option<GapRef>,
}

impl TestCase {
    /// Display label: the title when the oracle gave one, otherwise the module.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.module)
    }
}
