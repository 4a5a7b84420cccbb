use serde::{Deserialize, Serialize};

/// The raw requirements text a run is generated from. Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequirementDocument {
    text: String,
}

impl RequirementDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<String> for RequirementDocument {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for RequirementDocument {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
