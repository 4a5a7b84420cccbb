use crate::domain::gap::Gap;
use crate::domain::test_case::{Origin, TestCase};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Case-folded, whitespace-collapsed copy of the fields two cases are
/// compared on. Title, priority, type and prerequisites are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalForm {
    module: String,
    steps: Vec<String>,
    expected_results: Vec<String>,
}

impl CanonicalForm {
    pub fn of(case: &TestCase) -> Self {
        Self {
            module: canonical_text(&case.module),
            steps: case.steps.iter().map(|s| canonical_text(s)).collect(),
            expected_results: case
                .expected_results
                .iter()
                .map(|s| canonical_text(s))
                .collect(),
        }
    }

    /// Short stable digest, used to correlate log lines.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.module.as_bytes());
        for part in [&self.steps, &self.expected_results] {
            hasher.update([0x1e]);
            for item in part {
                hasher.update(item.as_bytes());
                hasher.update([0x1f]);
            }
        }
        hex::encode(&hasher.finalize()[..8])
    }
}

pub fn canonical_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The accepted cases of one run, in acceptance order, plus the canonical
/// index that keeps them pairwise distinct.
#[derive(Debug, Default)]
pub struct TestSuite {
    cases: Vec<TestCase>,
    index: HashMap<CanonicalForm, usize>,
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn cases_with_origin(&self, origin: Origin) -> impl Iterator<Item = &TestCase> {
        self.cases.iter().filter(move |case| case.origin == origin)
    }

    /// Position of an accepted case with the same canonical form, if any.
    pub fn position_of(&self, form: &CanonicalForm) -> Option<usize> {
        self.index.get(form).copied()
    }

    /// Appends `case` unless an accepted case has the same canonical form.
    /// On conflict the candidate is handed back with the position it clashed with.
    pub fn insert_if_unique(
        &mut self,
        case: TestCase,
    ) -> std::result::Result<usize, (TestCase, usize)> {
        let form = CanonicalForm::of(&case);
        if let Some(existing) = self.position_of(&form) {
            return Err((case, existing));
        }
        let position = self.cases.len();
        self.index.insert(form, position);
        self.cases.push(case);
        Ok(position)
    }

    pub(crate) fn into_cases(self) -> Vec<TestCase> {
        self.cases
    }
}

/// Terminal form of a run: every case carries its id and every gap its
/// related ids. Collections are in id order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FinalizedSuite {
    pub main_cases: Vec<TestCase>,
    pub edge_cases: Vec<TestCase>,
    pub gaps: Vec<Gap>,
    pub gap_derived_cases: Vec<TestCase>,
}

impl FinalizedSuite {
    pub fn all_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.main_cases
            .iter()
            .chain(self.edge_cases.iter())
            .chain(self.gap_derived_cases.iter())
    }

    pub fn case_by_id(&self, id: u32) -> Option<&TestCase> {
        self.all_cases().find(|case| case.id == Some(id))
    }

    pub fn total_cases(&self) -> usize {
        self.main_cases.len() + self.edge_cases.len() + self.gap_derived_cases.len()
    }
}
