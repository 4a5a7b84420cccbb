use crate::domain::test_case::TestCase;
use crate::domain::test_suite::{CanonicalForm, TestSuite};
use crate::infrastructure::oracle::OracleTask;
use serde::Serialize;
use tracing::{debug, info};

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    Accepted { position: usize },
    /// Canonical duplicate of the case at `duplicate_of`; the candidate is gone.
    Discarded { duplicate_of: usize, digest: String },
}

impl DedupOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DedupOutcome::Accepted { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub accepted: usize,
    pub duplicates: usize,
}

/// Exact match on the canonical (module, steps, expected_results) tuple.
#[derive(Debug, Default, Clone, Copy)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn accept_if_unique(&self, candidate: TestCase, suite: &mut TestSuite) -> DedupOutcome {
        let digest = CanonicalForm::of(&candidate).digest();
        match suite.insert_if_unique(candidate) {
            Ok(position) => DedupOutcome::Accepted { position },
            Err((discarded, duplicate_of)) => {
                debug!(
                    module = %discarded.module,
                    duplicate_of,
                    digest = %digest,
                    "Discarding duplicate test case"
                );
                DedupOutcome::Discarded {
                    duplicate_of,
                    digest,
                }
            }
        }
    }

    /// Feeds a batch through [`Self::accept_if_unique`] one candidate at a
    /// time, in encounter order.
    pub fn merge_batch(
        &self,
        task: OracleTask,
        candidates: Vec<TestCase>,
        suite: &mut TestSuite,
    ) -> MergeStats {
        let mut stats = MergeStats::default();
        for candidate in candidates {
            if self.accept_if_unique(candidate, suite).is_accepted() {
                stats.accepted += 1;
            } else {
                stats.duplicates += 1;
            }
        }
        if stats.duplicates > 0 {
            info!(
                task = %task,
                accepted = stats.accepted,
                duplicates = stats.duplicates,
                "Duplicates discarded"
            );
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_case::{Origin, Priority, TestType};

    fn case(title: &str, steps: &[&str], origin: Origin) -> TestCase {
        TestCase {
            id: None,
            title: Some(title.to_string()),
            module: "Token Management".to_string(),
            priority: Priority::High,
            test_type: TestType::Functional,
            prerequisites: Vec::new(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            expected_results: vec!["A new token is listed".to_string()],
            origin,
            origin_gap_ref: None,
        }
    }

    #[test]
    fn cosmetic_variant_is_discarded() {
        let mut suite = TestSuite::new();
        let dedup = Deduplicator;

        let first = dedup.accept_if_unique(
            case("Create New Token", &["Click 'Create New Token'"], Origin::Main),
            &mut suite,
        );
        let second = dedup.accept_if_unique(
            case("Create New Token", &["click 'create new token'   "], Origin::Main),
            &mut suite,
        );

        assert_eq!(first, DedupOutcome::Accepted { position: 0 });
        assert!(matches!(
            second,
            DedupOutcome::Discarded { duplicate_of: 0, .. }
        ));
        assert_eq!(suite.len(), 1);
    }

    #[test]
    fn duplicates_across_origins_are_discarded() {
        let mut suite = TestSuite::new();
        let dedup = Deduplicator;
        dedup.accept_if_unique(case("Main", &["Open page"], Origin::Main), &mut suite);

        let stats = dedup.merge_batch(
            OracleTask::EdgeCases,
            vec![
                case("Edge copy", &["OPEN PAGE"], Origin::Edge),
                case("Edge new", &["Open page twice"], Origin::Edge),
            ],
            &mut suite,
        );

        assert_eq!(
            stats,
            MergeStats {
                accepted: 1,
                duplicates: 1
            }
        );
        assert_eq!(suite.cases()[1].title.as_deref(), Some("Edge new"));
    }

    #[test]
    fn duplicates_within_one_batch_keep_the_first() {
        let mut suite = TestSuite::new();
        let stats = Deduplicator.merge_batch(
            OracleTask::MainCases,
            vec![
                case("first", &["Step"], Origin::Main),
                case("second", &["step"], Origin::Main),
            ],
            &mut suite,
        );
        assert_eq!(stats.accepted, 1);
        assert_eq!(suite.cases()[0].title.as_deref(), Some("first"));
    }
}
