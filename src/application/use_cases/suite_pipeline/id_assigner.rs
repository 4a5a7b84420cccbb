use crate::domain::gap::Gap;
use crate::domain::pipeline_config::MAX_ID_BASE;
use crate::domain::test_case::{Origin, TestCase};
use crate::domain::test_suite::{FinalizedSuite, TestSuite};

/// Hands out suite-wide ids from `base` upward: main cases, then edge cases,
/// then gap-derived cases grouped by gap order. Acceptance order is kept
/// inside every group. Each gap's `related_test_case_ids` is rebuilt from
/// the ids its derived cases received.
///
/// `base` is clamped to [`MAX_ID_BASE`], so numbering cannot wrap for any
/// suite that fits in memory.
pub fn finalize(suite: TestSuite, mut gaps: Vec<Gap>, base: u32) -> FinalizedSuite {
    let mut main_cases = Vec::new();
    let mut edge_cases = Vec::new();
    let mut gap_derived_cases = Vec::new();
    for case in suite.into_cases() {
        match case.origin {
            Origin::Main => main_cases.push(case),
            Origin::Edge => edge_cases.push(case),
            Origin::GapDerived => gap_derived_cases.push(case),
        }
    }
    // Stable, so acceptance order survives within a gap.
    gap_derived_cases.sort_by_key(|case: &TestCase| {
        case.origin_gap_ref.map(|gap| gap.0).unwrap_or(usize::MAX)
    });

    let mut next_id = base.min(MAX_ID_BASE);
    for case in main_cases
        .iter_mut()
        .chain(edge_cases.iter_mut())
        .chain(gap_derived_cases.iter_mut())
    {
        case.id = Some(next_id);
        next_id = next_id.saturating_add(1);
    }

    for gap in gaps.iter_mut() {
        gap.related_test_case_ids.clear();
    }
    for case in &gap_derived_cases {
        if let (Some(id), Some(gap_ref)) = (case.id, case.origin_gap_ref) {
            if let Some(gap) = gaps.get_mut(gap_ref.0) {
                gap.related_test_case_ids.push(id);
            }
        }
    }

    FinalizedSuite {
        main_cases,
        edge_cases,
        gaps,
        gap_derived_cases,
    }
}
