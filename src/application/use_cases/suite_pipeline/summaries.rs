use crate::domain::test_case::{Origin, TestCase};

const LINE_CHARS: usize = 140;

pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Main => "main",
        Origin::Edge => "edge",
        Origin::GapDerived => "gap",
    }
}

/// One line per accepted case, used to steer later passes away from
/// scenarios that are already covered.
pub(crate) fn summarize_cases(cases: &[TestCase]) -> String {
    if cases.is_empty() {
        return "(none yet)\n".to_string();
    }

    let mut body = String::new();
    for case in cases {
        let first_step = case.steps.first().map(String::as_str).unwrap_or("");
        let line = format!(
            "[{}|{}] {}: {} -> {}",
            origin_label(case.origin),
            case.test_type,
            case.label(),
            first_step,
            case.expected_results.first().map(String::as_str).unwrap_or("")
        );
        body.push_str("- ");
        body.push_str(&truncate(&line, LINE_CHARS));
        body.push('\n');
    }
    body
}
