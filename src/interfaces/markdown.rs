use super::{OutputFormatter, RenderedDocument};
use crate::domain::test_case::TestCase;
use crate::domain::test_suite::FinalizedSuite;

pub const MAIN_CASES_FILE: &str = "main_test_cases.md";
pub const EDGE_CASES_FILE: &str = "edge_test_cases.md";
pub const GAP_ANALYSIS_FILE: &str = "gap_analysis.md";
pub const GAP_CASES_FILE: &str = "gap_test_cases.md";

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownFormatter;

pub fn display_id(id: Option<u32>) -> String {
    match id {
        Some(id) => format!("TC-{:03}", id),
        None => "TC-???".to_string(),
    }
}

fn push_list(md: &mut String, heading: &str, items: &[String]) {
    md.push_str(&format!("- **{}:**\n", heading));
    for item in items {
        md.push_str(&format!("  - {}\n", item));
    }
}

fn push_case(md: &mut String, level: &str, case: &TestCase) {
    md.push_str(&format!("{} {}: {}\n", level, display_id(case.id), case.label()));
    md.push_str(&format!("- **Module:** {}\n", case.module));
    md.push_str(&format!("- **Priority:** {}\n", case.priority));
    md.push_str(&format!("- **Type:** {}\n", case.test_type));
    push_list(md, "Prerequisites", &case.prerequisites);
    push_list(md, "Steps", &case.steps);
    push_list(md, "Expected Results", &case.expected_results);
    md.push('\n');
}

impl MarkdownFormatter {
    pub fn format_test_cases(&self, cases: &[TestCase], title: &str) -> String {
        let mut md = format!("# {}\n\n", title);
        if cases.is_empty() {
            md.push_str("No test cases generated.\n");
        }
        for case in cases {
            push_case(&mut md, "##", case);
        }
        md
    }

    pub fn format_gap_analysis(&self, suite: &FinalizedSuite) -> String {
        let mut md = String::from("# Gap Analysis\n\n");
        if suite.gaps.is_empty() {
            md.push_str("No gaps identified.\n");
        }
        for (index, gap) in suite.gaps.iter().enumerate() {
            md.push_str(&format!("## Gap {}\n", index + 1));
            md.push_str(&format!("- **Description:** {}\n", gap.description));
            md.push_str(&format!(
                "- **Suggested Clarification:** {}\n",
                gap.suggested_clarification
            ));
            md.push_str(&format!("- **Confidence Level:** {}\n", gap.confidence));
            let related = if gap.related_test_case_ids.is_empty() {
                "None".to_string()
            } else {
                gap.related_test_case_ids
                    .iter()
                    .map(|id| display_id(Some(*id)))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            md.push_str(&format!("- **Related Test Cases:** {}\n\n", related));
        }
        md
    }

    /// Gap-derived cases grouped under the gap that produced them.
    pub fn format_gap_cases(&self, suite: &FinalizedSuite) -> String {
        let mut md = String::from("# Additional Tests for Gaps\n\n");
        if suite.gap_derived_cases.is_empty() {
            md.push_str("No additional tests needed.\n");
            return md;
        }
        for gap in &suite.gaps {
            if gap.related_test_case_ids.is_empty() {
                continue;
            }
            md.push_str(&format!("## Gap: {}\n", gap.description));
            md.push_str(&format!(
                "- **Suggested Clarification:** {}\n",
                gap.suggested_clarification
            ));
            md.push_str(&format!("- **Confidence Level:** {}\n\n", gap.confidence));
            for id in &gap.related_test_case_ids {
                if let Some(case) = suite.case_by_id(*id) {
                    push_case(&mut md, "###", case);
                }
            }
        }
        md
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn render(&self, suite: &FinalizedSuite) -> Vec<RenderedDocument> {
        vec![
            RenderedDocument {
                file_name: MAIN_CASES_FILE.to_string(),
                content: self.format_test_cases(&suite.main_cases, "Main Test Cases"),
            },
            RenderedDocument {
                file_name: EDGE_CASES_FILE.to_string(),
                content: self.format_test_cases(&suite.edge_cases, "Edge Test Cases"),
            },
            RenderedDocument {
                file_name: GAP_ANALYSIS_FILE.to_string(),
                content: self.format_gap_analysis(suite),
            },
            RenderedDocument {
                file_name: GAP_CASES_FILE.to_string(),
                content: self.format_gap_cases(suite),
            },
        ]
    }
}
