use super::summaries::{summarize_cases, truncate};
use crate::domain::gap::Gap;
use crate::domain::requirement::RequirementDocument;
use crate::domain::test_case::TestCase;
use crate::domain::validation::IssueKind;
use crate::infrastructure::oracle::{OraclePrompt, OracleTask};

const CASE_SCHEMA: &str = r#"Each test case is a JSON object with:
- "title": short name of the scenario
- "module": the feature or area under test
- "priority": one of "Low", "Medium", "High"
- "type": one of "Functional", "UI", "Negative", "Positive", "Error Handling", "Concurrency", "Integration"
- "prerequisites": list of strings (may be empty)
- "steps": list of concrete, ordered steps (at least one)
- "expected_results": list of observable outcomes (at least one)"#;

const FEW_SHOT_STORY: &str = "As a user, I want to create a new account so that I can log in later.
## Account Creation
- Users can create one account via the registration page.
- UX/UI: 'Register' button is enabled only if all fields are filled.";

const FEW_SHOT_CASES: &str = r#"{"test_cases": [{"title": "User account creation", "module": "Account Management", "priority": "High", "type": "Functional", "prerequisites": ["User is not logged in"], "steps": ["Navigate to the registration page", "Fill in the required fields (username, password, email)", "Verify that the 'Register' button is enabled", "Click the 'Register' button"], "expected_results": ["Account is created successfully", "User is redirected to the login page"]}]}"#;

const GAP_SCHEMA: &str = r#"Each gap is a JSON object with:
- "description": what is missing, vague or unstated in the requirements
- "suggested_clarification": the question or statement that would close the gap
- "confidence": one of "Low", "Medium", "High""#;

fn document_block(document: &RequirementDocument) -> String {
    format!("Requirements document:\n<<<\n{}\n>>>\n", document.text().trim())
}

fn check_task(kind: IssueKind) -> OracleTask {
    match kind {
        IssueKind::Ambiguity => OracleTask::AmbiguityCheck,
        IssueKind::Incompleteness => OracleTask::CompletenessCheck,
        IssueKind::Contradiction => OracleTask::ContradictionCheck,
    }
}

fn check_focus(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Ambiguity => {
            "Determine whether the requirements are clear, precise and unambiguous. Report every statement that can reasonably be read in more than one way."
        }
        IssueKind::Incompleteness => {
            "Determine whether the requirements are complete: who the user is, what they want to achieve, why, and the behaviour needed to test it. Report every missing piece that blocks writing test cases."
        }
        IssueKind::Contradiction => {
            "Determine whether the requirements are free of contradictions. Report every pair of statements that cannot both hold."
        }
    }
}

pub(crate) fn build_check_prompt(
    kind: IssueKind,
    document: &RequirementDocument,
    language: &str,
) -> OraclePrompt {
    let system = format!(
        r#"You are a requirements reviewer. {focus}
Only report issues that would prevent writing reliable test cases; do not report style.
Respond in {language}. Return only JSON of the form:
{{"is_valid": true|false, "issues": ["<one issue per entry>"]}}
Use an empty "issues" list when there is nothing to report."#,
        focus = check_focus(kind),
        language = language
    );
    OraclePrompt::new(check_task(kind), system, document_block(document))
}

pub(crate) fn build_main_cases_prompt(document: &RequirementDocument, language: &str) -> OraclePrompt {
    let system = format!(
        r#"You are a QA engineer. Convert the requirements into detailed functional test cases covering every requirement, including UI interactions and backend behaviour where applicable.
{schema}
Use "type": "Functional" for these cases.
Respond in {language}. Return only JSON: {{"test_cases": [...]}}"#,
        schema = CASE_SCHEMA,
        language = language
    );

    let mut user = String::new();
    user.push_str("Example requirements:\n");
    user.push_str(FEW_SHOT_STORY);
    user.push_str("\n\nExample output:\n");
    user.push_str(FEW_SHOT_CASES);
    user.push_str("\n\nNow convert the following requirements in the same format.\n\n");
    user.push_str(&document_block(document));

    OraclePrompt::new(OracleTask::MainCases, system, user)
}

pub(crate) fn build_edge_cases_prompt(
    document: &RequirementDocument,
    accepted: &[TestCase],
    target: usize,
    language: &str,
) -> OraclePrompt {
    let system = format!(
        r#"You are a QA engineer specialising in edge cases. Generate exactly {target} additional test cases for scenarios the existing cases do not cover, focusing on error handling, concurrency, boundary values and integration with other parts of the system.
{schema}
Do not repeat an existing case.
Respond in {language}. Return only JSON: {{"test_cases": [...]}}"#,
        target = target,
        schema = CASE_SCHEMA,
        language = language
    );

    let mut user = document_block(document);
    user.push_str("\nExisting test cases:\n");
    user.push_str(&summarize_cases(accepted));
    OraclePrompt::new(OracleTask::EdgeCases, system, user)
}

pub(crate) fn build_gap_analysis_prompt(
    document: &RequirementDocument,
    accepted: &[TestCase],
    language: &str,
) -> OraclePrompt {
    let system = format!(
        r#"You are a requirements analyst. Find requirements that are missing, ambiguous or under-specified given the document and the test cases written so far.
{schema}
Return an empty list when there are no gaps.
Respond in {language}. Return only JSON: {{"gaps": [...]}}"#,
        schema = GAP_SCHEMA,
        language = language
    );

    let mut user = document_block(document);
    user.push_str("\nTest cases written so far:\n");
    user.push_str(&summarize_cases(accepted));
    OraclePrompt::new(OracleTask::GapAnalysis, system, user)
}

pub(crate) fn build_gap_cases_prompt(
    document: &RequirementDocument,
    gap: &Gap,
    accepted: &[TestCase],
    language: &str,
) -> OraclePrompt {
    let system = format!(
        r#"You are a QA engineer. A gap was found in the requirements. Assume the suggested clarification holds and generate test cases that verify it. Generate none if the clarification adds nothing testable.
{schema}
Do not repeat an existing case.
Respond in {language}. Return only JSON: {{"test_cases": [...]}}"#,
        schema = CASE_SCHEMA,
        language = language
    );

    let mut user = document_block(document);
    user.push_str(&format!("\nGap: {}\n", truncate(&gap.description, 600)));
    user.push_str(&format!(
        "Clarification: {}\n",
        truncate(&gap.suggested_clarification, 600)
    ));
    user.push_str(&format!("Confidence: {}\n", gap.confidence));
    user.push_str("\nExisting test cases:\n");
    user.push_str(&summarize_cases(accepted));
    OraclePrompt::new(OracleTask::GapCases, system, user)
}
