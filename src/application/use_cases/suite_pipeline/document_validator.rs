use super::llm_output::{extract_json_payload, preview_text};
use super::prompts::build_check_prompt;
use super::types::{CheckOutput, IssueEntry};
use crate::domain::error::{AppError, Result};
use crate::domain::requirement::RequirementDocument;
use crate::domain::validation::{IssueKind, ValidationIssue, ValidationReport};
use crate::infrastructure::oracle::OracleGateway;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

const CHECK_ORDER: [IssueKind; 3] = [
    IssueKind::Ambiguity,
    IssueKind::Incompleteness,
    IssueKind::Contradiction,
];

/// Gatekeeper run before any generation call.
pub struct DocumentValidator {
    gateway: Arc<OracleGateway>,
    stop_at_first_failure: bool,
    language: String,
}

impl DocumentValidator {
    pub fn new(gateway: Arc<OracleGateway>, stop_at_first_failure: bool, language: &str) -> Self {
        Self {
            gateway,
            stop_at_first_failure,
            language: language.to_string(),
        }
    }

    /// Runs the ambiguity, completeness and contradiction checks in that order.
    ///
    /// An invalid verdict is returned as a report, not an error. Oracle
    /// exhaustion and unreadable check output are errors: a partially
    /// validated document is never let through.
    pub async fn validate(&self, document: &RequirementDocument) -> Result<ValidationReport> {
        if document.is_blank() {
            warn!("Requirements document is empty");
            return Ok(ValidationReport::from_issues(vec![ValidationIssue::new(
                IssueKind::Incompleteness,
                "The requirements document is empty.",
            )]));
        }

        let mut issues = Vec::new();
        for kind in CHECK_ORDER {
            let prompt = build_check_prompt(kind, document, &self.language);
            let raw = self.gateway.call(&prompt).await?;
            let found = parse_check_output(kind, &raw)?;
            info!(check = %kind, issues = found.len(), "Document check finished");

            let failed = !found.is_empty();
            issues.extend(found);
            if failed && self.stop_at_first_failure {
                break;
            }
        }

        Ok(ValidationReport::from_issues(issues))
    }
}

fn parse_check_output(kind: IssueKind, raw: &str) -> Result<Vec<ValidationIssue>> {
    let unreadable = |reason: &str| {
        AppError::ParseError(format!(
            "{} check output unreadable: {} | output_snippet={}",
            kind,
            reason,
            preview_text(raw, 200)
        ))
    };

    let payload = extract_json_payload(raw).ok_or_else(|| unreadable("no JSON payload"))?;
    let output = match payload {
        Value::Array(_) => CheckOutput {
            is_valid: None,
            issues: Some(
                serde_json::from_value::<Vec<IssueEntry>>(payload)
                    .map_err(|err| unreadable(&err.to_string()))?,
            ),
            error_message: None,
        },
        Value::Object(_) => serde_json::from_value::<CheckOutput>(payload)
            .map_err(|err| unreadable(&err.to_string()))?,
        _ => return Err(unreadable("expected an object or a list")),
    };

    if output.is_valid.is_none() && output.issues.is_none() {
        return Err(unreadable("neither is_valid nor issues present"));
    }

    let mut issues: Vec<ValidationIssue> = output
        .issues
        .unwrap_or_default()
        .iter()
        .map(IssueEntry::detail)
        .filter(|detail| !detail.is_empty())
        .map(|detail| ValidationIssue::new(kind, detail))
        .collect();

    if issues.is_empty() && output.is_valid == Some(false) {
        let detail = output
            .error_message
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("The document failed the {} check.", kind));
        issues.push(ValidationIssue::new(kind, detail));
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::oracle::OracleTask;
    use crate::testing::{fast_policy, Reply, ScriptedOracle};

    fn validator(oracle: Arc<ScriptedOracle>, stop_at_first_failure: bool) -> DocumentValidator {
        let gateway = Arc::new(OracleGateway::new(oracle, fast_policy()));
        DocumentValidator::new(gateway, stop_at_first_failure, "English")
    }

    fn document() -> RequirementDocument {
        RequirementDocument::new("As a user I want to create a token so I can use the extension.")
    }

    #[tokio::test]
    async fn clean_document_is_valid_after_three_checks() {
        let oracle = Arc::new(ScriptedOracle::new().accepting_document());
        let report = validator(oracle.clone(), true)
            .validate(&document())
            .await
            .unwrap();

        assert!(report.is_valid());
        assert_eq!(oracle.calls().len(), 3);
        assert_eq!(oracle.calls()[0].task, OracleTask::AmbiguityCheck);
        assert_eq!(oracle.calls()[2].task, OracleTask::ContradictionCheck);
    }

    #[tokio::test]
    async fn first_failing_check_stops_validation() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .accepting_document()
                .on_matching(
                    OracleTask::AmbiguityCheck,
                    "create a token",
                    Reply::text(r#"{"is_valid": false, "issues": ["'token' is never defined"]}"#),
                ),
        );
        let report = validator(oracle.clone(), true)
            .validate(&document())
            .await
            .unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::Ambiguity);
        assert_eq!(oracle.calls().len(), 1);
    }

    #[tokio::test]
    async fn all_checks_run_when_configured() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .on(
                    OracleTask::AmbiguityCheck,
                    Reply::text(r#"{"is_valid": false, "issues": [{"description": "vague"}]}"#),
                )
                .on(
                    OracleTask::CompletenessCheck,
                    Reply::text(r#"{"is_valid": false, "error_message": "No actor given"}"#),
                )
                .on(OracleTask::ContradictionCheck, Reply::text("[]")),
        );
        let report = validator(oracle.clone(), false)
            .validate(&document())
            .await
            .unwrap();

        assert_eq!(oracle.calls().len(), 3);
        let kinds: Vec<_> = report.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::Ambiguity, IssueKind::Incompleteness]);
        assert_eq!(report.issues[1].detail, "No actor given");
    }

    #[tokio::test]
    async fn blank_document_is_rejected_without_calls() {
        let oracle = Arc::new(ScriptedOracle::new().accepting_document());
        let report = validator(oracle.clone(), true)
            .validate(&RequirementDocument::new("  \n\t "))
            .await
            .unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.issues[0].kind, IssueKind::Incompleteness);
        assert!(oracle.calls().is_empty());
    }

    #[tokio::test]
    async fn unreadable_check_output_is_fatal() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .accepting_document()
                .on_matching(OracleTask::CompletenessCheck, "token", Reply::text("Looks fine to me!")),
        );
        let err = validator(oracle, true)
            .validate(&document())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[tokio::test]
    async fn oracle_exhaustion_is_fatal() {
        let oracle = Arc::new(ScriptedOracle::new().on(OracleTask::AmbiguityCheck, Reply::Fail));
        let err = validator(oracle, true)
            .validate(&document())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LLMError(_)));
    }
}
