//! Turns oracle text into schema-checked records, one `Result` per entry.
//!
//! A malformed entry never sinks its batch: it becomes a [`SchemaFailure`]
//! next to the entries that did parse. Whether an empty batch is acceptable
//! is the caller's call (see [`require_records`]).

use super::llm_output::{extract_json_payload, preview_text};
use super::types::{GapDraft, TestCaseDraft};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::oracle::OracleTask;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;
use validator::Validate;

const SNIPPET_CHARS: usize = 200;

/// A record shape the parser can check oracle entries against.
pub(crate) trait RecordSchema: DeserializeOwned + Validate {
    const NAME: &'static str;
    /// Object keys that may hold the entry list.
    const COLLECTION_KEYS: &'static [&'static str];

    /// Whether a lone object is itself one record rather than a wrapper.
    fn looks_like_record(object: &Map<String, Value>) -> bool;

    /// Checks serde and `validator` cannot express.
    fn check(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

impl RecordSchema for TestCaseDraft {
    const NAME: &'static str = "test case";
    const COLLECTION_KEYS: &'static [&'static str] =
        &["test_cases", "edge_cases", "cases", "testCases"];

    fn looks_like_record(object: &Map<String, Value>) -> bool {
        object.contains_key("module") || object.contains_key("steps")
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.module.trim().is_empty() {
            return Err("module is blank".to_string());
        }
        if self.steps.iter().all(|step| step.trim().is_empty()) {
            return Err("steps has no non-blank entry".to_string());
        }
        if self.expected_results.iter().all(|r| r.trim().is_empty()) {
            return Err("expected_results has no non-blank entry".to_string());
        }
        Ok(())
    }
}

impl RecordSchema for GapDraft {
    const NAME: &'static str = "gap";
    const COLLECTION_KEYS: &'static [&'static str] = &["gaps", "requirement_gaps"];

    fn looks_like_record(object: &Map<String, Value>) -> bool {
        object.contains_key("description")
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("description is blank".to_string());
        }
        if self.suggested_clarification.trim().is_empty() {
            return Err("suggested_clarification is blank".to_string());
        }
        Ok(())
    }
}

/// An entry that failed field or enum validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaFailure {
    /// Position of the entry in the oracle's list.
    pub index: usize,
    pub reason: String,
    pub snippet: String,
}

/// Parses every entry of the payload in `raw`.
///
/// Errors only when no list of entries can be found at all.
pub(crate) fn parse_records<T: RecordSchema>(
    raw: &str,
) -> Result<Vec<std::result::Result<T, SchemaFailure>>> {
    let payload = extract_json_payload(raw).ok_or_else(|| {
        AppError::ParseError(format!(
            "no JSON payload in {} output | output_snippet={}",
            T::NAME,
            preview_text(raw, SNIPPET_CHARS)
        ))
    })?;

    let entries = entries_of::<T>(payload)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_entry::<T>(index, entry))
        .collect())
}

fn entries_of<T: RecordSchema>(payload: Value) -> Result<Vec<Value>> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => {
            for key in T::COLLECTION_KEYS {
                match object.remove(*key) {
                    Some(Value::Array(items)) => return Ok(items),
                    Some(Value::Null) => return Ok(Vec::new()),
                    Some(other) => {
                        return Err(AppError::ParseError(format!(
                            "'{}' is not a list of {} entries | output_snippet={}",
                            key,
                            T::NAME,
                            preview_text(&other.to_string(), SNIPPET_CHARS)
                        )))
                    }
                    None => {}
                }
            }
            if T::looks_like_record(&object) {
                return Ok(vec![Value::Object(object)]);
            }
            Err(AppError::ParseError(format!(
                "object holds no {} list (expected one of: {})",
                T::NAME,
                T::COLLECTION_KEYS.join(", ")
            )))
        }
        other => Err(AppError::ParseError(format!(
            "expected a list of {} entries, got {}",
            T::NAME,
            preview_text(&other.to_string(), SNIPPET_CHARS)
        ))),
    }
}

fn parse_entry<T: RecordSchema>(
    index: usize,
    entry: Value,
) -> std::result::Result<T, SchemaFailure> {
    let snippet = preview_text(&entry.to_string(), SNIPPET_CHARS);
    let failure = |reason: String| SchemaFailure {
        index,
        reason,
        snippet: snippet.clone(),
    };

    let record: T = serde_json::from_value(entry).map_err(|err| failure(err.to_string()))?;
    record
        .validate()
        .map_err(|err| failure(err.to_string().replace('\n', "; ")))?;
    record.check().map_err(failure)?;
    Ok(record)
}

/// Splits parsed entries, logging each failure against the task.
pub(crate) fn split_entries<T>(
    task: OracleTask,
    entries: Vec<std::result::Result<T, SchemaFailure>>,
) -> (Vec<T>, Vec<SchemaFailure>) {
    let mut records = Vec::new();
    let mut failures = Vec::new();
    for entry in entries {
        match entry {
            Ok(record) => records.push(record),
            Err(failure) => {
                warn!(
                    task = %task,
                    index = failure.index,
                    reason = %failure.reason,
                    snippet = %failure.snippet,
                    "Discarding malformed record"
                );
                failures.push(failure);
            }
        }
    }
    (records, failures)
}

/// Fails the batch when nothing parsed but the pass needs at least one record.
pub(crate) fn require_records<T>(
    task: OracleTask,
    records: &[T],
    failures: &[SchemaFailure],
) -> Result<()> {
    if records.is_empty() {
        return Err(AppError::ParseError(format!(
            "{} produced no valid records ({} malformed)",
            task,
            failures.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gap::Confidence;
    use crate::domain::test_case::{Priority, TestType};
    use crate::testing::{case_json, gap_json};
    use serde_json::json;

    #[test]
    fn parses_a_bare_list() {
        let raw = json!([case_json("Token Management", &["Open tokens"], &["List shown"])]);
        let entries = parse_records::<TestCaseDraft>(&raw.to_string()).unwrap();
        assert_eq!(entries.len(), 1);
        let draft = entries[0].as_ref().unwrap();
        assert_eq!(draft.module, "Token Management");
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.test_type, TestType::Functional);
    }

    #[test]
    fn parses_a_wrapped_list_inside_a_fence() {
        let raw = format!(
            "```json\n{}\n```",
            json!({
                "title": "Token suite",
                "test_cases": [case_json("Tokens", &["a"], &["b"])]
            })
        );
        let entries = parse_records::<TestCaseDraft>(&raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_ok());
    }

    #[test]
    fn a_lone_record_is_a_batch_of_one() {
        let raw = case_json("Tokens", &["a"], &["b"]).to_string();
        let entries = parse_records::<TestCaseDraft>(&raw).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn malformed_entries_fail_individually() {
        let mut missing_priority = case_json("Tokens", &["x"], &["y"]);
        missing_priority.as_object_mut().unwrap().remove("priority");
        let mut bad_type = case_json("Tokens", &["x"], &["y"]);
        bad_type["type"] = json!("Performance");
        let no_steps = case_json("Tokens", &[], &["y"]);

        let raw = json!([
            case_json("Tokens", &["a"], &["b"]),
            missing_priority,
            bad_type,
            no_steps,
            case_json("Tokens", &["c"], &["d"]),
        ]);
        let entries = parse_records::<TestCaseDraft>(&raw.to_string()).unwrap();
        let (records, failures) = split_entries(OracleTask::MainCases, entries);

        assert_eq!(records.len(), 2);
        assert_eq!(
            failures.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(failures[0].reason.contains("priority"));
        assert!(failures[1].reason.contains("Performance"));
    }

    #[test]
    fn blank_module_is_a_schema_failure() {
        let raw = json!([case_json("   ", &["a"], &["b"])]);
        let entries = parse_records::<TestCaseDraft>(&raw.to_string()).unwrap();
        assert_eq!(entries[0].as_ref().unwrap_err().reason, "module is blank");
    }

    #[test]
    fn gap_accepts_confidence_level_alias() {
        let raw = json!({"gaps": [{
            "description": "Multi-group handling is unspecified",
            "suggested_clarification": "State which groups a token inherits",
            "confidence_level": "high"
        }]});
        let entries = parse_records::<GapDraft>(&raw.to_string()).unwrap();
        let gap = entries[0].as_ref().unwrap();
        assert_eq!(gap.confidence, Confidence::High);
    }

    #[test]
    fn gap_with_unknown_confidence_fails() {
        let mut entry = gap_json("Something", "Clarify it");
        entry["confidence"] = json!("Certain");
        let entries = parse_records::<GapDraft>(&json!([entry]).to_string()).unwrap();
        assert!(entries[0].is_err());
    }

    #[test]
    fn empty_wrapped_list_is_not_an_error() {
        let entries = parse_records::<GapDraft>(r#"{"gaps": []}"#).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn prose_without_payload_is_a_parse_error() {
        let err = parse_records::<TestCaseDraft>("Sorry, I cannot help.").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn object_without_known_key_is_a_parse_error() {
        let err = parse_records::<GapDraft>(r#"{"findings": []}"#).unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn require_records_rejects_empty_batches() {
        let failures = vec![SchemaFailure {
            index: 0,
            reason: "bad".to_string(),
            snippet: "{}".to_string(),
        }];
        let records: Vec<TestCaseDraft> = Vec::new();
        assert!(require_records(OracleTask::MainCases, &records, &failures).is_err());
        assert!(require_records(OracleTask::MainCases, &[1], &[]).is_ok());
    }
}
