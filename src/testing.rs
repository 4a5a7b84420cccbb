//! Test doubles shared by the unit tests.

use crate::domain::error::{AppError, Result};
use crate::infrastructure::oracle::{OraclePrompt, OracleTask, RetryPolicy, TextGenerationOracle};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Fail,
    /// Fails the first `n` matching calls, then answers with the text.
    FailThen(u32, String),
    /// Answers only after the delay.
    Delayed(Duration, String),
}

impl Reply {
    pub(crate) fn text(value: impl Into<String>) -> Self {
        Reply::Text(value.into())
    }

    pub(crate) fn fail_then(failures: u32, value: impl Into<String>) -> Self {
        Reply::FailThen(failures, value.into())
    }
}

struct Rule {
    task: OracleTask,
    needle: Option<String>,
    reply: Reply,
}

/// Oracle returning canned text per task, optionally keyed by a substring
/// of the user prompt. Records every prompt it receives.
#[derive(Default)]
pub(crate) struct ScriptedOracle {
    rules: Vec<Rule>,
    hits: Mutex<Vec<u32>>,
    calls: Mutex<Vec<OraclePrompt>>,
}

impl ScriptedOracle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, task: OracleTask, reply: Reply) -> Self {
        self.rules.push(Rule {
            task,
            needle: None,
            reply,
        });
        self
    }

    /// Rules with a needle win over plain rules for the same task.
    pub(crate) fn on_matching(mut self, task: OracleTask, needle: &str, reply: Reply) -> Self {
        self.rules.push(Rule {
            task,
            needle: Some(needle.to_string()),
            reply,
        });
        self
    }

    /// Passes all three document checks.
    pub(crate) fn accepting_document(self) -> Self {
        let clean = r#"{"is_valid": true, "issues": []}"#;
        self.on(OracleTask::AmbiguityCheck, Reply::text(clean))
            .on(OracleTask::CompletenessCheck, Reply::text(clean))
            .on(OracleTask::ContradictionCheck, Reply::text(clean))
    }

    pub(crate) fn calls(&self) -> Vec<OraclePrompt> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn call_count(&self, task: OracleTask) -> usize {
        self.calls().iter().filter(|p| p.task == task).count()
    }

    pub(crate) fn generation_calls(&self) -> usize {
        self.calls().iter().filter(|p| p.task.is_generation()).count()
    }

    fn pick(&self, prompt: &OraclePrompt) -> Option<usize> {
        let keyed = self.rules.iter().position(|rule| {
            rule.task == prompt.task
                && rule
                    .needle
                    .as_deref()
                    .map(|needle| prompt.user.contains(needle))
                    .unwrap_or(false)
        });
        keyed.or_else(|| {
            self.rules
                .iter()
                .position(|rule| rule.task == prompt.task && rule.needle.is_none())
        })
    }
}

#[async_trait]
impl TextGenerationOracle for ScriptedOracle {
    async fn generate(&self, prompt: &OraclePrompt) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.clone());
        }

        let Some(index) = self.pick(prompt) else {
            return Err(AppError::LLMError(format!(
                "no scripted reply for {}",
                prompt.task
            )));
        };

        let hit = {
            let mut hits = self
                .hits
                .lock()
                .map_err(|_| AppError::Internal("hit counter poisoned".to_string()))?;
            if hits.len() < self.rules.len() {
                hits.resize(self.rules.len(), 0);
            }
            hits[index] += 1;
            hits[index]
        };

        match self.rules[index].reply.clone() {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(AppError::LLMError("scripted failure".to_string())),
            Reply::FailThen(failures, text) => {
                if hit <= failures {
                    Err(AppError::LLMError("scripted transient failure".to_string()))
                } else {
                    Ok(text)
                }
            }
            Reply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }
}

/// Three attempts, millisecond backoff and a short timeout.
pub(crate) fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_millis(50),
        max_retries: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

/// JSON for one test-case entry.
pub(crate) fn case_json(module: &str, steps: &[&str], expected: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "module": module,
        "priority": "High",
        "type": "Functional",
        "prerequisites": [],
        "steps": steps,
        "expected_results": expected,
    })
}

/// JSON for one gap entry.
pub(crate) fn gap_json(description: &str, clarification: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "suggested_clarification": clarification,
        "confidence": "Medium",
    })
}
