//! The generative text service as seen by the pipeline.
//!
//! Pipeline code only talks to [`OracleGateway`], which wraps any
//! [`TextGenerationOracle`] with a per-attempt timeout and bounded
//! retry with exponential backoff.

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::pipeline_config::OracleSettings;
use crate::infrastructure::llm_clients::LLMClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// What a prompt is for. Carried alongside the text so logs and test
/// doubles can tell calls apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleTask {
    AmbiguityCheck,
    CompletenessCheck,
    ContradictionCheck,
    MainCases,
    EdgeCases,
    GapAnalysis,
    GapCases,
}

impl OracleTask {
    /// True for every call made after validation has passed.
    pub fn is_generation(&self) -> bool {
        matches!(
            self,
            OracleTask::MainCases
                | OracleTask::EdgeCases
                | OracleTask::GapAnalysis
                | OracleTask::GapCases
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OracleTask::AmbiguityCheck => "ambiguity_check",
            OracleTask::CompletenessCheck => "completeness_check",
            OracleTask::ContradictionCheck => "contradiction_check",
            OracleTask::MainCases => "main_cases",
            OracleTask::EdgeCases => "edge_cases",
            OracleTask::GapAnalysis => "gap_analysis",
            OracleTask::GapCases => "gap_cases",
        }
    }
}

impl fmt::Display for OracleTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePrompt {
    pub task: OracleTask,
    pub system: String,
    pub user: String,
}

impl OraclePrompt {
    pub fn new(task: OracleTask, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            task,
            system: system.into(),
            user: user.into(),
        }
    }
}

#[async_trait]
pub trait TextGenerationOracle: Send + Sync {
    async fn generate(&self, prompt: &OraclePrompt) -> Result<String>;
}

/// Oracle backed by a configured LLM provider.
pub struct LlmOracle {
    client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
}

impl LlmOracle {
    pub fn new(client: Arc<dyn LLMClient + Send + Sync>, config: LLMConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TextGenerationOracle for LlmOracle {
    async fn generate(&self, prompt: &OraclePrompt) -> Result<String> {
        self.client
            .generate(&self.config, &prompt.system, &prompt.user)
            .await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Wait before the first retry; doubles on each further retry.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl From<&OracleSettings> for RetryPolicy {
    fn from(settings: &OracleSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms.max(settings.initial_backoff_ms)),
        }
    }
}

pub struct OracleGateway {
    oracle: Arc<dyn TextGenerationOracle>,
    policy: RetryPolicy,
}

impl OracleGateway {
    pub fn new(oracle: Arc<dyn TextGenerationOracle>, policy: RetryPolicy) -> Self {
        Self { oracle, policy }
    }

    /// Runs one prompt to completion or until the retry budget is spent.
    ///
    /// A timed-out attempt is dropped together with its future, so a reply
    /// that shows up later is never observed.
    pub async fn call(&self, prompt: &OraclePrompt) -> Result<String> {
        let attempts = self.policy.max_retries + 1;
        let mut backoff = self.policy.initial_backoff;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                debug!(
                    task = %prompt.task,
                    attempt,
                    attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying oracle call"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.policy.max_backoff);
            }

            match timeout(self.policy.timeout, self.oracle.generate(prompt)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(err)) => {
                    warn!(task = %prompt.task, attempt, error = %err, "Oracle call failed");
                    last_error = err.to_string();
                }
                Err(_) => {
                    warn!(
                        task = %prompt.task,
                        attempt,
                        timeout_ms = self.policy.timeout.as_millis() as u64,
                        "Oracle call timed out"
                    );
                    last_error = format!("timed out after {:?}", self.policy.timeout);
                }
            }
        }

        Err(AppError::LLMError(format!(
            "{} failed after {} attempt(s): {}",
            prompt.task, attempts, last_error
        )))
    }
}
