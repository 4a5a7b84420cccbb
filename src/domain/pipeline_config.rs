use serde::{Deserialize, Serialize};
use validator::Validate;

/// Highest accepted `id_base`. Leaves over three billion ids above it.
pub const MAX_ID_BASE: u32 = 1_000_000_000;

/// Timeout and retry budget for every oracle call.
#[derive(Debug, Serialize, Deserialize, Clone, Validate, PartialEq)]
#[serde(default)]
pub struct OracleSettings {
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    #[validate(range(max = 10))]
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of cases requested from the edge pass; extras are dropped.
    #[validate(range(min = 1, max = 50))]
    pub edge_case_target: usize,
    /// First id handed out by finalization, at most [`MAX_ID_BASE`].
    #[validate(range(max = 1_000_000_000))]
    pub id_base: u32,
    pub concurrent_gap_passes: bool,
    #[validate(range(min = 1, max = 32))]
    pub gap_pass_concurrency: usize,
    pub stop_validation_at_first_failure: bool,
    #[validate(length(min = 1))]
    pub output_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            edge_case_target: 5,
            id_base: 1,
            concurrent_gap_passes: false,
            gap_pass_concurrency: 4,
            stop_validation_at_first_failure: true,
            output_language: "English".to_string(),
        }
    }
}
