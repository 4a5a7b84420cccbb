pub mod error;
pub mod gap;
pub mod llm_config;
pub mod pipeline_config;
pub mod requirement;
pub mod test_case;
pub mod test_suite;
pub mod validation;
