use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::pipeline_config::{OracleSettings, PipelineConfig};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

pub const DEFAULT_CONFIG_FILE: &str = "testsmith.toml";
pub const ENV_PREFIX: &str = "TESTSMITH_";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub llm: LLMConfig,
    pub oracle: OracleSettings,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn validate_all(&self) -> Result<()> {
        self.llm.validate()?;
        self.oracle.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// Layers defaults, an optional TOML file and `TESTSMITH_*` env vars.
pub struct ConfigService {
    figment: Figment,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_file(DEFAULT_CONFIG_FILE)
    }

    pub fn with_file(path: impl AsRef<Path>) -> Self {
        let _ = dotenvy::dotenv();
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self { figment }
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn load(&self) -> Result<AppConfig> {
        let mut config: AppConfig = self.figment.extract()?;
        if config.llm.api_key.is_none() {
            config.llm.api_key = config
                .llm
                .provider
                .api_key_env()
                .and_then(|name| std::env::var(name).ok())
                .filter(|key| !key.trim().is_empty());
        }
        config.validate_all()?;
        debug!(
            provider = ?config.llm.provider,
            model = %config.llm.model,
            has_api_key = config.llm.api_key.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
