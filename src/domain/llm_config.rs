use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Local,
    OpenAI,
    #[serde(alias = "Gemini")]
    Google,
}

impl LLMProvider {
    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LLMProvider::Local => None,
            LLMProvider::OpenAI => Some("OPENAI_API_KEY"),
            LLMProvider::Google => Some("GEMINI_API_KEY"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    #[validate(length(min = 1))]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: Some(4096),
            temperature: Some(0.0),
        }
    }
}
