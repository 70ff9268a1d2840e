use serde::{Deserialize, Serialize};
use std::time::Duration;

use story_lab::engine::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use story_lab::{EngineConfig, ReconciliationPolicy, OPTIONS_SEPARATOR};

pub const MODEL_ENV: &str = "STORY_LAB_MODEL";
pub const BASE_URL_ENV: &str = "STORY_LAB_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// OpenAI-compatible API root, e.g. `https://api.cerebras.ai/v1`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,

    /// Name of the environment variable holding the API key. The key itself
    /// is never written to the settings file.
    pub api_key_env: String,

    pub request_timeout_secs: u64,
    pub policy: ReconciliationPolicy,
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            temperature: 0.7,
            api_key_env: "CEREBRAS_API_KEY".into(),
            request_timeout_secs: 120,
            policy: ReconciliationPolicy::default(),
            log_filter: "story_lab=info".into(),
        }
    }
}

impl AppSettings {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Environment wins over the settings file for model and endpoint.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            temperature: self.temperature,
            separator: OPTIONS_SEPARATOR.to_string(),
            policy: self.policy,
        }
    }
}
