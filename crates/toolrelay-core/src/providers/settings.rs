//! Provider selection from flags, config defaults and built-in defaults

use super::anthropic::{ANTHROPIC_DEFAULT_MAX_TOKENS, ANTHROPIC_DEFAULT_MODEL};
use super::error::{ProviderError, ProviderResult};
use super::openai::{GROQ_DEFAULT_MODEL, OPENAI_DEFAULT_MAX_TOKENS, OPENAI_DEFAULT_MODEL};
use super::traits::{ProviderModelConfig, TurnOptions};
use crate::config::DefaultSettings;
use crate::secrets::SecretStore;

/// Provider used when neither the command line nor the config names one
pub const DEFAULT_PROVIDER: &str = "groq";

/// List all supported provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    vec!["anthropic", "groq", "openai", "mock"]
}

/// Built-in model for a provider id
pub fn default_model(provider_id: &str) -> Option<&'static str> {
    match provider_id {
        "anthropic" => Some(ANTHROPIC_DEFAULT_MODEL),
        "groq" => Some(GROQ_DEFAULT_MODEL),
        "openai" => Some(OPENAI_DEFAULT_MODEL),
        "mock" => Some("mock"),
        _ => None,
    }
}

/// Built-in output limit for a provider id
pub fn default_max_tokens(provider_id: &str) -> u32 {
    match provider_id {
        "anthropic" => ANTHROPIC_DEFAULT_MAX_TOKENS,
        _ => OPENAI_DEFAULT_MAX_TOKENS,
    }
}

/// Values given on the command line (or its environment variables)
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Fully resolved provider setup, minus the API key
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub provider: String,
    pub model: ProviderModelConfig,
    pub options: TurnOptions,
}

impl ProviderSettings {
    /// Resolve settings: overrides, then config defaults, then built-ins
    pub fn resolve(overrides: &SettingsOverrides, defaults: &DefaultSettings) -> ProviderResult<Self> {
        let provider = overrides
            .provider
            .as_deref()
            .or(defaults.provider.as_deref())
            .unwrap_or(DEFAULT_PROVIDER)
            .trim()
            .to_lowercase();

        let builtin_model = default_model(&provider)
            .ok_or_else(|| ProviderError::UnsupportedProvider(provider.clone()))?;

        let model = overrides
            .model
            .clone()
            .or_else(|| defaults.model.clone())
            .unwrap_or_else(|| builtin_model.to_string());

        let mut model_config = ProviderModelConfig::new(model);
        if let Some(base) = &defaults.api_base {
            model_config = model_config.with_api_base(base.clone());
        }
        if let Some(key) = &defaults.api_key {
            model_config = model_config.with_api_key(key.clone());
        }

        let options = TurnOptions {
            max_tokens: Some(
                overrides
                    .max_tokens
                    .or(defaults.max_tokens)
                    .unwrap_or_else(|| default_max_tokens(&provider)),
            ),
            temperature: overrides.temperature.or(defaults.temperature),
        };

        Ok(Self {
            provider,
            model: model_config,
            options,
        })
    }

    pub fn needs_api_key(&self) -> bool {
        self.provider != "mock"
    }

    /// Fill in the API key: explicit config first, then `store`
    pub fn with_api_key_from(mut self, store: &dyn SecretStore) -> ProviderResult<Self> {
        if !self.needs_api_key() || self.model.api_key.is_some() {
            return Ok(self);
        }
        let key = store
            .get(&self.provider)
            .ok_or_else(|| ProviderError::missing_api_key(self.provider.clone()))?;
        self.model.api_key = Some(key);
        Ok(self)
    }
}
