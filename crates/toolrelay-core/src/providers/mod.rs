//! LLM provider implementations
//!
//! ## Architecture
//!
//! Every backend implements `Provider::send_turn`, which takes the
//! provider-neutral conversation and tool catalog and returns a
//! `ProviderTurn`: either a final answer or a list of tool calls.
//!
//! - `AnthropicProvider`: Anthropic Messages API
//! - `OpenAiProvider`: OpenAI-compatible Chat Completions (Groq, OpenAI)
//! - `MockProvider`: echo or scripted turns, for tests and offline runs

mod traits;
mod error;
mod http;
mod anthropic;
mod openai;
mod mock;
mod settings;

// Core traits and types
pub use traits::{Provider, ProviderModelConfig, ProviderTurn, TurnOptions};
pub use error::{ProviderError, ProviderResult};

pub use anthropic::{AnthropicProvider, ANTHROPIC_API_BASE, ANTHROPIC_DEFAULT_MODEL, ANTHROPIC_VERSION};
pub use openai::{OpenAiProvider, GROQ_API_BASE, GROQ_DEFAULT_MODEL, OPENAI_API_BASE, OPENAI_DEFAULT_MODEL};

// Mock provider for testing
pub use mock::{MockProvider, MockMode, MockReply, MockRequest};

pub use settings::{
    ProviderSettings, SettingsOverrides, DEFAULT_PROVIDER,
    default_max_tokens, default_model, supported_providers,
};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a provider from resolved settings
///
/// `anthropic` uses the Messages API, `groq` and `openai` use Chat
/// Completions, `mock` echoes. Anything else is `UnsupportedProvider`.
pub fn create_provider(
    settings: &ProviderSettings,
    logger: Arc<dyn Logger>,
) -> ProviderResult<Arc<dyn Provider>> {
    let config = settings.model.clone();
    let options = settings.options.clone();

    let provider: Arc<dyn Provider> = match settings.provider.as_str() {
        "anthropic" => Arc::new(AnthropicProvider::new(config, options, logger)?),
        id @ ("groq" | "openai") => Arc::new(OpenAiProvider::new(id, config, options, logger)?),
        "mock" => Arc::new(MockProvider::echo(logger)),
        other => return Err(ProviderError::UnsupportedProvider(other.to_string())),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn settings(provider: &str, key: Option<&str>) -> ProviderSettings {
        let mut model = ProviderModelConfig::new("m");
        if let Some(key) = key {
            model = model.with_api_key(key);
        }
        ProviderSettings {
            provider: provider.to_string(),
            model,
            options: TurnOptions::new(),
        }
    }

    #[test]
    fn test_create_provider() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger::new());
        for id in ["anthropic", "groq", "openai"] {
            let provider = create_provider(&settings(id, Some("key")), Arc::clone(&logger)).unwrap();
            assert_eq!(provider.name(), id);
            assert_eq!(provider.model(), "m");
        }
        assert_eq!(create_provider(&settings("mock", None), Arc::clone(&logger)).unwrap().name(), "mock");
    }

    #[test]
    fn test_create_provider_errors() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger::new());
        assert!(matches!(
            create_provider(&settings("gemini", Some("k")), Arc::clone(&logger)),
            Err(ProviderError::UnsupportedProvider(_))
        ));
        assert!(matches!(
            create_provider(&settings("groq", None), logger),
            Err(ProviderError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_supported_providers_have_models() {
        for id in supported_providers() {
            assert!(default_model(id).is_some(), "{} has no default model", id);
        }
    }
}
