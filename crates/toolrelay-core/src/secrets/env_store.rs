//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::SecretStore;

/// Mapping from provider ids to environment variable names
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("anthropic", vec!["ANTHROPIC_API_KEY"]);
    m.insert("claude", vec!["ANTHROPIC_API_KEY"]);
    m.insert("groq", vec!["GROQ_API_KEY"]);
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("openrouter", vec!["OPENROUTER_API_KEY"]);
    m.insert("mistral", vec!["MISTRAL_API_KEY"]);
    m.insert("mock", vec![]); // The mock provider never needs a key
    m
});

/// Candidate variable names for a key, in lookup order
///
/// The key itself, then the mapped provider variables, then `<KEY>_API_KEY`.
pub(crate) fn candidate_names(key: &str) -> Vec<String> {
    let mut names = vec![key.to_string()];
    if let Some(vars) = ENV_VAR_MAP.get(key.to_lowercase().as_str()) {
        names.extend(vars.iter().map(|v| v.to_string()));
    }
    let auto_key = format!("{}_API_KEY", key.to_uppercase().replace('-', "_"));
    if !names.contains(&auto_key) {
        names.push(auto_key);
    }
    names
}

/// Secret store that reads from environment variables
///
/// # Provider Mapping
///
/// - `anthropic` → `ANTHROPIC_API_KEY`
/// - `groq` → `GROQ_API_KEY`
/// - `openai` → `OPENAI_API_KEY`
/// - anything else → `<ID>_API_KEY`
///
/// You can also access environment variables directly by their full name.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Get the environment variable names for a provider
    pub fn get_env_vars_for_provider(provider: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(provider.to_lowercase().as_str()).map(|v| v.as_slice())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        candidate_names(key)
            .into_iter()
            .filter_map(|name| env::var(name).ok())
            .find(|value| !value.is_empty())
    }
}
