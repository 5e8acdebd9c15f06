//! Backend turn failures
//!
//! Startup problems (`MissingApiKey`, `UnsupportedProvider`) stop the CLI
//! before any server is launched. Everything else fails a single query and
//! reaches the user as `AgentError::BackendRequest`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The request never got an HTTP response
    #[error("Could not reach {provider}: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status other than 429
    #[error("{provider} returned HTTP {status}: {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Body was not the JSON shape the adapter expects
    #[error("Could not decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// Body decoded but makes no sense as a turn
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl ProviderError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn transport(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            provider: provider.into(),
            source,
        }
    }

    pub fn status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn decode(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Name of the backend involved, when there is one
    pub fn provider(&self) -> &str {
        match self {
            Self::UnsupportedProvider(id) => id,
            Self::MissingApiKey { provider }
            | Self::Transport { provider, .. }
            | Self::Status { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Decode { provider, .. }
            | Self::InvalidResponse { provider, .. } => provider,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
