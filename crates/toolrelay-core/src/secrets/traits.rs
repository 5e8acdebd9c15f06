//! Core traits and types for secret lookup

use thiserror::Error;

/// Errors that can occur while building a secret store
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store not available: {0}")]
    NotAvailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Read-only source of API keys
///
/// Implementations:
/// - Environment variables (`EnvSecretStore`)
/// - A `.env` file (`DotenvSecretStore`)
/// - In-memory for testing (`MemorySecretStore`)
/// - Chained for fallback behavior (`ChainSecretStore`)
///
/// # Example
///
/// ```
/// use toolrelay_core::secrets::{SecretStore, EnvSecretStore};
///
/// let store = EnvSecretStore::new();
/// // store.get("groq") will check GROQ_API_KEY
/// ```
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Check if this store can be read at all
    fn is_available(&self) -> bool {
        true
    }

    /// Retrieve a secret by key
    ///
    /// The key can be:
    /// - A provider id (e.g., "groq") which gets mapped to the appropriate env var
    /// - A direct key (e.g., "GROQ_API_KEY")
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a secret exists
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
