//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// A secret store that tries several stores in order
///
/// The first available store that has the key wins.
///
/// # Example
///
/// ```
/// use toolrelay_core::secrets::{SecretStore, ChainSecretStore, EnvSecretStore, MemorySecretStore};
/// use std::sync::Arc;
///
/// let explicit: Arc<dyn SecretStore> = Arc::new(MemorySecretStore::new().with("groq", "gsk-explicit"));
/// let chain = ChainSecretStore::new(vec![explicit, Arc::new(EnvSecretStore::new())]).unwrap();
/// assert_eq!(chain.get("groq"), Some("gsk-explicit".to_string()));
/// ```
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    /// Create a new chain store; stores are tried in order
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> SecretStoreResult<Self> {
        if stores.is_empty() {
            return Err(SecretStoreError::Other(
                "ChainSecretStore requires at least one store".to_string(),
            ));
        }
        Ok(Self { stores })
    }

    pub fn stores(&self) -> &[Arc<dyn SecretStore>] {
        &self.stores
    }

    /// Find which store has a key
    pub fn find_store(&self, key: &str) -> Option<&Arc<dyn SecretStore>> {
        self.stores
            .iter()
            .find(|store| store.is_available() && store.has(key))
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.stores.iter().any(|s| s.is_available())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores
            .iter()
            .filter(|store| store.is_available())
            .find_map(|store| store.get(key))
    }
}

// Arc<dyn SecretStore> doesn't implement Debug
impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stores.iter().map(|s| s.name()).collect();
        f.debug_struct("ChainSecretStore")
            .field("stores", &names)
            .finish()
    }
}
