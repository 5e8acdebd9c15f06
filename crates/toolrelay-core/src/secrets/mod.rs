//! API key lookup
//!
//! Read-only stores chained in precedence order:
//! explicit config, then environment variables, then a `.env` file.

mod traits;
mod env_store;
mod dotenv_store;
mod memory_store;
mod chain_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use dotenv_store::{DotenvSecretStore, parse_dotenv};
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;

use std::sync::Arc;

/// Standard lookup chain: explicit key (if any), environment, `.env`
pub fn default_chain(explicit: Option<(&str, &str)>) -> SecretStoreResult<ChainSecretStore> {
    let mut stores: Vec<Arc<dyn SecretStore>> = Vec::new();
    if let Some((key, value)) = explicit {
        stores.push(Arc::new(MemorySecretStore::new().with(key, value)));
    }
    stores.push(Arc::new(EnvSecretStore::new()));
    stores.push(Arc::new(DotenvSecretStore::new()?));
    ChainSecretStore::new(stores)
}
