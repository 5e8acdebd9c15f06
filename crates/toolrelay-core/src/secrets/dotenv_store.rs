//! `.env` file secret store

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::env_store::candidate_names;
use super::traits::{SecretStore, SecretStoreResult};

/// Secret store backed by `KEY=VALUE` lines of a `.env` file
///
/// The file is read once, when the store is opened. A missing file yields
/// an empty, unavailable store rather than an error. Keys are looked up
/// with the same provider mapping as `EnvSecretStore`.
#[derive(Debug, Default)]
pub struct DotenvSecretStore {
    path: PathBuf,
    values: HashMap<String, String>,
    loaded: bool,
}

impl DotenvSecretStore {
    /// Open `.env` in the current directory
    pub fn new() -> SecretStoreResult<Self> {
        Self::open(".env")
    }

    /// Open a specific dotenv file
    pub fn open(path: impl AsRef<Path>) -> SecretStoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Self {
                values: parse_dotenv(&content),
                path,
                loaded: true,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self {
                path,
                ..Self::default()
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse dotenv text into a map
///
/// Handles blank lines, `#` comments, an optional `export ` prefix and
/// matching single or double quotes around the value. Later lines win.
pub fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        values.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    values
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    // Trailing comment on an unquoted value
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end(),
        None => value,
    }
}

impl SecretStore for DotenvSecretStore {
    fn name(&self) -> &str {
        "dotenv"
    }

    fn is_available(&self) -> bool {
        self.loaded
    }

    fn get(&self, key: &str) -> Option<String> {
        candidate_names(key)
            .iter()
            .filter_map(|name| self.values.get(name))
            .find(|value| !value.is_empty())
            .cloned()
    }
}
