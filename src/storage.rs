//! Bearer token sources. The gate only ever reads from these.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::debug;

use crate::gate::TokenStore;

pub const DEFAULT_TOKEN_KEY: &str = "client_token";

/// In-process token store, written by the sign-in flow.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut guard = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(token.into());
    }

    pub fn clear(&self) {
        let mut guard = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Reads the token from a JSON object file, one key per stored value.
///
/// ```json
/// { "client_token": "eyJhbGciOi..." }
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>, key: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "token file not readable");
                return None;
            }
        };

        let values: Value = match serde_json::from_str(&contents) {
            Ok(values) => values,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "token file is not valid JSON");
                return None;
            }
        };

        values
            .get(&self.key)
            .and_then(|v| v.as_str())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

/// Reads the token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvTokenStore {
    var: String,
}

impl EnvTokenStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenStore for EnvTokenStore {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}
