//! Persisted session token storage.
//!
//! The token survives process restarts in a small JSON file keyed `token`,
//! the on-disk counterpart of a browser cookie.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::TokenError;

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, TokenError>;
    fn save(&self, token: &str) -> Result<(), TokenError>;
    fn clear(&self) -> Result<(), TokenError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    token: Option<String>,
}

/// Token stored as `{"token": "..."}` at a fixed path.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> TokenError {
        TokenError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let file: SessionFile =
            serde_json::from_str(&content).map_err(|source| TokenError::Format {
                path: self.path.clone(),
                source,
            })?;
        Ok(file.token.filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<(), TokenError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let file = SessionFile {
            token: Some(token.to_string()),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| TokenError::Format {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|e| self.io_err(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_err(e))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Process-local token, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenError> {
        Ok(self
            .token
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone()))
    }

    fn save(&self, token: &str) -> Result<(), TokenError> {
        let mut guard = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenError> {
        let mut guard = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
        Ok(())
    }
}
