//! Credential file store.
//!
//! On platforms without a Keychain, Claude Code writes the same OAuth payload
//! to `~/.claude/.credentials.json`. The file holds exactly one entry, so the
//! service name passed to [`CredentialStore::lookup`] is not consulted.

use std::fs;
use std::path::{Path, PathBuf};

use super::{CredentialStore, CREDENTIALS_FILE_PATH};
use crate::error::CredentialError;

/// [`CredentialStore`] reading a single JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store reading the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store reading `~/.claude/.credentials.json`, or `None` when the home
    /// directory cannot be determined.
    pub fn in_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(CREDENTIALS_FILE_PATH)))
    }

    /// Path this store reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileStore {
    fn lookup(&self, _service: &str) -> Result<Vec<u8>, CredentialError> {
        fs::read(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CredentialError::NotFound,
            _ => CredentialError::Io(format!("{}: {}", self.path.display(), e)),
        })
    }
}
