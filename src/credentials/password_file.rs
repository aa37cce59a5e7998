//! Password file loading.
//!
//! The file is a JSON object mapping backend URIs to passwords:
//!
//! ```json
//! { "redis://localhost:6379": "secret", "redis://replica:6379": "other" }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use super::CredentialError;

/// Backend address → password.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CredentialSet(HashMap<String, String>);

impl CredentialSet {
    /// Pick the authoritative credential source.
    ///
    /// The file is only consulted when no inline password was supplied and a
    /// file path was.
    pub fn resolve(inline_password: &str, password_file: &str) -> Result<Self, CredentialError> {
        if inline_password.is_empty() && !password_file.is_empty() {
            load_password_map(Path::new(password_file))
        } else {
            Ok(Self::default())
        }
    }

    /// Password for a backend address, if the file listed one.
    pub fn password_for(&self, addr: &str) -> Option<&str> {
        self.0.get(addr).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Passwords never reach logs.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut addrs: Vec<&str> = self.0.keys().map(String::as_str).collect();
        addrs.sort_unstable();
        f.debug_struct("CredentialSet").field("addrs", &addrs).finish()
    }
}

/// Load a password map from a JSON file.
pub fn load_password_map(path: &Path) -> Result<CredentialSet, CredentialError> {
    let content = std::fs::read(path).map_err(|source| CredentialError::ReadPasswordFile {
        path: path.to_path_buf(),
        source,
    })?;

    let set: CredentialSet =
        serde_json::from_slice(&content).map_err(|source| CredentialError::ParsePasswordFile {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = %path.display(), entries = set.len(), "Loaded password file");
    Ok(set)
}
