//! Storage for the bearer token attached to API requests.
//!
//! The token is read on every request, so a change made by one caller (for
//! example clearing it after a 401) is seen by the next request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};

/// Fixed key the token is stored under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Where the API token lives between requests.
pub trait CredentialStore: Send + Sync {
    /// Current token, if any.
    fn token(&self) -> Option<SecretString>;

    /// Replace the stored token.
    fn set_token(&self, token: SecretString);

    /// Forget the stored token.
    fn clear(&self);
}

/// Token kept in memory for the life of the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: SecretString) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Token persisted in a small JSON key/value file.
///
/// Other keys in the file are preserved. I/O failures are logged and treated
/// as "no token", matching how a browser's storage degrades.
pub struct FileCredentialStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> BTreeMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "Credential file is not valid JSON");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read credential file");
                BTreeMap::new()
            }
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|raw| std::fs::write(&self.path, raw));
        if let Err(e) = result {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to write credential file");
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<SecretString> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.read_entries()
            .remove(AUTH_TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
    }

    fn set_token(&self, token: SecretString) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries();
        entries.insert(
            AUTH_TOKEN_KEY.to_string(),
            token.expose_secret().to_string(),
        );
        self.write_entries(&entries);
    }

    fn clear(&self) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries();
        if entries.remove(AUTH_TOKEN_KEY).is_some() {
            self.write_entries(&entries);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        assert!(store.token().is_none());

        store.set_token(SecretString::from("abc"));
        assert_eq!(store.token().unwrap().expose_secret(), "abc");

        store.clear();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_file_store_uses_auth_token_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(&path);
        assert!(store.token().is_none());

        store.set_token(SecretString::from("secret-token"));
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["authToken"], "secret-token");

        // A second store over the same file sees the token.
        let other = FileCredentialStore::new(&path);
        assert_eq!(other.token().unwrap().expose_secret(), "secret-token");
    }

    #[test]
    fn test_file_store_clear_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"authToken": "t", "theme": "dark"}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        store.clear();

        assert!(store.token().is_none());
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert!(raw.get("authToken").is_none());
    }

    #[test]
    fn test_file_store_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.token().is_none());
    }
}
