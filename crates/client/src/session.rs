//! Durable session storage.
//!
//! The session is two string values, the bearer `token` and the signed-in
//! `userEmail`, that survive restarts. [`SessionStore`] is the storage seam;
//! [`FileSessionStore`] keeps them in a small JSON file and
//! [`MemorySessionStore`] keeps them in memory for tests and embedding.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Keys persisted in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Bearer token issued at login.
    Token,
    /// Email the token was issued for.
    UserEmail,
}

impl SessionKey {
    /// Storage name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::UserEmail => "userEmail",
        }
    }
}

/// Errors that can occur reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// Session file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The session values could not be encoded as JSON.
    #[error("{} could not be written as JSON: {source}", path.display())]
    Encode {
        /// Session file path.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value storage for session values.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: SessionKey) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be persisted.
    fn set(&self, key: SessionKey, value: &str) -> Result<(), SessionError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the change cannot be persisted.
    fn remove(&self, key: SessionKey) -> Result<(), SessionError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Session store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<BTreeMap<&'static str, String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_str())
            .cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), SessionError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.as_str(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), SessionError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key.as_str());
        Ok(())
    }
}

// =============================================================================
// File store
// =============================================================================

/// Session store backed by a JSON object on disk.
///
/// The file is read once on open and rewritten on every change.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open the session file at `path`.
    ///
    /// A missing file is an empty session. So is a file that does not parse:
    /// it is logged and overwritten by the next change, which lets the user
    /// sign out or in again.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Session file is not valid JSON; starting with an empty session"
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SessionError::Io { path, source }),
        };

        debug!(path = %path.display(), keys = values.len(), "Session file opened");

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file through a sibling temp file and a rename, so a crash
    /// mid-write leaves the previous contents in place.
    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let contents = serde_json::to_string_pretty(values).map_err(|source| {
            SessionError::Encode {
                path: self.path.clone(),
                source,
            }
        })?;

        // Owner-only (0600) on unix.
        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_str())
            .cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.as_str().to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: SessionKey) -> Result<(), SessionError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if values.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.persist(&values)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Typed access to the persisted session values.
///
/// Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.has_token().then_some("[REDACTED]"))
            .field("email", &self.email())
            .finish()
    }
}

impl Session {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Session backed by a fresh [`MemorySessionStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    /// Stored bearer token, if present and not blank.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.store
            .get(SessionKey::Token)
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from)
    }

    /// Whether a usable token is stored.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Stored user email, if present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.store
            .get(SessionKey::UserEmail)
            .filter(|e| !e.trim().is_empty())
    }

    /// Persist the token and email returned by a successful login.
    ///
    /// # Errors
    ///
    /// Returns error if either value cannot be persisted.
    pub fn persist_login(&self, token: &SecretString, email: &str) -> Result<(), SessionError> {
        self.store.set(SessionKey::Token, token.expose_secret())?;
        self.store.set(SessionKey::UserEmail, email)
    }

    /// Forget the token and email.
    ///
    /// # Errors
    ///
    /// Returns error if the change cannot be persisted.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(SessionKey::Token)?;
        self.store.remove(SessionKey::UserEmail)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_memory_session_login_and_clear() {
        let session = Session::in_memory();
        assert!(!session.has_token());

        session
            .persist_login(&SecretString::from("abc123"), "ana@example.com")
            .unwrap();
        assert_eq!(session.token().unwrap().expose_secret(), "abc123");
        assert_eq!(session.email().as_deref(), Some("ana@example.com"));

        session.clear().unwrap();
        assert!(session.token().is_none());
        assert!(session.email().is_none());
    }

    #[test]
    fn test_blank_token_is_no_token() {
        let store = MemorySessionStore::new();
        store.set(SessionKey::Token, "   ").unwrap();
        let session = Session::new(store);
        assert!(!session.has_token());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(SessionKey::Token, "tok").unwrap();
        store.set(SessionKey::UserEmail, "ana@example.com").unwrap();

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.get(SessionKey::Token).as_deref(), Some("tok"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"userEmail\""));

        reopened.remove(SessionKey::Token).unwrap();
        let again = FileSessionStore::open(&path).unwrap();
        assert!(again.get(SessionKey::Token).is_none());
        assert_eq!(
            again.get(SessionKey::UserEmail).as_deref(),
            Some("ana@example.com")
        );
    }

    #[test]
    fn test_file_store_recovers_from_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"token": "abc""#).unwrap();

        let store = FileSessionStore::open(&path).unwrap();
        assert!(store.get(SessionKey::Token).is_none());

        store.set(SessionKey::UserEmail, "ana@example.com").unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(SessionKey::Token, "tok").unwrap();
        store.set(SessionKey::Token, "tok-2").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            FileSessionStore::open(&path)
                .unwrap()
                .get(SessionKey::Token)
                .as_deref(),
            Some("tok-2")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileSessionStore::open(&path)
            .unwrap()
            .set(SessionKey::Token, "tok")
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::in_memory();
        session
            .persist_login(&SecretString::from("super-secret"), "ana@example.com")
            .unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
