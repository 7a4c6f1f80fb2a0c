//! Session token storage.
//!
//! The session token is an opaque bearer string held in client-local
//! persistent storage under a single named entry. Absence of the entry
//! means the client is unauthenticated.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientResult;

/// Short-lived bearer credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Tokens never show up in logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Response body of the login and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: SessionToken,
}

/// Client-local persistent storage for the session token.
pub trait SessionStore: Send + Sync {
    /// Read the current token, if any.
    fn get(&self) -> ClientResult<Option<SessionToken>>;

    /// Persist a token, replacing any previous one.
    fn set(&self, token: &SessionToken) -> ClientResult<()>;

    /// Delete the persisted token. Deleting an absent token is not an error.
    fn clear(&self) -> ClientResult<()>;
}

/// Process-local token storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<SessionToken>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(SessionToken::new(token))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> ClientResult<Option<SessionToken>> {
        Ok(self.token.lock().clone())
    }

    fn set(&self, token: &SessionToken) -> ClientResult<()> {
        *self.token.lock() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        self.token.lock().take();
        Ok(())
    }
}

/// Token storage backed by a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store persisting to `path`. Parent directories are created
    /// on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> ClientResult<Option<SessionToken>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SessionToken::new(token)))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &SessionToken) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write a sibling file and rename it over the entry so readers never
        // see a partial token
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let mut tmp_file = fs::File::create(&tmp_path)?;
        tmp_file.write_all(token.as_str().as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        debug!(path = %self.path.display(), "session token stored");
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session token removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
