//! Durable session storage.
//!
//! The session (bearer token, operator profile and login time) is the only state the desk
//! persists. It lives in a single JSON file so a restarted desk stays signed in.

use crate::models::{LoginResponse, User};
use crate::{HmsError, HmsResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub login_time: DateTime<Utc>,
}

impl Session {
    pub fn from_login(response: LoginResponse, login_time: DateTime<Utc>) -> Self {
        Self {
            token: response.access_token,
            user: response.user,
            login_time,
        }
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session.
    ///
    /// A missing file means "signed out". A file that no longer parses is removed and also
    /// treated as signed out.
    ///
    /// # Errors
    ///
    /// Returns `HmsError::FileRead` if the file exists but cannot be read.
    pub fn load(&self) -> HmsResult<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HmsError::FileRead(e)),
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.trim().is_empty() => Ok(Some(session)),
            Ok(_) => {
                warn!(path = %self.path.display(), "session file has no token, discarding");
                self.clear()?;
                Ok(None)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt session file, discarding");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Writes `session`, creating the parent directory when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub fn save(&self, session: &Session) -> HmsResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(HmsError::DirCreation)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(HmsError::Serialization)?;
        fs::write(&self.path, json).map_err(HmsError::FileWrite)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Removes the session file. Removing an absent file is not an error.
    pub fn clear(&self) -> HmsResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HmsError::FileWrite(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            token: "tok-1".into(),
            user: User {
                id: 1,
                username: "desk".into(),
                full_name: "Desk Operator".into(),
                role: "staff".into(),
            },
            login_time: Utc::now(),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));
        assert_eq!(store.load().unwrap(), None);

        let s = session();
        store.save(&s).unwrap();
        assert_eq!(store.load().unwrap(), Some(s));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = SessionStore::new(&path);
        assert_eq!(store.load().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn blank_token_is_signed_out() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let mut s = session();
        s.token = " ".into();
        store.save(&s).unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
