use std::path::{Path, PathBuf};

use thiserror::Error;

/// The credential check is an external concern: the console only needs a
/// yes/no answer for an email/password pair.
pub trait Authenticator {
    fn authenticate(&self, email: &str, password: &str) -> bool;
}

/// Credentials sourced from the config file, standing in for a real
/// credential service.
#[derive(Clone, Debug)]
pub struct ConfigCredentials {
    pub email: String,
    pub password: String,
}

impl Authenticator for ConfigCredentials {
    fn authenticate(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove session file '{path}': {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Session presence as a marker file: present means logged in, absent means
/// logged out. Survives across invocations the way the browser shell kept a
/// flag in ambient storage.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_present(&self) -> bool {
        self.path.exists()
    }

    pub fn open(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Write {
                path: self.path.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, b"authenticated\n").map_err(|e| SessionError::Write {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    pub fn close(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Remove {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }
}
