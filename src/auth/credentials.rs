//! File-backed credential storage
//!
//! One file per service under `<data_dir>/.credentials/`, holding
//! `username:password` on the first line and the server URL on the second.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::AuthError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A server together with the credentials accepted by it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub url: String,
    pub credentials: Credentials,
}

pub struct CredentialStore {
    data_dir: PathBuf,
    service: String,
}

impl CredentialStore {
    pub fn new(data_dir: PathBuf, service: &str) -> Self {
        Self {
            data_dir,
            service: service.to_string(),
        }
    }

    /// Path to the credential file
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(".credentials").join(&self.service)
    }

    /// Parse the stored "username:password\nurl" format
    fn parse(data: &str) -> Result<Login, AuthError> {
        let mut lines = data.lines();
        let first = lines.next().unwrap_or_default();
        let (username, password) = first
            .split_once(':')
            .ok_or_else(|| AuthError::InvalidCredentials("missing ':' separator".to_string()))?;
        let url = lines.next().map(str::trim).unwrap_or_default();
        if username.is_empty() || url.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "username or server URL missing".to_string(),
            ));
        }
        Ok(Login {
            url: url.to_string(),
            credentials: Credentials::new(username, password),
        })
    }

    pub fn load(&self) -> Result<Option<Login>, AuthError> {
        match fs::read_to_string(self.path()) {
            Ok(data) => Self::parse(data.trim_end()).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, login: &Login) -> Result<(), AuthError> {
        if login.credentials.username.contains(':') {
            return Err(AuthError::InvalidCredentials(
                "username must not contain ':'".to_string(),
            ));
        }
        let value = format!(
            "{}:{}\n{}\n",
            login.credentials.username, login.credentials.password, login.url
        );

        let file_path = self.path();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, value)?;
        // Restrict permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&file_path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Remove stored credentials. Returns `false` if there were none.
    pub fn delete(&self) -> Result<bool, AuthError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
