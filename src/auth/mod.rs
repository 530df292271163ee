//! Sign-in state for the remote store
//!
//! A successful sign-in is remembered in a credential file; signing out
//! deletes it. The local directory backend needs no sign-in.

mod credentials;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use credentials::{CredentialStore, Credentials, Login};

use crate::storage::{StoreError, WebDavStore};

/// Credential file name for the WebDAV backend
pub const WEBDAV_SERVICE: &str = "mapmynotes-webdav";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Server rejected the credentials")]
    Rejected,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Session collaborator: establishes and answers for the signed-in state
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify `login` against the server and remember it
    async fn authenticate(&self, login: Login) -> Result<Login, AuthError>;

    fn is_authenticated(&self) -> bool;

    /// The remembered login, if any
    fn current(&self) -> Result<Option<Login>, AuthError>;

    /// Forget the remembered login
    fn logout(&self) -> Result<(), AuthError>;
}

pub struct WebDavAuthenticator {
    credentials: CredentialStore,
}

impl WebDavAuthenticator {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            credentials: CredentialStore::new(data_dir, WEBDAV_SERVICE),
        }
    }

    /// Open a store for the remembered login
    pub fn connect(&self) -> Result<WebDavStore, AuthError> {
        let login = self.current()?.ok_or(AuthError::NotAuthenticated)?;
        Ok(WebDavStore::new(&login.url, login.credentials)?)
    }
}

#[async_trait]
impl Authenticator for WebDavAuthenticator {
    async fn authenticate(&self, login: Login) -> Result<Login, AuthError> {
        let store = WebDavStore::new(&login.url, login.credentials.clone())?;
        match store.test_connection().await {
            Ok(()) => {}
            Err(StoreError::AuthFailed) => return Err(AuthError::Rejected),
            Err(e) => return Err(e.into()),
        }
        self.credentials.save(&login)?;
        log::info!(
            "auth: signed in to {} as {}",
            login.url,
            login.credentials.username
        );
        Ok(login)
    }

    fn is_authenticated(&self) -> bool {
        matches!(self.credentials.load(), Ok(Some(_)))
    }

    fn current(&self) -> Result<Option<Login>, AuthError> {
        self.credentials.load()
    }

    fn logout(&self) -> Result<(), AuthError> {
        if self.credentials.delete()? {
            log::info!("auth: signed out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_logout_clears_state() {
        let temp = TempDir::new().unwrap();
        let auth = WebDavAuthenticator::new(temp.path().to_path_buf());
        assert!(!auth.is_authenticated());
        assert!(matches!(auth.connect(), Err(AuthError::NotAuthenticated)));

        CredentialStore::new(temp.path().to_path_buf(), WEBDAV_SERVICE)
            .save(&Login {
                url: "https://dav.example.com".into(),
                credentials: Credentials::new("ana", "pw"),
            })
            .unwrap();
        assert!(auth.is_authenticated());
        assert!(auth.connect().is_ok());

        auth.logout().unwrap();
        assert!(!auth.is_authenticated());
        auth.logout().unwrap();
    }
}
