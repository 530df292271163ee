//! The opaque blob store every persisted feature goes through

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// A flat key/value store of byte blobs addressed by `/`-separated paths.
///
/// Paths are relative; a missing blob reads as `None` and deleting one that
/// does not exist succeeds.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Names of the blobs directly inside `folder`, sorted
    async fn list(&self, folder: &str) -> Result<Vec<String>, StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Create `folder` and its parents if missing
    async fn ensure_folder(&self, folder: &str) -> Result<(), StoreError>;
}

/// Reject absolute paths and any `.`/`..` or empty component
pub fn check_path(path: &str) -> Result<(), StoreError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    if path
        .split('/')
        .any(|part| part.is_empty() || part == "." || part == "..")
    {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Join path components with `/`, skipping empty ones
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
