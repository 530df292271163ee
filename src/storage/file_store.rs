//! Blob store backed by a local directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::store::{check_path, BlobStore, StoreError};

pub struct FileBlobStore {
    base_path: PathBuf,
}

impl FileBlobStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        check_path(path)?;
        Ok(path.split('/').fold(self.base_path.clone(), |acc, part| acc.join(part)))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let full = self.resolve(path)?;
        match fs::read(&full).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Write beside the target and rename so readers never see a torn file
        let mut tmp = full.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &full).await?;
        log::debug!("store: wrote {} ({} bytes)", path, data.len());
        Ok(())
    }

    async fn list(&self, folder: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.resolve(folder)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".tmp") {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), StoreError> {
        let dir = self.resolve(folder)?;
        fs::create_dir_all(&dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_write_list_delete() {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp.path().to_path_buf());

        assert!(store.read("root/notes.json").await.unwrap().is_none());

        store.write("root/notes.json", b"[]").await.unwrap();
        store.write("root/maps/b.json", b"{}").await.unwrap();
        store.write("root/maps/a.json", b"{}").await.unwrap();

        assert_eq!(store.read("root/notes.json").await.unwrap().unwrap(), b"[]");
        assert_eq!(store.list("root/maps").await.unwrap(), vec!["a.json", "b.json"]);
        // Folders are not listed as blobs
        assert_eq!(store.list("root").await.unwrap(), vec!["notes.json"]);

        store.delete("root/maps/a.json").await.unwrap();
        store.delete("root/maps/a.json").await.unwrap();
        assert_eq!(store.list("root/maps").await.unwrap(), vec!["b.json"]);
    }

    #[tokio::test]
    async fn test_missing_folder_lists_empty() {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp.path().to_path_buf());
        assert!(store.list("nothing/here").await.unwrap().is_empty());

        store.ensure_folder("nothing/here").await.unwrap();
        assert!(temp.path().join("nothing").join("here").is_dir());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp.path().to_path_buf());
        assert!(matches!(
            store.write("../outside.json", b"x").await,
            Err(StoreError::InvalidPath(_))
        ));
    }
}
