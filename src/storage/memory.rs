//! In-process blob store, used for tests and offline sessions

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::store::{check_path, BlobStore, StoreError};

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    folder_creates: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later write fail with a server error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `ensure_folder` calls so far
    pub fn folder_create_count(&self) -> usize {
        self.folder_creates.load(Ordering::SeqCst)
    }

    /// Place raw bytes in the store, bypassing validation
    pub fn insert_raw(&self, path: &str, data: &[u8]) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(path.to_string(), data.to_vec());
        }
    }

    pub fn get_raw(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.lock().ok()?.get(path).cloned()
    }

    fn lock_blobs(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, StoreError> {
        self.blobs.lock().map_err(|_| StoreError::Status {
            status: 500,
            message: "memory store poisoned".to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        check_path(path)?;
        Ok(self.lock_blobs()?.get(path).cloned())
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        check_path(path)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                message: "write rejected".to_string(),
            });
        }
        self.lock_blobs()?.insert(path.to_string(), data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self, folder: &str) -> Result<Vec<String>, StoreError> {
        check_path(folder)?;
        let prefix = format!("{}/", folder);
        Ok(self
            .lock_blobs()?
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        check_path(path)?;
        self.lock_blobs()?.remove(path);
        Ok(())
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), StoreError> {
        check_path(folder)?;
        self.folder_creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_is_one_level() {
        let store = MemoryBlobStore::new();
        store.write("r/a.json", b"1").await.unwrap();
        store.write("r/sub/b.json", b"2").await.unwrap();
        store.write("rx/c.json", b"3").await.unwrap();
        assert_eq!(store.list("r").await.unwrap(), vec!["a.json"]);
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = MemoryBlobStore::new();
        store.set_fail_writes(true);
        assert!(store.write("a.json", b"1").await.is_err());
        assert_eq!(store.write_count(), 0);
        store.set_fail_writes(false);
        store.write("a.json", b"1").await.unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get_raw("a.json").unwrap(), b"1");
    }
}
