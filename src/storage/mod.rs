//! Persistence through an opaque blob store
//!
//! - `BlobStore`: the store seam, with local directory, WebDAV and
//!   in-memory backends
//! - `normalize`: validated decoding of persisted blobs
//! - `StoreSession`: the per-sign-in session exposing every load and save

mod file_store;
mod memory;
pub mod normalize;
mod session;
mod store;
mod webdav;

pub use file_store::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use session::{StoreSession, DEFAULT_ROOT};
pub use store::{check_path, join_path, BlobStore, StoreError};
pub use webdav::{ResourceInfo, WebDavStore};
