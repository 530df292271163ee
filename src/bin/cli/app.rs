use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use mapmynotes_lib::auth::{Authenticator, WebDavAuthenticator};
use mapmynotes_lib::concept_map::MapSummary;
use mapmynotes_lib::config::{AppConfig, Backend};
use mapmynotes_lib::storage::{BlobStore, FileBlobStore, StoreSession};

/// Folder under the data directory used by the local backend
const LOCAL_STORE_DIR: &str = "store";

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub data_dir: PathBuf,
}

impl App {
    /// Load the configuration, applying command line overrides
    pub fn new(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load configuration")?;
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => config.data_dir().context("Failed to get data directory")?,
        };
        Ok(Self { config, data_dir })
    }

    pub fn authenticator(&self) -> WebDavAuthenticator {
        WebDavAuthenticator::new(self.data_dir.clone())
    }

    fn open_store(&self) -> Result<Arc<dyn BlobStore>> {
        match self.config.store.backend {
            Backend::Local => {
                let path = self.data_dir.join(LOCAL_STORE_DIR);
                log::debug!("Using local store at {}", path.display());
                Ok(Arc::new(FileBlobStore::new(path)))
            }
            Backend::Webdav => {
                let auth = self.authenticator();
                if !auth.is_authenticated() {
                    bail!("Not signed in. Run `mapmynotes-cli login` first.");
                }
                let store = auth.connect().context("Failed to open the WebDAV store")?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Open a store session for the configured backend
    pub fn open_session(&self) -> Result<Arc<StoreSession>> {
        let store = self.open_store()?;
        Ok(Arc::new(StoreSession::new(store, &self.config.store.root)))
    }

    pub fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Find an item by id: exact match first, then a unique id prefix
pub fn resolve_id<'a, T>(
    items: &'a [T],
    query: &str,
    kind: &str,
    id_of: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    if let Some(item) = items.iter().find(|i| id_of(i) == query) {
        return Ok(item);
    }
    let matches: Vec<&T> = items
        .iter()
        .filter(|i| !query.is_empty() && id_of(i).starts_with(query))
        .collect();
    match matches.len() {
        0 => bail!("No {} with id '{}'", kind, query),
        1 => Ok(matches[0]),
        _ => bail!(
            "Ambiguous {} id '{}'. Matches:\n{}",
            kind,
            query,
            matches
                .iter()
                .map(|i| format!("  - {}", id_of(i)))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    }
}

/// Find a map by id prefix or by name (case-insensitive)
pub fn resolve_map<'a>(maps: &'a [MapSummary], query: &str) -> Result<&'a MapSummary> {
    if let Ok(map) = resolve_id(maps, query, "map", |m| m.id.as_str()) {
        return Ok(map);
    }
    let query_lower = query.to_lowercase();
    let matches: Vec<&MapSummary> = maps
        .iter()
        .filter(|m| m.name.to_lowercase() == query_lower)
        .collect();
    match matches.len() {
        0 => bail!(
            "No map matching '{}'. Available maps:\n{}",
            query,
            maps.iter()
                .map(|m| format!("  - {} ({})", m.name, m.id))
                .collect::<Vec<_>>()
                .join("\n")
        ),
        1 => Ok(matches[0]),
        _ => bail!("Several maps are named '{}'; use the id instead", query),
    }
}
