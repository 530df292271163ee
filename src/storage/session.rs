//! The session object every load and save goes through
//!
//! One session is created at start-up for the signed-in store and dropped
//! on sign-out. It owns the store handle and remembers that the app
//! folders exist, so they are created at most once per session.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::normalize;
use super::store::{join_path, BlobStore, StoreError};
use crate::concept_map::{ConceptMap, MapSummary, MapWriter};
use crate::flashcards::{Flashcard, ReviewOutcome};
use crate::gratitude::GratitudeEntry;
use crate::notes::Note;
use crate::streaks::{mark_day_complete, StreakRecord};

/// Remote folder holding every blob of the app
pub const DEFAULT_ROOT: &str = "Map My Notes";

const NOTES_FILE: &str = "notes.json";
const FLASHCARDS_FILE: &str = "flashcards.json";
const STREAK_FILE: &str = "reviewStreak.json";
const GRATITUDE_FILE: &str = "gratitude.json";
const MAPS_FOLDER: &str = "ConceptMaps";
const MAP_EXTENSION: &str = ".json";

pub struct StoreSession {
    store: Arc<dyn BlobStore>,
    root: String,
    folders_ready: OnceCell<()>,
}

impl StoreSession {
    pub fn new(store: Arc<dyn BlobStore>, root: &str) -> Self {
        Self {
            store,
            root: root.trim_matches('/').to_string(),
            folders_ready: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn file_path(&self, name: &str) -> String {
        join_path(&[self.root.as_str(), name])
    }

    fn maps_folder(&self) -> String {
        join_path(&[self.root.as_str(), MAPS_FOLDER])
    }

    fn map_path(&self, id: &str) -> Result<String, StoreError> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.starts_with('.') {
            return Err(StoreError::InvalidPath(id.to_string()));
        }
        let file = format!("{}{}", id, MAP_EXTENSION);
        Ok(join_path(&[self.maps_folder().as_str(), file.as_str()]))
    }

    /// Create the app folders the first time any operation needs them
    async fn ensure_folders(&self) -> Result<(), StoreError> {
        self.folders_ready
            .get_or_try_init(|| async {
                self.store.ensure_folder(&self.root).await?;
                self.store.ensure_folder(&self.maps_folder()).await?;
                log::debug!("store: folders ready under '{}'", self.root);
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_folders().await?;
        self.store.read(path).await
    }

    async fn write_json<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<(), StoreError> {
        self.ensure_folders().await?;
        let json = serde_json::to_vec_pretty(value)?;
        self.store.write(path, &json).await
    }

    // ===== Notes =====

    pub async fn load_notes(&self) -> Result<Vec<Note>, StoreError> {
        let bytes = self.read_file(&self.file_path(NOTES_FILE)).await?;
        Ok(normalize::decode_notes(bytes.as_deref()))
    }

    pub async fn save_notes(&self, notes: &[Note]) -> Result<(), StoreError> {
        self.write_json(&self.file_path(NOTES_FILE), notes).await
    }

    // ===== Flashcards =====

    pub async fn load_flashcards(&self) -> Result<Vec<Flashcard>, StoreError> {
        let bytes = self.read_file(&self.file_path(FLASHCARDS_FILE)).await?;
        Ok(normalize::decode_flashcards(bytes.as_deref()))
    }

    pub async fn save_flashcards(&self, cards: &[Flashcard]) -> Result<(), StoreError> {
        self.write_json(&self.file_path(FLASHCARDS_FILE), cards).await
    }

    // ===== Review streak =====

    pub async fn load_streak(&self) -> Result<StreakRecord, StoreError> {
        let bytes = self.read_file(&self.file_path(STREAK_FILE)).await?;
        Ok(normalize::decode_streak(bytes.as_deref()))
    }

    /// Always writes the canonical history form
    pub async fn save_streak(&self, streak: &StreakRecord) -> Result<(), StoreError> {
        self.write_json(&self.file_path(STREAK_FILE), streak).await
    }

    /// Mark `today` in the review streak once a review emptied the due queue.
    ///
    /// Returns whether the day was newly marked.
    pub async fn record_review(
        &self,
        outcome: &ReviewOutcome,
        today: NaiveDate,
    ) -> Result<bool, StoreError> {
        if !outcome.session_complete {
            return Ok(false);
        }
        let mut streak = self.load_streak().await?;
        if !mark_day_complete(&mut streak, today) {
            return Ok(false);
        }
        self.save_streak(&streak).await?;
        log::info!("store: review day {} marked complete", today);
        Ok(true)
    }

    // ===== Gratitude =====

    pub async fn load_gratitude_entries(&self) -> Result<Vec<GratitudeEntry>, StoreError> {
        let bytes = self.read_file(&self.file_path(GRATITUDE_FILE)).await?;
        Ok(normalize::decode_list(GRATITUDE_FILE, bytes.as_deref()))
    }

    pub async fn save_gratitude_entries(&self, entries: &[GratitudeEntry]) -> Result<(), StoreError> {
        self.write_json(&self.file_path(GRATITUDE_FILE), entries).await
    }

    // ===== Concept maps =====

    /// All maps, ordered by name
    pub async fn list_maps(&self) -> Result<Vec<MapSummary>, StoreError> {
        self.ensure_folders().await?;
        let folder = self.maps_folder();
        let mut maps = Vec::new();
        for name in self.store.list(&folder).await? {
            let Some(id) = name.strip_suffix(MAP_EXTENSION) else {
                continue;
            };
            let bytes = self.store.read(&join_path(&[folder.as_str(), name.as_str()])).await?;
            let Some(bytes) = bytes else {
                // Deleted between list and read
                continue;
            };
            maps.push(normalize::decode_map(id, Some(bytes.as_slice())).summary());
        }
        maps.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(maps)
    }

    /// Create and store an empty map
    pub async fn create_map(&self, title: &str) -> Result<MapSummary, StoreError> {
        let map = ConceptMap::new(Uuid::new_v4().to_string(), title.to_string());
        self.save_map(&map.id, &map).await?;
        log::info!("store: created map '{}' ({})", map.title, map.id);
        Ok(map.summary())
    }

    pub async fn load_map(&self, id: &str) -> Result<ConceptMap, StoreError> {
        let path = self.map_path(id)?;
        match self.read_file(&path).await? {
            Some(bytes) => Ok(normalize::decode_map(id, Some(bytes.as_slice()))),
            None => Err(StoreError::NotFound(format!("map {}", id))),
        }
    }

    /// Store `map` under `id`; the stored copy always carries that id
    pub async fn save_map(&self, id: &str, map: &ConceptMap) -> Result<(), StoreError> {
        let path = self.map_path(id)?;
        if map.id == id {
            self.write_json(&path, map).await
        } else {
            let mut copy = map.clone();
            copy.id = id.to_string();
            self.write_json(&path, &copy).await
        }
    }

    pub async fn delete_map(&self, id: &str) -> Result<(), StoreError> {
        let path = self.map_path(id)?;
        self.ensure_folders().await?;
        self.store.delete(&path).await?;
        log::info!("store: deleted map {}", id);
        Ok(())
    }

    /// End the session
    pub fn close(self) {
        log::info!("store: session for '{}' closed", self.root);
    }
}

#[async_trait]
impl MapWriter for StoreSession {
    async fn write_map(&self, map: &ConceptMap) -> Result<(), StoreError> {
        self.save_map(&map.id, map).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;

    fn session() -> (Arc<MemoryBlobStore>, StoreSession) {
        let store = Arc::new(MemoryBlobStore::new());
        let session = StoreSession::new(store.clone(), DEFAULT_ROOT);
        (store, session)
    }

    #[tokio::test]
    async fn test_folders_created_once() {
        let (store, session) = session();
        session.load_notes().await.unwrap();
        session.load_flashcards().await.unwrap();
        session.list_maps().await.unwrap();
        assert_eq!(store.folder_create_count(), 2);
    }

    #[tokio::test]
    async fn test_layout() {
        let (store, session) = session();
        session.save_notes(&[Note::new("a".into())]).await.unwrap();
        session.save_streak(&StreakRecord::default()).await.unwrap();
        let map = session.create_map("Biology").await.unwrap();

        assert!(store.get_raw("Map My Notes/notes.json").is_some());
        assert!(store.get_raw("Map My Notes/reviewStreak.json").is_some());
        assert!(store
            .get_raw(&format!("Map My Notes/ConceptMaps/{}.json", map.id))
            .is_some());
    }

    #[tokio::test]
    async fn test_maps_sorted_by_name() {
        let (_store, session) = session();
        session.create_map("zoology").await.unwrap();
        session.create_map("Anatomy").await.unwrap();
        session.create_map("botany").await.unwrap();

        let names: Vec<String> = session
            .list_maps()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Anatomy", "botany", "zoology"]);
    }

    #[tokio::test]
    async fn test_map_lifecycle() {
        let (_store, session) = session();
        let summary = session.create_map("Cells").await.unwrap();

        let mut map = session.load_map(&summary.id).await.unwrap();
        assert_eq!(map.title, "Cells");
        assert!(map.nodes.is_empty());
        assert!(map.created_at.is_some());

        crate::concept_map::promote_keywords(&mut map, &["nucleus"]);
        session.write_map(&map).await.unwrap();
        assert_eq!(session.load_map(&summary.id).await.unwrap().nodes.len(), 1);

        session.delete_map(&summary.id).await.unwrap();
        assert!(matches!(
            session.load_map(&summary.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(session.list_maps().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_map_ids() {
        let (_store, session) = session();
        assert!(matches!(
            session.load_map("../notes").await,
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_record_review_marks_day_once() {
        let (store, session) = session();
        let today = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut cards = vec![Flashcard::new("q".into(), "a".into(), vec![])];
        let mut review = crate::flashcards::ReviewSession::new(today);
        let outcome = review
            .review_current(&mut cards, true, None, chrono::Utc::now())
            .unwrap();
        assert!(outcome.session_complete);

        assert!(session.record_review(&outcome, today).await.unwrap());
        let writes = store.write_count();
        assert!(!session.record_review(&outcome, today).await.unwrap());
        assert_eq!(store.write_count(), writes);
        assert!(session.load_streak().await.unwrap().contains(today));
    }

    #[tokio::test]
    async fn test_record_review_ignores_unfinished_session() {
        let (store, session) = session();
        let today = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut cards = vec![
            Flashcard::new("q1".into(), "a".into(), vec![]),
            Flashcard::new("q2".into(), "a".into(), vec![]),
        ];
        let mut review = crate::flashcards::ReviewSession::new(today);
        let outcome = review
            .review_current(&mut cards, true, None, chrono::Utc::now())
            .unwrap();

        assert!(!session.record_review(&outcome, today).await.unwrap());
        assert!(store.get_raw("Map My Notes/reviewStreak.json").is_none());
    }

    #[tokio::test]
    async fn test_malformed_blobs_load_as_defaults() {
        let (store, session) = session();
        store.insert_raw("Map My Notes/notes.json", b"{not json");
        store.insert_raw("Map My Notes/gratitude.json", b"\"text\"");
        assert!(session.load_notes().await.unwrap().is_empty());
        assert!(session.load_gratitude_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let (store, session) = session();
        store.set_fail_writes(true);
        assert!(session.save_notes(&[]).await.is_err());
    }
}
