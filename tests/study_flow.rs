//! End-to-end flow through a store session on the in-memory store

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};

use mapmynotes_lib::concept_map::{
    connect, delete_node, find_note_for_node, promote_keywords, AutosaveSettings, Autosaver,
    NodeLookup, SaveStatus,
};
use mapmynotes_lib::flashcards::{add_card, Flashcard, ReviewSession};
use mapmynotes_lib::gratitude::{add_entry, journal_streak};
use mapmynotes_lib::keywords::collect_user_keywords;
use mapmynotes_lib::notes::{create_note, update_note, KeywordOutcome, NoteEditor, KEYWORD_KEY};
use mapmynotes_lib::storage::{MemoryBlobStore, StoreSession, DEFAULT_ROOT};
use mapmynotes_lib::streaks::{mark_day_complete, stats};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session() -> (Arc<MemoryBlobStore>, Arc<StoreSession>) {
    let store = Arc::new(MemoryBlobStore::new());
    let session = Arc::new(StoreSession::new(store.clone(), DEFAULT_ROOT));
    (store, session)
}

#[tokio::test]
async fn test_notes_to_map_round_trip() {
    let (_store, session) = session();

    // Confirm keywords through the editor
    let mut notes = session.load_notes().await.unwrap();
    let note = create_note(
        &mut notes,
        "Photosynthesis".into(),
        "Chlorophyll absorbs light. Chlorophyll lives in the chloroplast.".into(),
    );
    let mut editor = NoteEditor::new(note);
    let candidates = editor.candidates(5);
    assert_eq!(candidates[0], "chlorophyll");
    editor.select_candidate("chlorophyll");
    assert_eq!(
        editor.handle_key(KEYWORD_KEY),
        KeywordOutcome::Added("chlorophyll".into())
    );
    assert!(editor.select_first("chloroplast"));
    assert_eq!(
        editor.handle_key(KEYWORD_KEY),
        KeywordOutcome::Added("chloroplast".into())
    );
    let note = editor.into_note();
    assert!(update_note(&mut notes, note.clone()));
    session.save_notes(&notes).await.unwrap();

    // Promote into a new map, saving through the autosave layer
    let summary = session.create_map("Plants").await.unwrap();
    let mut map = session.load_map(&summary.id).await.unwrap();
    let notes = session.load_notes().await.unwrap();
    let keywords = collect_user_keywords(notes.iter());
    assert_eq!(keywords, vec!["chlorophyll", "chloroplast"]);

    let added = promote_keywords(&mut map, &keywords);
    assert_eq!(added.len(), 2);
    assert!(promote_keywords(&mut map, &keywords).is_empty());
    let edge = connect(&mut map, &added[0].id, &added[1].id, None).unwrap();

    let settings = AutosaveSettings {
        debounce: Duration::from_millis(20),
        interval: Duration::from_secs(60),
    };
    let saver = Autosaver::start(session.clone(), map.clone(), settings);
    saver.edit(map.clone()).await;
    assert_eq!(saver.flush().await, SaveStatus::Saved);

    let stored = session.load_map(&summary.id).await.unwrap();
    assert_eq!(stored.nodes.len(), 2);
    assert_eq!(stored.edges[0].data.label, "related to");
    assert_eq!(stored.edges[0].label, "related to");

    // Node activation leads back to the note
    let lookup = find_note_for_node(&stored, &notes, &added[0].id).unwrap();
    assert_eq!(
        lookup,
        NodeLookup::Keyword {
            note_id: note.id.clone()
        }
    );

    // Deleting a node cascades to its edges
    let (_, removed) = delete_node(&mut map, &added[1].id).unwrap();
    assert_eq!(removed[0].id, edge.id);
    saver.edit(map.clone()).await;
    assert_eq!(saver.flush().await, SaveStatus::Saved);
    saver.shutdown().await;

    let stored = session.load_map(&summary.id).await.unwrap();
    assert_eq!(stored.nodes.len(), 1);
    assert!(stored.edges.is_empty());
}

#[tokio::test]
async fn test_review_session_marks_streak() {
    let (_store, session) = session();
    let today = date(2025, 3, 10);
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();

    let mut cards = session.load_flashcards().await.unwrap();
    add_card(&mut cards, Flashcard::new("2+2".into(), "4".into(), vec![]));
    add_card(&mut cards, Flashcard::new("Capital of France".into(), "Paris".into(), vec!["geo".into()]));
    session.save_flashcards(&cards).await.unwrap();

    let mut cards = session.load_flashcards().await.unwrap();
    let mut review = ReviewSession::new(today);
    assert_eq!(review.due_cards(&cards).len(), 2);

    let first = review.review_current(&mut cards, true, None, now).unwrap();
    assert!(!first.session_complete);
    assert_eq!(first.card.interval_days, 3);
    assert_eq!(first.card.next_review_date, Some(date(2025, 3, 13)));

    // Yesterday was already complete
    let mut streak = session.load_streak().await.unwrap();
    mark_day_complete(&mut streak, date(2025, 3, 9));
    session.save_streak(&streak).await.unwrap();
    assert!(!session.record_review(&first, today).await.unwrap());
    assert_eq!(stats(&session.load_streak().await.unwrap(), today).current_streak, 1);

    // A card scheduled for later cannot be reviewed ahead of time
    let first_id = first.card.id.clone();
    assert!(review.review(&mut cards, &first_id, true, None, now).is_none());

    let second = review.review_current(&mut cards, false, None, now).unwrap();
    assert!(second.session_complete);
    assert_eq!(second.card.interval_days, 1);
    assert_eq!(review.reviewed_count(), 2);
    session.save_flashcards(&cards).await.unwrap();

    // The last due review advances the streak
    assert!(session.record_review(&second, today).await.unwrap());
    assert!(!session.record_review(&second, today).await.unwrap());

    let reloaded = session.load_streak().await.unwrap();
    let summary = stats(&reloaded, today);
    assert_eq!(summary.current_streak, 2);
    assert_eq!(summary.total_days, 2);

    let cards = session.load_flashcards().await.unwrap();
    let fresh = ReviewSession::new(date(2025, 3, 11));
    assert_eq!(fresh.due_cards(&cards).len(), 1);
}

#[tokio::test]
async fn test_legacy_streak_and_gratitude() {
    let (store, session) = session();
    store.insert_raw(
        "Map My Notes/reviewStreak.json",
        br#"{"2025-03-08": true, "2025-03-09": true}"#,
    );
    let streak = session.load_streak().await.unwrap();
    assert_eq!(stats(&streak, date(2025, 3, 10)).current_streak, 2);

    // Saving rewrites the blob in the canonical form
    session.save_streak(&streak).await.unwrap();
    let raw: serde_json::Value =
        serde_json::from_slice(&store.get_raw("Map My Notes/reviewStreak.json").unwrap()).unwrap();
    assert_eq!(raw["history"], serde_json::json!(["2025-03-08", "2025-03-09"]));

    let mut entries = session.load_gratitude_entries().await.unwrap();
    assert!(add_entry(&mut entries, date(2025, 3, 9), "Sunny walk", "").is_some());
    assert!(add_entry(&mut entries, date(2025, 3, 10), "  ", "blank title").is_none());
    assert!(add_entry(&mut entries, date(2025, 3, 10), "Good coffee", "").is_some());
    session.save_gratitude_entries(&entries).await.unwrap();

    let entries = session.load_gratitude_entries().await.unwrap();
    assert_eq!(entries[0].title, "Good coffee");
    let journal = journal_streak(&entries, date(2025, 3, 10));
    assert_eq!(journal.current_streak, 2);
    assert_eq!(journal.last_date, Some(date(2025, 3, 10)));
}
