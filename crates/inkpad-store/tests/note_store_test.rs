//! End-to-end tests for the core note lifecycle: save, read, list, delete,
//! recover, and the full scenario the store is built around.

use inkpad_store::{Error, NoteStore, StoreConfig};
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

fn store_over(dir: &TempDir) -> NoteStore {
    NoteStore::new(StoreConfig::new(dir.path()))
}

/// Filesystem mtime granularity can be coarse; space out writes that the
/// test orders by modification time.
async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(15)).await;
}

// ============================================================================
// Read-after-write
// ============================================================================

#[tokio::test]
async fn test_get_after_save_returns_exact_content() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store
        .save_note("alice", "work", "plan", "draft A")
        .await
        .unwrap();
    assert_eq!(
        store.get_note("alice", "work", "plan").await.unwrap(),
        "draft A"
    );

    // Overwrite through the same path: the cache must not serve the old
    // content once the save returned.
    store
        .save_note("alice", "work", "plan", "draft B")
        .await
        .unwrap();
    assert_eq!(
        store.get_note("alice", "work", "plan").await.unwrap(),
        "draft B"
    );
}

#[tokio::test]
async fn test_empty_content_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store.save_note("alice", "work", "blank", "").await.unwrap();
    assert_eq!(store.get_note("alice", "work", "blank").await.unwrap(), "");
}

#[tokio::test]
async fn test_get_missing_note_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);
    store.save_note("alice", "work", "plan", "x").await.unwrap();

    let err = store.get_note("alice", "work", "ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_create_note_refuses_existing_path() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store
        .create_note("alice", "work", "plan", "first")
        .await
        .unwrap();
    let err = store
        .create_note("alice", "work", "plan", "second")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    // The losing create must not have touched the note.
    assert_eq!(
        store.get_note("alice", "work", "plan").await.unwrap(),
        "first"
    );
}

#[tokio::test]
async fn test_save_clears_pending_draft() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store
        .save_draft("alice", "work", "plan", "half-typed")
        .await
        .unwrap();
    assert_eq!(
        store.get_draft("alice", "work", "plan").await.unwrap(),
        Some("half-typed".to_string())
    );

    store
        .save_note("alice", "work", "plan", "final")
        .await
        .unwrap();
    assert_eq!(store.get_draft("alice", "work", "plan").await.unwrap(), None);
}

// ============================================================================
// Notebooks and listing
// ============================================================================

#[tokio::test]
async fn test_save_auto_creates_notebook() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    assert!(store.list_notebooks("alice").await.unwrap().is_empty());
    store.save_note("alice", "work", "plan", "x").await.unwrap();
    assert_eq!(store.list_notebooks("alice").await.unwrap(), vec!["work"]);
}

#[tokio::test]
async fn test_create_notebook_explicit_and_duplicate() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store.create_notebook("alice", "ideas").await.unwrap();
    assert_eq!(store.list_notebooks("alice").await.unwrap(), vec!["ideas"]);

    let err = store.create_notebook("alice", "ideas").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
}

#[tokio::test]
async fn test_unmarked_directory_is_not_a_notebook() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);
    store.save_note("alice", "work", "plan", "x").await.unwrap();

    // A stray directory without the marker, even holding a note-like file.
    let stray = dir.path().join("alice/stray");
    std::fs::create_dir_all(&stray).unwrap();
    std::fs::write(stray.join("orphan.md"), "not listed").unwrap();

    assert_eq!(store.list_notebooks("alice").await.unwrap(), vec!["work"]);
}

#[tokio::test]
async fn test_list_notes_newest_first() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store.save_note("alice", "work", "older", "y").await.unwrap();
    tick().await;
    store.save_note("alice", "work", "newer", "x").await.unwrap();

    let notes = store.list_notes("alice", "work", false).await.unwrap();
    let titles: Vec<&str> = notes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);
    assert!(notes.iter().all(|n| n.preview.is_none()));
}

#[tokio::test]
async fn test_list_notes_with_preview_truncates() {
    let dir = TempDir::new().unwrap();
    let mut config = StoreConfig::new(dir.path());
    config.preview_max_chars = 10;
    let store = NoteStore::new(config);

    store
        .save_note("alice", "work", "long", "0123456789ABCDEF")
        .await
        .unwrap();
    let notes = store.list_notes("alice", "work", true).await.unwrap();
    assert_eq!(notes[0].preview.as_deref(), Some("0123456789…"));
}

#[tokio::test]
async fn test_list_notes_missing_notebook_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);
    let err = store.list_notes("alice", "nope", false).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_delete_notebook_tombstones_each_note() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store.save_note("alice", "work", "a", "1").await.unwrap();
    store.save_note("alice", "work", "b", "2").await.unwrap();
    store.save_note("alice", "keep", "c", "3").await.unwrap();

    store.delete_notebook("alice", "work").await.unwrap();

    assert_eq!(store.list_notebooks("alice").await.unwrap(), vec!["keep"]);
    let trash = store.list_deleted_notes("alice").await.unwrap();
    assert_eq!(trash.len(), 2);
    assert!(trash.iter().all(|t| t.notebook == "work"));
}

// ============================================================================
// Owners are isolated
// ============================================================================

#[tokio::test]
async fn test_owners_do_not_share_notes_or_trash() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    store
        .save_note("alice", "work", "plan", "alice's plan")
        .await
        .unwrap();
    store
        .save_note("bob", "work", "plan", "bob's plan")
        .await
        .unwrap();

    assert_eq!(
        store.get_note("alice", "work", "plan").await.unwrap(),
        "alice's plan"
    );
    assert_eq!(
        store.get_note("bob", "work", "plan").await.unwrap(),
        "bob's plan"
    );

    let id = store.delete_note("alice", "work", "plan").await.unwrap();
    assert!(store.list_deleted_notes("bob").await.unwrap().is_empty());
    // Bob cannot recover Alice's note.
    let err = store.recover_note("bob", id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// ============================================================================
// Full lifecycle scenario
// ============================================================================

#[tokio::test]
async fn test_full_note_lifecycle() {
    let dir = TempDir::new().unwrap();
    let store = store_over(&dir);

    // Save "plan" with "draft A": one history entry.
    store
        .save_note("alice", "work", "plan", "draft A")
        .await
        .unwrap();
    let history = store
        .get_note_history("alice", "work", "plan")
        .await
        .unwrap();
    assert_eq!(history.len(), 1);

    // Save "draft B": two entries, reads return the new content.
    store
        .save_note("alice", "work", "plan", "draft B")
        .await
        .unwrap();
    let history = store
        .get_note_history("alice", "work", "plan")
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(
        store.get_note("alice", "work", "plan").await.unwrap(),
        "draft B"
    );

    // Delete: reads fail, the tombstone holds the content at deletion time.
    let id = store.delete_note("alice", "work", "plan").await.unwrap();
    assert!(store.get_note("alice", "work", "plan").await.is_err());
    let trash = store.list_deleted_notes("alice").await.unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].content, "draft B");
    assert_eq!(trash[0].id, id);

    // Recover: content is back byte-for-byte, trash is empty again.
    store.recover_note("alice", id).await.unwrap();
    assert_eq!(
        store.get_note("alice", "work", "plan").await.unwrap(),
        "draft B"
    );
    assert!(store.list_deleted_notes("alice").await.unwrap().is_empty());
}
