//! Trait seams for the external registry collaborators.
//!
//! These traits define the interfaces that concrete record stores must
//! satisfy. The note store only ever talks to tombstones and drafts through
//! them, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{DeletedNote, NoteKey};

/// Record store for soft-deleted notes (tombstones).
///
/// Owns tombstone records exclusively; the note store only requests
/// create/find/delete on it. Lookups are always owner-scoped so one owner can
/// never see or purge another owner's trash.
#[async_trait]
pub trait DeletedNoteRegistry: Send + Sync {
    /// Persist a tombstone and return its assigned id.
    async fn save(&self, record: DeletedNote) -> Result<Uuid>;

    /// Fetch a tombstone by id, scoped to an owner. `NotFound` on miss.
    async fn find_by_id_and_owner(&self, id: Uuid, owner: &str) -> Result<DeletedNote>;

    /// All tombstones for an owner, insertion order.
    async fn find_all_by_owner(&self, owner: &str) -> Result<Vec<DeletedNote>>;

    /// Remove one tombstone. No error when it was already gone.
    async fn delete_by_id_and_owner(&self, id: Uuid, owner: &str) -> Result<()>;

    /// Remove every tombstone for an owner (empty the trash).
    async fn delete_all_by_owner(&self, owner: &str) -> Result<()>;
}

/// Record store for unsaved drafts, keyed by note.
///
/// A draft is cleared whenever the note it shadows is saved.
#[async_trait]
pub trait DraftRegistry: Send + Sync {
    /// Store or replace the draft for a key.
    async fn save_draft(&self, key: NoteKey, content: String) -> Result<()>;

    /// Fetch the draft for a key, if any.
    async fn find_draft(&self, key: &NoteKey) -> Result<Option<String>>;

    /// Drop the draft for a key. No error when none existed.
    async fn delete_draft(&self, key: &NoteKey) -> Result<()>;
}
