//! In-memory implementations of the registry collaborators.
//!
//! The note store treats tombstones and drafts as opaque record stores
//! behind the `inkpad-core` traits; these map-backed implementations are the
//! default backend and the fixture used throughout the tests. A persistent
//! backend only has to implement the same traits.

use std::collections::HashMap;

use async_trait::async_trait;
use inkpad_core::{DeletedNote, DeletedNoteRegistry, DraftRegistry, Error, NoteKey, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Map-backed tombstone store. Insertion order is preserved per owner.
#[derive(Default)]
pub struct MemoryDeletedNoteRegistry {
    records: RwLock<Vec<DeletedNote>>,
}

impl MemoryDeletedNoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeletedNoteRegistry for MemoryDeletedNoteRegistry {
    async fn save(&self, mut record: DeletedNote) -> Result<Uuid> {
        let id = Uuid::new_v4();
        record.id = id;
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn find_by_id_and_owner(&self, id: Uuid, owner: &str) -> Result<DeletedNote> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == id && r.owner == owner)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("deleted note {}", id)))
    }

    async fn find_all_by_owner(&self, owner: &str) -> Result<Vec<DeletedNote>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }

    async fn delete_by_id_and_owner(&self, id: Uuid, owner: &str) -> Result<()> {
        self.records
            .write()
            .await
            .retain(|r| !(r.id == id && r.owner == owner));
        Ok(())
    }

    async fn delete_all_by_owner(&self, owner: &str) -> Result<()> {
        self.records.write().await.retain(|r| r.owner != owner);
        Ok(())
    }
}

/// Map-backed draft store.
#[derive(Default)]
pub struct MemoryDraftRegistry {
    drafts: RwLock<HashMap<NoteKey, String>>,
}

impl MemoryDraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftRegistry for MemoryDraftRegistry {
    async fn save_draft(&self, key: NoteKey, content: String) -> Result<()> {
        self.drafts.write().await.insert(key, content);
        Ok(())
    }

    async fn find_draft(&self, key: &NoteKey) -> Result<Option<String>> {
        Ok(self.drafts.read().await.get(key).cloned())
    }

    async fn delete_draft(&self, key: &NoteKey) -> Result<()> {
        self.drafts.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpad_core::VersionRef;

    fn tombstone(owner: &str, title: &str) -> DeletedNote {
        DeletedNote {
            id: Uuid::nil(),
            owner: owner.to_string(),
            notebook: "work".to_string(),
            title: title.to_string(),
            last_ref: VersionRef("abc".to_string()),
            content: "snapshot".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_find_is_owner_scoped() {
        let registry = MemoryDeletedNoteRegistry::new();
        let id = registry.save(tombstone("alice", "plan")).await.unwrap();
        assert_ne!(id, Uuid::nil());

        assert!(registry.find_by_id_and_owner(id, "alice").await.is_ok());
        let err = registry.find_by_id_and_owner(id, "bob").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_all_keeps_other_owners() {
        let registry = MemoryDeletedNoteRegistry::new();
        registry.save(tombstone("alice", "a")).await.unwrap();
        registry.save(tombstone("alice", "b")).await.unwrap();
        registry.save(tombstone("bob", "c")).await.unwrap();

        registry.delete_all_by_owner("alice").await.unwrap();
        assert!(registry.find_all_by_owner("alice").await.unwrap().is_empty());
        assert_eq!(registry.find_all_by_owner("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_draft_round_trip_and_delete() {
        let registry = MemoryDraftRegistry::new();
        let key = NoteKey::new("alice", "work", "plan");

        assert_eq!(registry.find_draft(&key).await.unwrap(), None);
        registry
            .save_draft(key.clone(), "wip".to_string())
            .await
            .unwrap();
        assert_eq!(
            registry.find_draft(&key).await.unwrap().as_deref(),
            Some("wip")
        );
        registry.delete_draft(&key).await.unwrap();
        assert_eq!(registry.find_draft(&key).await.unwrap(), None);
    }
}
