//! The orchestrating note store.
//!
//! `NoteStore` composes the working tree, version log, caches, and registry
//! collaborators into the public operations: list, create, save, get,
//! delete, recover, history, rollback, copy, move, and search.
//!
//! Every mutation follows the same discipline: filesystem write, then
//! exactly one commit describing it, then cache invalidation for the touched
//! key, all under a per-owner mutex so two concurrent writes for one owner
//! can never interleave their commits and invalidations. Reads take no
//! exclusive lock; a read started after a write's commit completes observes
//! post-write content because the write invalidated the key before
//! returning.

use std::collections::HashMap;
use std::sync::Arc;

use inkpad_core::defaults::NOTEBOOK_MARKER;
use inkpad_core::{
    occurrence_count, DeletedNote, DeletedNoteRegistry, DraftRegistry, Error, NoteKey,
    NoteSummary, NoteVersion, Result, SearchHit, VersionRef,
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::NoteCache;
use crate::config::StoreConfig;
use crate::registry::{MemoryDeletedNoteRegistry, MemoryDraftRegistry};
use crate::version_log::VersionLog;
use crate::working_tree::WorkingTree;

/// Versioned, cached, per-owner note store.
pub struct NoteStore {
    tree: WorkingTree,
    log: VersionLog,
    cache: NoteCache,
    deleted: Arc<dyn DeletedNoteRegistry>,
    drafts: Arc<dyn DraftRegistry>,
    /// One mutex per owner, created lazily. Guards every
    /// write/commit/invalidate sequence for that owner. Entries are never
    /// pruned, so the map grows with the number of distinct owners seen
    /// over the store's lifetime; each entry is one `Arc<Mutex<()>>`.
    owner_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NoteStore {
    /// Store with the in-memory registry backends.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_registries(
            config,
            Arc::new(MemoryDeletedNoteRegistry::new()),
            Arc::new(MemoryDraftRegistry::new()),
        )
    }

    /// Store with explicit registry backends.
    pub fn with_registries(
        config: StoreConfig,
        deleted: Arc<dyn DeletedNoteRegistry>,
        drafts: Arc<dyn DraftRegistry>,
    ) -> Self {
        let tree = WorkingTree::new(&config.root_dir);
        let log = VersionLog::new(tree.clone());
        let cache = NoteCache::new(tree.clone(), &config);
        Self {
            tree,
            log,
            cache,
            deleted,
            drafts,
            owner_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn owner_lock(&self, owner: &str) -> Arc<Mutex<()>> {
        let mut locks = self.owner_locks.lock().await;
        locks
            .entry(owner.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // =========================================================================
    // NOTEBOOKS
    // =========================================================================

    /// Names of the owner's notebooks.
    pub async fn list_notebooks(&self, owner: &str) -> Result<Vec<String>> {
        self.tree.list_notebooks(owner).await
    }

    /// Explicitly create an empty notebook. `AlreadyExists` when present.
    pub async fn create_notebook(&self, owner: &str, notebook: &str) -> Result<()> {
        require_non_blank(&[notebook])?;
        let lock = self.owner_lock(owner).await;
        let _guard = lock.lock().await;

        if self.tree.notebook_exists(owner, notebook).await {
            return Err(Error::AlreadyExists(format!("notebook {}", notebook)));
        }
        self.create_notebook_inner(owner, notebook).await?;
        info!(owner, notebook, op = "create_notebook", "notebook created");
        Ok(())
    }

    /// Create the directory + marker and commit the marker path.
    /// Caller holds the owner lock.
    async fn create_notebook_inner(&self, owner: &str, notebook: &str) -> Result<()> {
        self.tree.ensure_notebook(owner, notebook).await?;
        let marker_path = format!("{}/{}", notebook, NOTEBOOK_MARKER);
        self.log.add_and_commit(owner, &marker_path).await?;
        Ok(())
    }

    /// Delete a notebook: every contained note individually (each with its
    /// own tombstone and commit), then the directory, then a commit removing
    /// the marker path. Deliberately N+1 commits, not one.
    pub async fn delete_notebook(&self, owner: &str, notebook: &str) -> Result<()> {
        let lock = self.owner_lock(owner).await;
        let _guard = lock.lock().await;

        let notes = self.tree.list_note_files(owner, notebook).await?;
        for (title, _) in &notes {
            self.delete_note_inner(owner, notebook, title).await?;
        }
        self.tree.remove_notebook_dir(owner, notebook).await?;
        let marker_path = format!("{}/{}", notebook, NOTEBOOK_MARKER);
        self.log.rm_and_commit(owner, &marker_path).await?;
        info!(
            owner,
            notebook,
            op = "delete_notebook",
            result_count = notes.len(),
            "notebook deleted"
        );
        Ok(())
    }

    /// Notes in one notebook, newest-first by modification time. Previews
    /// come from the preview cache and only load when requested.
    pub async fn list_notes(
        &self,
        owner: &str,
        notebook: &str,
        with_preview: bool,
    ) -> Result<Vec<NoteSummary>> {
        let files = self.tree.list_note_files(owner, notebook).await?;
        let mut summaries = Vec::with_capacity(files.len());
        for (title, last_modified) in files {
            let preview = if with_preview {
                self.cache
                    .preview(&NoteKey::new(owner, notebook, &title))
                    .await?
            } else {
                None
            };
            summaries.push(NoteSummary {
                notebook: notebook.to_string(),
                title,
                last_modified,
                preview,
            });
        }
        Ok(summaries)
    }

    // =========================================================================
    // NOTE CRUD
    // =========================================================================

    /// Create a note. `AlreadyExists` when the target path exists; otherwise
    /// save semantics.
    pub async fn create_note(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
        content: &str,
    ) -> Result<VersionRef> {
        let lock = self.owner_lock(owner).await;
        let _guard = lock.lock().await;

        if self.tree.note_exists(owner, notebook, title).await {
            return Err(Error::AlreadyExists(format!("note {}/{}", notebook, title)));
        }
        self.save_note_inner(owner, notebook, title, content).await
    }

    /// Save (create or overwrite) a note: auto-create the notebook, write,
    /// commit, clear any pending draft, invalidate the cache key.
    ///
    /// Re-saving identical content still produces a new commit; only blob
    /// storage deduplicates underneath.
    pub async fn save_note(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
        content: &str,
    ) -> Result<VersionRef> {
        let lock = self.owner_lock(owner).await;
        let _guard = lock.lock().await;
        self.save_note_inner(owner, notebook, title, content).await
    }

    async fn save_note_inner(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
        content: &str,
    ) -> Result<VersionRef> {
        require_non_blank(&[notebook, title])?;

        if !self.tree.notebook_exists(owner, notebook).await {
            self.create_notebook_inner(owner, notebook).await?;
        }

        let key = NoteKey::new(owner, notebook, title);
        self.tree.write(owner, notebook, title, content).await?;
        let version_ref = self.log.add_and_commit(owner, &key.relative_path()).await?;

        self.drafts.delete_draft(&key).await?;
        self.cache.invalidate(&key).await;
        info!(
            owner,
            notebook,
            title,
            version_ref = %version_ref,
            op = "save_note",
            "note saved"
        );
        Ok(version_ref)
    }

    /// Content of one note, cached or loaded. `NotFound` when absent.
    pub async fn get_note(&self, owner: &str, notebook: &str, title: &str) -> Result<String> {
        let key = NoteKey::new(owner, notebook, title);
        self.cache
            .content(&key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("note {}/{}", notebook, title)))
    }

    /// Delete a note: capture its content and current ref, remove the file,
    /// commit the removal, record a tombstone, invalidate the cache.
    ///
    /// Returns the tombstone id.
    pub async fn delete_note(&self, owner: &str, notebook: &str, title: &str) -> Result<Uuid> {
        let lock = self.owner_lock(owner).await;
        let _guard = lock.lock().await;
        self.delete_note_inner(owner, notebook, title).await
    }

    async fn delete_note_inner(&self, owner: &str, notebook: &str, title: &str) -> Result<Uuid> {
        let key = NoteKey::new(owner, notebook, title);
        let rel_path = key.relative_path();

        let content = self
            .cache
            .content(&key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("note {}/{}", notebook, title)))?;

        // The ref must reflect the last state that existed, so capture it
        // before the removal commit.
        let last_ref = self
            .log
            .current_ref(owner, &rel_path)
            .await?
            .ok_or_else(|| Error::NotFound(format!("history for {}", rel_path)))?;

        if !self.tree.delete(owner, notebook, title).await? {
            return Err(Error::NotFound(format!("note {}/{}", notebook, title)));
        }
        self.log.rm_and_commit(owner, &rel_path).await?;

        let id = self
            .deleted
            .save(DeletedNote {
                id: Uuid::nil(), // assigned by the registry
                owner: owner.to_string(),
                notebook: notebook.to_string(),
                title: title.to_string(),
                last_ref,
                content,
            })
            .await?;
        self.cache.invalidate(&key).await;
        info!(
            owner,
            notebook,
            title,
            tombstone_id = %id,
            op = "delete_note",
            "note deleted"
        );
        Ok(id)
    }

    // =========================================================================
    // TRASH
    // =========================================================================

    /// Recover a deleted note from its tombstone. Refuses to overwrite a
    /// live note at the same path. The next read is a normal cache load.
    pub async fn recover_note(&self, owner: &str, id: Uuid) -> Result<()> {
        let lock = self.owner_lock(owner).await;
        let _guard = lock.lock().await;

        let record = self.deleted.find_by_id_and_owner(id, owner).await?;
        if self
            .tree
            .note_exists(owner, &record.notebook, &record.title)
            .await
        {
            return Err(Error::AlreadyExists(format!(
                "note {}/{}",
                record.notebook, record.title
            )));
        }
        let rel_path = record.key().relative_path();
        self.log
            .recover_deleted(owner, &rel_path, &record.last_ref)
            .await?;
        self.deleted.delete_by_id_and_owner(id, owner).await?;
        info!(owner, tombstone_id = %id, rel_path = %rel_path, op = "recover_note", "note recovered");
        Ok(())
    }

    /// All tombstones for an owner.
    pub async fn list_deleted_notes(&self, owner: &str) -> Result<Vec<DeletedNote>> {
        self.deleted.find_all_by_owner(owner).await
    }

    /// Purge one tombstone without recovering it.
    pub async fn clear_deleted_note(&self, owner: &str, id: Uuid) -> Result<()> {
        self.deleted.delete_by_id_and_owner(id, owner).await
    }

    /// Empty the owner's trash.
    pub async fn clear_all_deleted_notes(&self, owner: &str) -> Result<()> {
        self.deleted.delete_all_by_owner(owner).await
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    /// Version history of one note, newest-first.
    pub async fn get_note_history(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
    ) -> Result<Vec<NoteVersion>> {
        let key = NoteKey::new(owner, notebook, title);
        self.log.history(owner, &key.relative_path()).await
    }

    /// Restore a note to its state at `version_ref` as a new commit, then
    /// return the resulting content. History grows; nothing is rewritten.
    pub async fn reset_and_get(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
        version_ref: &VersionRef,
    ) -> Result<String> {
        let key = NoteKey::new(owner, notebook, title);
        {
            let lock = self.owner_lock(owner).await;
            let _guard = lock.lock().await;
            self.log
                .reset_and_commit(owner, &key.relative_path(), version_ref)
                .await?;
            self.cache.invalidate(&key).await;
        }
        info!(
            owner,
            notebook,
            title,
            version_ref = %version_ref,
            op = "reset_and_get",
            "note reset to historical version"
        );
        self.get_note(owner, notebook, title).await
    }

    // =========================================================================
    // COPY / MOVE
    // =========================================================================

    /// Copy a note into another notebook. Fails through `get_note` when the
    /// source is missing and `create_note` when the destination title is
    /// taken.
    pub async fn copy_note(
        &self,
        owner: &str,
        src_notebook: &str,
        dst_notebook: &str,
        title: &str,
    ) -> Result<VersionRef> {
        if src_notebook == dst_notebook {
            return Err(Error::InvalidInput(
                "source and destination notebook are the same".to_string(),
            ));
        }
        let content = self.get_note(owner, src_notebook, title).await?;
        self.create_note(owner, dst_notebook, title, &content).await
    }

    /// Move/rename a note. A rename, not a deletion: no tombstone, one
    /// rename commit, source key invalidated, destination key primed with
    /// exactly the written content.
    pub async fn move_note(
        &self,
        owner: &str,
        src_notebook: &str,
        src_title: &str,
        dst_notebook: &str,
        dst_title: &str,
    ) -> Result<VersionRef> {
        require_non_blank(&[src_notebook, src_title, dst_notebook, dst_title])?;
        if src_notebook.eq_ignore_ascii_case(dst_notebook)
            && src_title.eq_ignore_ascii_case(dst_title)
        {
            return Err(Error::InvalidInput(
                "source and destination are the same note".to_string(),
            ));
        }

        let lock = self.owner_lock(owner).await;
        let _guard = lock.lock().await;

        let src_key = NoteKey::new(owner, src_notebook, src_title);
        let dst_key = NoteKey::new(owner, dst_notebook, dst_title);

        let content = self.cache.content(&src_key).await?.ok_or_else(|| {
            Error::NotFound(format!("note {}/{}", src_notebook, src_title))
        })?;
        if self.tree.note_exists(owner, dst_notebook, dst_title).await {
            return Err(Error::AlreadyExists(format!(
                "note {}/{}",
                dst_notebook, dst_title
            )));
        }
        if !self.tree.notebook_exists(owner, dst_notebook).await {
            self.create_notebook_inner(owner, dst_notebook).await?;
        }

        self.tree.delete(owner, src_notebook, src_title).await?;
        self.tree
            .write(owner, dst_notebook, dst_title, &content)
            .await?;
        let version_ref = self
            .log
            .mv_and_commit(owner, &src_key.relative_path(), &dst_key.relative_path())
            .await?;

        self.cache.invalidate(&src_key).await;
        self.cache.prime(&dst_key, &content).await;
        info!(
            owner,
            src = %src_key,
            dst = %dst_key,
            version_ref = %version_ref,
            op = "move_note",
            "note moved"
        );
        Ok(version_ref)
    }

    // =========================================================================
    // DRAFTS
    // =========================================================================

    /// Store an unsaved draft for a note. Cleared by the next save.
    pub async fn save_draft(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
        content: &str,
    ) -> Result<()> {
        self.drafts
            .save_draft(NoteKey::new(owner, notebook, title), content.to_string())
            .await
    }

    /// Pending draft for a note, if any.
    pub async fn get_draft(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
    ) -> Result<Option<String>> {
        self.drafts
            .find_draft(&NoteKey::new(owner, notebook, title))
            .await
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Search the given notebooks (or all of them) for a keyword.
    ///
    /// Case-sensitive substring match over content and title; results rank
    /// by total occurrence count descending. Ties break by last-modified
    /// descending, then title, purely for determinism. Zero-occurrence notes
    /// (and an empty keyword) return nothing.
    pub async fn search(
        &self,
        owner: &str,
        keyword: &str,
        notebooks: Option<&[String]>,
    ) -> Result<Vec<SearchHit>> {
        let notebook_names: Vec<String> = match notebooks {
            Some(names) if !names.is_empty() => names.to_vec(),
            _ => self.list_notebooks(owner).await?,
        };

        let mut hits = Vec::new();
        for notebook in &notebook_names {
            for note in self.list_notes(owner, notebook, true).await? {
                let key = NoteKey::new(owner, notebook, &note.title);
                let Some(content) = self.cache.content(&key).await? else {
                    continue; // removed between listing and load
                };
                let occurrences =
                    occurrence_count(&content, keyword) + occurrence_count(&note.title, keyword);
                if occurrences == 0 {
                    continue;
                }
                hits.push(SearchHit {
                    note,
                    content,
                    occurrences,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| b.note.last_modified.cmp(&a.note.last_modified))
                .then_with(|| a.note.title.cmp(&b.note.title))
        });
        debug!(
            owner,
            keyword,
            result_count = hits.len(),
            op = "search",
            "search completed"
        );
        Ok(hits)
    }
}

fn require_non_blank(identifiers: &[&str]) -> Result<()> {
    if identifiers.iter().any(|s| s.trim().is_empty()) {
        return Err(Error::InvalidInput("blank identifier".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_blank() {
        assert!(require_non_blank(&["work", "plan"]).is_ok());
        assert!(require_non_blank(&["work", ""]).is_err());
        assert!(require_non_blank(&["  ", "plan"]).is_err());
    }
}
