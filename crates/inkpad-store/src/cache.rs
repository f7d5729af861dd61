//! Read-through, write-invalidated note caches.
//!
//! Two independent keyed caches sit in front of the working tree: full
//! content and preview, both `(owner, notebook, title) -> String`. On a miss
//! the value loads from the working tree; the preview derives from the same
//! read by plain truncation. Negative results (note absent) are never cached.
//!
//! Eviction (LRU capacity + time-to-idle) is purely a performance knob: a
//! miss is always satisfiable by re-reading the working tree. The entries
//! are copies, never the authoritative bytes; every mutation of a note's
//! content, existence, or path must invalidate its key here before the
//! mutating operation reports success.
//!
//! Miss loads and invalidations race: a reader can capture pre-write bytes
//! from disk, get descheduled across an entire write/commit/invalidate, and
//! only then reach its insert, which would re-populate the cache with
//! pre-write content. Each key therefore carries an invalidation epoch;
//! a miss load records the epoch before touching disk and its insert is
//! discarded when the epoch moved in the meantime. The stale bytes may
//! still be returned to that one reader (its read started before the
//! write), but they never enter the cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use inkpad_core::defaults::PREVIEW_ELLIPSIS;
use inkpad_core::{NoteKey, Result};
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::StoreConfig;
use crate::working_tree::WorkingTree;

/// Content and preview caches over a working tree.
#[derive(Clone)]
pub struct NoteCache {
    tree: WorkingTree,
    content: Cache<NoteKey, String>,
    preview: Cache<NoteKey, String>,
    preview_max_chars: usize,
    /// Per-key invalidation epoch; bumped by `invalidate`, checked before
    /// any miss-path insert. A missing entry counts as epoch 0.
    epochs: Arc<Mutex<HashMap<NoteKey, u64>>>,
}

impl NoteCache {
    pub fn new(tree: WorkingTree, config: &StoreConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_seconds);
        Self {
            tree,
            content: Cache::builder()
                .max_capacity(config.content_cache_capacity)
                .time_to_idle(ttl)
                .build(),
            preview: Cache::builder()
                .max_capacity(config.preview_cache_capacity)
                .time_to_idle(ttl)
                .build(),
            preview_max_chars: config.preview_max_chars,
            epochs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn epoch_of(&self, key: &NoteKey) -> u64 {
        self.epochs.lock().await.get(key).copied().unwrap_or(0)
    }

    /// Insert a loaded value only if the key saw no invalidation since the
    /// load began. The epoch lock is held across the insert so an
    /// invalidation can never slip between the check and the insert.
    async fn insert_if_current(
        &self,
        cache: &Cache<NoteKey, String>,
        key: &NoteKey,
        value: &str,
        loaded_at_epoch: u64,
    ) -> bool {
        let epochs = self.epochs.lock().await;
        if epochs.get(key).copied().unwrap_or(0) != loaded_at_epoch {
            debug!(%key, "cache: discarding insert, key invalidated during load");
            return false;
        }
        cache.insert(key.clone(), value.to_string()).await;
        true
    }

    /// Full content for a key: cached, or loaded from the working tree.
    /// `Ok(None)` when the note does not exist (distinct from an empty note,
    /// which caches and returns as `Some("")`).
    pub async fn content(&self, key: &NoteKey) -> Result<Option<String>> {
        if let Some(hit) = self.content.get(key).await {
            debug!(%key, cache = "content", "cache: hit");
            return Ok(Some(hit));
        }
        let loaded_at_epoch = self.epoch_of(key).await;
        match self.tree.read(&key.owner, &key.notebook, &key.title).await {
            Ok(content) => {
                debug!(%key, cache = "content", "cache: miss, loaded");
                self.insert_if_current(&self.content, key, &content, loaded_at_epoch)
                    .await;
                Ok(Some(content))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Preview for a key: cached, or derived from a fresh working-tree read.
    pub async fn preview(&self, key: &NoteKey) -> Result<Option<String>> {
        if let Some(hit) = self.preview.get(key).await {
            return Ok(Some(hit));
        }
        let loaded_at_epoch = self.epoch_of(key).await;
        // A content-cache hit saves the disk read; the preview derives from
        // the same bytes either way.
        let content = match self.content(key).await? {
            Some(content) => content,
            None => return Ok(None),
        };
        let preview = truncate_preview(&content, self.preview_max_chars);
        self.insert_if_current(&self.preview, key, &preview, loaded_at_epoch)
            .await;
        Ok(Some(preview))
    }

    /// Prime both caches for a key with exact post-mutation content. Only
    /// ever called under the owner lock with the bytes just written to the
    /// working tree, so it bypasses the epoch check.
    pub async fn prime(&self, key: &NoteKey, content: &str) {
        self.content.insert(key.clone(), content.to_string()).await;
        self.preview
            .insert(
                key.clone(),
                truncate_preview(content, self.preview_max_chars),
            )
            .await;
    }

    /// Drop both entries for a key and bump its epoch so any in-flight miss
    /// load discards its insert.
    pub async fn invalidate(&self, key: &NoteKey) {
        let mut epochs = self.epochs.lock().await;
        *epochs.entry(key.clone()).or_insert(0) += 1;
        self.content.invalidate(key).await;
        self.preview.invalidate(key).await;
        debug!(%key, "cache: invalidated");
    }
}

/// Plain character truncation, marked with an ellipsis when content was cut.
fn truncate_preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut preview: String = content.chars().take(max_chars).collect();
    preview.push_str(PREVIEW_ELLIPSIS);
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_over(dir: &TempDir) -> (NoteCache, WorkingTree) {
        let tree = WorkingTree::new(dir.path());
        let config = StoreConfig::new(dir.path());
        (NoteCache::new(tree.clone(), &config), tree)
    }

    #[test]
    fn test_truncate_preview_short_content_untouched() {
        assert_eq!(truncate_preview("short", 10), "short");
        assert_eq!(truncate_preview("", 10), "");
    }

    #[test]
    fn test_truncate_preview_cuts_on_chars_not_bytes() {
        let content = "héllo wörld";
        let preview = truncate_preview(content, 5);
        assert_eq!(preview, format!("héllo{}", PREVIEW_ELLIPSIS));
    }

    #[tokio::test]
    async fn test_miss_loads_from_tree_and_caches() {
        let dir = TempDir::new().unwrap();
        let (cache, tree) = cache_over(&dir);
        tree.write("alice", "work", "plan", "draft A").await.unwrap();

        let key = NoteKey::new("alice", "work", "plan");
        assert_eq!(cache.content(&key).await.unwrap().as_deref(), Some("draft A"));

        // Mutate behind the cache's back: the stale entry serves until
        // invalidated, which is exactly the read-through contract.
        tree.write("alice", "work", "plan", "draft B").await.unwrap();
        assert_eq!(cache.content(&key).await.unwrap().as_deref(), Some("draft A"));

        cache.invalidate(&key).await;
        assert_eq!(cache.content(&key).await.unwrap().as_deref(), Some("draft B"));
    }

    #[tokio::test]
    async fn test_absent_note_is_none_not_cached() {
        let dir = TempDir::new().unwrap();
        let (cache, tree) = cache_over(&dir);
        let key = NoteKey::new("alice", "work", "ghost");

        assert_eq!(cache.content(&key).await.unwrap(), None);
        assert_eq!(cache.preview(&key).await.unwrap(), None);

        // Appearing later must be visible: negatives were not cached.
        tree.write("alice", "work", "ghost", "now real").await.unwrap();
        assert_eq!(
            cache.content(&key).await.unwrap().as_deref(),
            Some("now real")
        );
    }

    #[tokio::test]
    async fn test_empty_note_distinct_from_absent() {
        let dir = TempDir::new().unwrap();
        let (cache, tree) = cache_over(&dir);
        tree.write("alice", "work", "blank", "").await.unwrap();

        let key = NoteKey::new("alice", "work", "blank");
        assert_eq!(cache.content(&key).await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_invalidate_during_miss_load_discards_the_late_insert() {
        use std::future::Future;
        use std::task::{Context, Poll, Waker};

        let dir = TempDir::new().unwrap();
        let (cache, tree) = cache_over(&dir);
        tree.write("alice", "work", "plan", "draft A").await.unwrap();
        let key = NoteKey::new("alice", "work", "plan");

        // Park a miss load mid-read: one poll dispatches the disk read,
        // then the file changes and the key is invalidated underneath it.
        let mut read = Box::pin(cache.content(&key));
        let mut cx = Context::from_waker(Waker::noop());
        let early = match read.as_mut().poll(&mut cx) {
            Poll::Ready(result) => Some(result.unwrap()),
            Poll::Pending => None,
        };

        tree.write("alice", "work", "plan", "draft B").await.unwrap();
        cache.invalidate(&key).await;

        if early.is_none() {
            // The parked load finishes after the invalidation; whatever it
            // returns, its insert must not land in the cache.
            read.await.unwrap();
        }

        assert_eq!(cache.content(&key).await.unwrap().as_deref(), Some("draft B"));
    }

    #[tokio::test]
    async fn test_prime_serves_without_tree_read() {
        let dir = TempDir::new().unwrap();
        let (cache, _tree) = cache_over(&dir);
        let key = NoteKey::new("alice", "work", "moved");

        // No file on disk at all: a primed entry must still serve.
        cache.prime(&key, "moved content").await;
        assert_eq!(
            cache.content(&key).await.unwrap().as_deref(),
            Some("moved content")
        );
        assert_eq!(
            cache.preview(&key).await.unwrap().as_deref(),
            Some("moved content")
        );
    }
}
