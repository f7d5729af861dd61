//! Store configuration.
//!
//! Constructed once at process start and handed to [`NoteStore::new`];
//! nothing in the store reads ambient/static state. Cache eviction bounds
//! live here so operators can see and tune them in one place.
//!
//! Environment variables (read by [`StoreConfig::from_env`]):
//! - `INKPAD_ROOT`: notes root directory (default: `./notes`)
//! - `INKPAD_CACHE_CAPACITY`: max entries in the content cache
//! - `INKPAD_CACHE_TTL`: cache time-to-idle in seconds
//!
//! [`NoteStore::new`]: crate::store::NoteStore::new

use std::path::PathBuf;

use inkpad_core::defaults::{
    CACHE_TTL_SECONDS, CONTENT_CACHE_CAPACITY, PREVIEW_CACHE_CAPACITY, PREVIEW_MAX_CHARS,
};
use tracing::info;

/// Configuration for a [`NoteStore`](crate::store::NoteStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory holding every owner's tree.
    pub root_dir: PathBuf,
    /// Maximum entries in the full-content cache.
    pub content_cache_capacity: u64,
    /// Maximum entries in the preview cache.
    pub preview_cache_capacity: u64,
    /// Time-to-idle for cache entries, in seconds.
    pub cache_ttl_seconds: u64,
    /// Maximum characters carried into a preview.
    pub preview_max_chars: usize,
}

impl StoreConfig {
    /// Config with defaults over the given root directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            content_cache_capacity: CONTENT_CACHE_CAPACITY,
            preview_cache_capacity: PREVIEW_CACHE_CAPACITY,
            cache_ttl_seconds: CACHE_TTL_SECONDS,
            preview_max_chars: PREVIEW_MAX_CHARS,
        }
    }

    /// Config from environment variables, with defaults for anything unset
    /// or unparseable.
    pub fn from_env() -> Self {
        let root_dir = std::env::var("INKPAD_ROOT").unwrap_or_else(|_| "./notes".to_string());

        let mut config = Self::new(root_dir);

        if let Some(capacity) = std::env::var("INKPAD_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.content_cache_capacity = capacity;
        }
        if let Some(ttl) = std::env::var("INKPAD_CACHE_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.cache_ttl_seconds = ttl;
        }

        info!(
            root = %config.root_dir.display(),
            capacity = config.content_cache_capacity,
            ttl_s = config.cache_ttl_seconds,
            "store config loaded"
        );
        config
    }
}
