//! Centralized default constants for the inkpad note store.
//!
//! **This module is the single source of truth** for all shared default
//! values. Both crates reference these constants instead of defining their
//! own magic numbers.

// =============================================================================
// ON-DISK LAYOUT
// =============================================================================

/// Recognized note file extension (matched case-insensitively on listing).
pub const NOTE_EXTENSION: &str = "md";

/// Hidden marker file distinguishing a genuine notebook from an incidental
/// directory. Directories without it are ignored by listing.
pub const NOTEBOOK_MARKER: &str = ".notebook";

/// Hidden per-owner directory holding the version-history log.
pub const HISTORY_DIR: &str = ".history";

// =============================================================================
// CACHE
// =============================================================================

/// Maximum entries in the full-content cache.
pub const CONTENT_CACHE_CAPACITY: u64 = 1024;

/// Maximum entries in the preview cache. Listings touch many previews, so
/// this is sized larger than the content cache.
pub const PREVIEW_CACHE_CAPACITY: u64 = 4096;

/// Time-to-idle for cache entries, in seconds.
pub const CACHE_TTL_SECONDS: u64 = 600;

// =============================================================================
// PREVIEW
// =============================================================================

/// Maximum characters of content carried into a preview.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Suffix appended to a preview when the content was cut.
pub const PREVIEW_ELLIPSIS: &str = "…";
