//! Data models for notebooks, notes, version history, and tombstones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cache/addressing key for one note: `(owner, notebook, title)`.
///
/// Owners never share keys; the same notebook/title under two owners are
/// distinct notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteKey {
    pub owner: String,
    pub notebook: String,
    pub title: String,
}

impl NoteKey {
    pub fn new(
        owner: impl Into<String>,
        notebook: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            notebook: notebook.into(),
            title: title.into(),
        }
    }

    /// Path of the note file relative to the owner's root, e.g. `work/plan.md`.
    pub fn relative_path(&self) -> String {
        format!(
            "{}/{}.{}",
            self.notebook,
            self.title,
            crate::defaults::NOTE_EXTENSION
        )
    }
}

impl std::fmt::Display for NoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}/{}", self.owner, self.notebook, self.title)
    }
}

/// One row of a notebook listing, newest-first by `last_modified`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub notebook: String,
    pub title: String,
    pub last_modified: DateTime<Utc>,
    /// Truncated content, filled only when the listing requested previews.
    pub preview: Option<String>,
}

/// One search result: the matched note with its full content and the total
/// number of keyword occurrences across title and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub note: NoteSummary,
    pub content: String,
    pub occurrences: usize,
}

/// Opaque pointer to one commit in an owner's history log.
///
/// Totally ordered by commit sequence within one owner's log; never shared
/// across owners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRef(pub String);

impl VersionRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a note's version history, newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteVersion {
    pub r#ref: VersionRef,
    pub timestamp: DateTime<Utc>,
    pub author: String,
}

/// Tombstone for a soft-deleted note: enough to list it in a trash view and
/// to recover it later.
///
/// Exists iff the note was deleted and not yet recovered or purged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedNote {
    pub id: Uuid,
    pub owner: String,
    pub notebook: String,
    pub title: String,
    /// Latest ref that touched the note's path before removal.
    pub last_ref: VersionRef,
    /// Content snapshot captured at deletion time.
    pub content: String,
}

impl DeletedNote {
    pub fn key(&self) -> NoteKey {
        NoteKey::new(&self.owner, &self.notebook, &self.title)
    }
}

/// Count non-overlapping occurrences of `needle` in `haystack`,
/// case-sensitively. Zero when `needle` is empty.
pub fn occurrence_count(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut start = 0;
    while let Some(idx) = haystack[start..].find(needle) {
        count += 1;
        start += idx + needle.len();
    }
    count
}
