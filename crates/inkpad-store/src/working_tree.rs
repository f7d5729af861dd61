//! Working tree: the live on-disk layout of each owner's notebooks and notes.
//!
//! Layout: `{root}/{owner}/{notebook}/{title}.md`, plus a hidden
//! `.notebook` marker file inside each genuine notebook directory.
//! Directories without the marker are ignored by listing, even if they
//! contain note-like files.
//!
//! This layer does pure file operations and knows nothing about history;
//! every path it touches is committed (or not) by the caller.

use chrono::{DateTime, Utc};
use inkpad_core::defaults::{HISTORY_DIR, NOTEBOOK_MARKER, NOTE_EXTENSION};
use inkpad_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Filesystem working tree rooted at a single notes directory.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    /// Create a working tree over the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory for one owner's notebooks.
    pub fn owner_dir(&self, owner: &str) -> PathBuf {
        self.root.join(owner)
    }

    /// Directory of one notebook.
    pub fn notebook_dir(&self, owner: &str, notebook: &str) -> PathBuf {
        self.owner_dir(owner).join(notebook)
    }

    /// Full path of one note file.
    pub fn note_path(&self, owner: &str, notebook: &str, title: &str) -> PathBuf {
        self.notebook_dir(owner, notebook)
            .join(format!("{}.{}", title, NOTE_EXTENSION))
    }

    /// Validate that the root can be written, read, and cleaned up.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (overlayfs quirks, permission errors) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.root.join(".health-check");
        let test_file = test_dir.join("probe.md");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"working-tree-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_back = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_back != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }

    /// Names of the owner's notebooks: non-hidden directories carrying the
    /// `.notebook` marker. Empty when the owner has no directory yet.
    pub async fn list_notebooks(&self, owner: &str) -> Result<Vec<String>> {
        let dir = self.owner_dir(owner);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if !path_exists(&entry.path().join(NOTEBOOK_MARKER)).await {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// Note files in one notebook as `(title, last_modified)`, newest-first
    /// by modification time. Only files with the recognized extension count.
    ///
    /// Fails with `NotFound` when the notebook directory is absent or is a
    /// plain file.
    pub async fn list_note_files(
        &self,
        owner: &str,
        notebook: &str,
    ) -> Result<Vec<(String, DateTime<Utc>)>> {
        let dir = self.notebook_dir(owner, notebook);
        let meta = match fs::metadata(&dir).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("notebook {}", notebook)));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(Error::NotFound(format!("notebook {}", notebook)));
        }

        let mut entries = fs::read_dir(&dir).await?;
        let mut notes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(title) = note_title(&name) else {
                continue;
            };
            let modified = entry.metadata().await?.modified()?;
            notes.push((title, DateTime::<Utc>::from(modified)));
        }
        // Newest first; title as a stable secondary key for equal mtimes.
        notes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(notes)
    }

    /// Read one note's content. `NotFound` when the file is missing.
    pub async fn read(&self, owner: &str, notebook: &str, title: &str) -> Result<String> {
        let path = self.note_path(owner, notebook, title);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("note {}/{}", notebook, title)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create or overwrite one note file, creating parent directories.
    pub async fn write(
        &self,
        owner: &str,
        notebook: &str,
        title: &str,
        content: &str,
    ) -> Result<()> {
        let path = self.note_path(owner, notebook, title);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        debug!(path = %path.display(), size = content.len(), "working_tree: write");
        fs::write(&path, content).await?;
        Ok(())
    }

    /// Delete one note file. Returns whether a file was actually removed.
    pub async fn delete(&self, owner: &str, notebook: &str, title: &str) -> Result<bool> {
        let path = self.note_path(owner, notebook, title);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether one note file exists.
    pub async fn note_exists(&self, owner: &str, notebook: &str, title: &str) -> bool {
        path_exists(&self.note_path(owner, notebook, title)).await
    }

    /// Whether a genuine notebook (directory + marker) exists.
    pub async fn notebook_exists(&self, owner: &str, notebook: &str) -> bool {
        path_exists(&self.notebook_dir(owner, notebook).join(NOTEBOOK_MARKER)).await
    }

    /// Idempotently create a notebook: directory plus marker file, as one
    /// logical step. Returns whether anything was created.
    ///
    /// If the marker write fails after the directory was created, the
    /// directory is removed again so no orphan half-notebook is left behind
    /// for later listing. A pre-existing directory missing its marker is
    /// treated as a half-created notebook and healed by rewriting the marker.
    pub async fn ensure_notebook(&self, owner: &str, notebook: &str) -> Result<bool> {
        let dir = self.notebook_dir(owner, notebook);
        let marker = dir.join(NOTEBOOK_MARKER);

        if path_exists(&dir).await {
            if path_exists(&marker).await {
                return Ok(false);
            }
            warn!(notebook, "working_tree: healing half-created notebook");
            fs::write(&marker, b"").await?;
            return Ok(true);
        }

        fs::create_dir_all(&dir).await?;
        if let Err(e) = fs::write(&marker, b"").await {
            // Marker write failed: roll the directory back so the notebook
            // never partially exists.
            let _ = fs::remove_dir_all(&dir).await;
            return Err(e.into());
        }
        debug!(owner, notebook, "working_tree: notebook created");
        Ok(true)
    }

    /// Remove a notebook directory and everything under it.
    ///
    /// Callers are expected to have deleted (and committed) the contained
    /// notes first; this only tears down the directory and marker.
    pub async fn remove_notebook_dir(&self, owner: &str, notebook: &str) -> Result<()> {
        let dir = self.notebook_dir(owner, notebook);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("notebook {}", notebook)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the raw bytes of a path relative to an owner's root.
    /// Used by the version log to stage on-disk state.
    pub async fn read_relative(&self, owner: &str, rel_path: &str) -> Result<Vec<u8>> {
        let path = self.owner_dir(owner).join(rel_path);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(rel_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write raw bytes to a path relative to an owner's root, creating
    /// parent directories. Used by the version log for restores.
    pub async fn write_relative(&self, owner: &str, rel_path: &str, bytes: &[u8]) -> Result<()> {
        let path = self.owner_dir(owner).join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(())
    }

    /// Per-owner directory holding the version-history log. Hidden, so it is
    /// never picked up by notebook listing.
    pub fn history_dir(&self, owner: &str) -> PathBuf {
        self.owner_dir(owner).join(HISTORY_DIR)
    }
}

/// Title stem of a recognized note filename, or `None` for anything else.
/// The extension matches case-insensitively ("md", "MD", "Md", "mD").
fn note_title(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || !ext.eq_ignore_ascii_case(NOTE_EXTENSION) {
        return None;
    }
    Some(stem.to_string())
}

async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_title_recognized_extensions() {
        assert_eq!(note_title("plan.md"), Some("plan".to_string()));
        assert_eq!(note_title("plan.MD"), Some("plan".to_string()));
        assert_eq!(note_title("plan.Md"), Some("plan".to_string()));
        assert_eq!(note_title("plan.txt"), None);
        assert_eq!(note_title("plan"), None);
        assert_eq!(note_title(".md"), None);
    }

    #[test]
    fn test_note_title_keeps_inner_dots() {
        assert_eq!(note_title("v1.2-notes.md"), Some("v1.2-notes".to_string()));
    }
}
