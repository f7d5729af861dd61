//! Content-addressed append-only version log, one per owner.
//!
//! Layout under `{root}/{owner}/.history/`:
//! - `objects/{first-2-hex}/{sha256}.bin`: content blobs, deduplicated by
//!   hash (identical content is stored once no matter how many commits
//!   reference it)
//! - `commits.jsonl`: the commit sequence, one serialized record per line,
//!   append-only
//!
//! Every user-visible mutation of a note path maps to exactly one commit,
//! appended after the filesystem write it describes. The log is never
//! rewritten: restores and recoveries append new commits. If a commit append
//! fails after the working tree was already mutated, the error surfaces as
//! `Error::Commit` and the working tree is deliberately left ahead of
//! history so the divergence stays detectable.

use chrono::{DateTime, Utc};
use inkpad_core::{Error, NoteVersion, Result, VersionRef};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::working_tree::WorkingTree;

/// One recorded change to an owner's tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitOp {
    /// Path now has the content addressed by `blob` (create or overwrite).
    Add { path: String, blob: String },
    /// Path was removed from the tree.
    Remove { path: String },
    /// Path `src` was renamed to `dst`, carrying the content at `blob`.
    Move {
        src: String,
        dst: String,
        blob: String,
    },
}

impl CommitOp {
    /// Whether this commit touches the given relative path.
    fn touches(&self, rel_path: &str) -> bool {
        match self {
            CommitOp::Add { path, .. } | CommitOp::Remove { path } => path == rel_path,
            CommitOp::Move { src, dst, .. } => src == rel_path || dst == rel_path,
        }
    }
}

/// One line of `commits.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommitRecord {
    r#ref: String,
    seq: u64,
    timestamp: DateTime<Utc>,
    author: String,
    op: CommitOp,
}

/// Append-only commit history over a working tree.
#[derive(Debug, Clone)]
pub struct VersionLog {
    tree: WorkingTree,
}

impl VersionLog {
    pub fn new(tree: WorkingTree) -> Self {
        Self { tree }
    }

    /// Stage the current on-disk state of `rel_path` and commit it.
    pub async fn add_and_commit(&self, owner: &str, rel_path: &str) -> Result<VersionRef> {
        let bytes = self.tree.read_relative(owner, rel_path).await?;
        let blob = self.store_blob(owner, &bytes).await?;
        self.append(
            owner,
            CommitOp::Add {
                path: rel_path.to_string(),
                blob,
            },
        )
        .await
    }

    /// Record the removal of `rel_path` as one commit.
    pub async fn rm_and_commit(&self, owner: &str, rel_path: &str) -> Result<VersionRef> {
        self.append(
            owner,
            CommitOp::Remove {
                path: rel_path.to_string(),
            },
        )
        .await
    }

    /// Record a rename as one commit. The destination file must already hold
    /// the moved content on disk.
    pub async fn mv_and_commit(
        &self,
        owner: &str,
        src_path: &str,
        dst_path: &str,
    ) -> Result<VersionRef> {
        let bytes = self.tree.read_relative(owner, dst_path).await?;
        let blob = self.store_blob(owner, &bytes).await?;
        self.append(
            owner,
            CommitOp::Move {
                src: src_path.to_string(),
                dst: dst_path.to_string(),
                blob,
            },
        )
        .await
    }

    /// Latest ref touching `rel_path`, or `None` if never committed.
    pub async fn current_ref(&self, owner: &str, rel_path: &str) -> Result<Option<VersionRef>> {
        let commits = self.load_commits(owner).await?;
        Ok(commits
            .iter()
            .rev()
            .find(|c| c.op.touches(rel_path))
            .map(|c| VersionRef(c.r#ref.clone())))
    }

    /// Full history of `rel_path`, newest-first.
    pub async fn history(&self, owner: &str, rel_path: &str) -> Result<Vec<NoteVersion>> {
        let commits = self.load_commits(owner).await?;
        Ok(commits
            .iter()
            .rev()
            .filter(|c| c.op.touches(rel_path))
            .map(|c| NoteVersion {
                r#ref: VersionRef(c.r#ref.clone()),
                timestamp: c.timestamp,
                author: c.author.clone(),
            })
            .collect())
    }

    /// Restore the working-tree content of `rel_path` to its state as of
    /// `version_ref`, then commit the restoration as a new change.
    ///
    /// History only grows; the restored state gets a fresh ref. Fails with
    /// `NotFound` when the ref is unknown or the path had no content at it
    /// (e.g. it was already removed).
    pub async fn reset_and_commit(
        &self,
        owner: &str,
        rel_path: &str,
        version_ref: &VersionRef,
    ) -> Result<VersionRef> {
        let blob = self.blob_at(owner, rel_path, version_ref).await?;
        let bytes = self.read_blob(owner, &blob).await?;
        self.tree.write_relative(owner, rel_path, &bytes).await?;
        self.append(
            owner,
            CommitOp::Add {
                path: rel_path.to_string(),
                blob,
            },
        )
        .await
    }

    /// Restore a path that currently does not exist, from a ref at which it
    /// did, writing it back into the working tree and committing.
    ///
    /// Same mechanics as [`reset_and_commit`](Self::reset_and_commit); kept
    /// as its own operation because recovery refs come from tombstones, not
    /// from browsing live history.
    pub async fn recover_deleted(
        &self,
        owner: &str,
        rel_path: &str,
        version_ref: &VersionRef,
    ) -> Result<VersionRef> {
        self.reset_and_commit(owner, rel_path, version_ref).await
    }

    /// Content blob the path held at `version_ref`: replay commits up to and
    /// including the ref, tracking the path's last assigned blob.
    async fn blob_at(
        &self,
        owner: &str,
        rel_path: &str,
        version_ref: &VersionRef,
    ) -> Result<String> {
        let commits = self.load_commits(owner).await?;
        let mut state: Option<String> = None;
        let mut seen_ref = false;
        for commit in &commits {
            match &commit.op {
                CommitOp::Add { path, blob } if path == rel_path => {
                    state = Some(blob.clone());
                }
                CommitOp::Remove { path } if path == rel_path => {
                    state = None;
                }
                CommitOp::Move { src, dst, blob } => {
                    if src == rel_path {
                        state = None;
                    }
                    if dst == rel_path {
                        state = Some(blob.clone());
                    }
                }
                _ => {}
            }
            if commit.r#ref == version_ref.0 {
                seen_ref = true;
                break;
            }
        }
        if !seen_ref {
            return Err(Error::NotFound(format!("version ref {}", version_ref)));
        }
        state.ok_or_else(|| {
            Error::NotFound(format!("{} had no content at {}", rel_path, version_ref))
        })
    }

    /// Append one commit record. Any failure here is a commit failure: the
    /// working tree may already be ahead of history.
    async fn append(&self, owner: &str, op: CommitOp) -> Result<VersionRef> {
        let seq = match self.load_commits(owner).await {
            Ok(commits) => commits.last().map(|c| c.seq + 1).unwrap_or(0),
            Err(e) => return Err(Error::Commit(format!("{}: {}", op_path(&op), e))),
        };
        let timestamp = Utc::now();
        let r#ref = commit_ref(seq, &timestamp, owner, &op)
            .map_err(|e| Error::Commit(format!("{}: {}", op_path(&op), e)))?;

        let record = CommitRecord {
            r#ref: r#ref.clone(),
            seq,
            timestamp,
            author: owner.to_string(),
            op,
        };

        if let Err(e) = self.append_record(owner, &record).await {
            return Err(Error::Commit(format!(
                "{}: {}",
                op_path(&record.op),
                e
            )));
        }
        debug!(owner, seq, version_ref = %record.r#ref, "version_log: commit appended");
        Ok(VersionRef(r#ref))
    }

    async fn append_record(
        &self,
        owner: &str,
        record: &CommitRecord,
    ) -> std::result::Result<(), String> {
        let dir = self.tree.history_dir(owner);
        fs::create_dir_all(&dir).await.map_err(|e| e.to_string())?;
        let mut line = serde_json::to_string(record).map_err(|e| e.to_string())?;
        line.push('\n');
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("commits.jsonl"))
            .await
            .map_err(|e| e.to_string())?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| e.to_string())?;
        file.flush().await.map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn load_commits(&self, owner: &str) -> Result<Vec<CommitRecord>> {
        let path = self.tree.history_dir(owner).join("commits.jsonl");
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut commits = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            commits.push(serde_json::from_str::<CommitRecord>(line)?);
        }
        Ok(commits)
    }

    /// Store a content blob under its sha256 address. Identical content is
    /// written once; re-storing is a no-op.
    async fn store_blob(&self, owner: &str, bytes: &[u8]) -> Result<String> {
        let hash = hex::encode(Sha256::digest(bytes));
        let path = self.blob_path(owner, &hash);
        if fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(hash);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(hash)
    }

    async fn read_blob(&self, owner: &str, hash: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(owner, hash);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("blob {}", hash)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn blob_path(&self, owner: &str, hash: &str) -> std::path::PathBuf {
        self.tree
            .history_dir(owner)
            .join("objects")
            .join(&hash[..2])
            .join(format!("{}.bin", hash))
    }
}

fn op_path(op: &CommitOp) -> &str {
    match op {
        CommitOp::Add { path, .. } | CommitOp::Remove { path } => path,
        CommitOp::Move { dst, .. } => dst,
    }
}

/// Commit ref: sha256 over the commit payload (sequence, timestamp, author,
/// op). Unique per commit since the sequence number strictly increases.
fn commit_ref(
    seq: u64,
    timestamp: &DateTime<Utc>,
    author: &str,
    op: &CommitOp,
) -> std::result::Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(seq.to_be_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(author.as_bytes());
    hasher.update(serde_json::to_vec(op)?);
    Ok(hex::encode(hasher.finalize()))
}
