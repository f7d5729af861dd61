//! # inkpad-store
//!
//! Versioned filesystem note store for inkpad.
//!
//! This crate provides:
//! - `WorkingTree`: the live on-disk layout of each owner's notebooks and notes
//! - `VersionLog`: a content-addressed append-only commit history per owner
//! - `NoteCache`: read-through, write-invalidated content and preview caches
//! - In-memory implementations of the tombstone and draft registries
//! - `NoteStore`: the orchestrating store composing all of the above
//!
//! ## Example
//!
//! ```rust,ignore
//! use inkpad_store::{NoteStore, StoreConfig};
//!
//! let store = NoteStore::new(StoreConfig::new("/var/inkpad/notes"));
//! store.save_note("alice", "work", "plan", "draft A").await?;
//! let content = store.get_note("alice", "work", "plan").await?;
//! assert_eq!(content, "draft A");
//! ```

pub mod cache;
pub mod config;
pub mod registry;
pub mod store;
pub mod version_log;
pub mod working_tree;

// Re-export core types
pub use inkpad_core::*;

pub use cache::NoteCache;
pub use config::StoreConfig;
pub use registry::{MemoryDeletedNoteRegistry, MemoryDraftRegistry};
pub use store::NoteStore;
pub use version_log::VersionLog;
pub use working_tree::WorkingTree;
