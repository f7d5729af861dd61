//! Structured logging field name constants for the inkpad note store.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation tools can query by standardized field names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Working tree and history diverged, requires operator attention |
//! | WARN  | Recoverable issue, operation failed cleanly |
//! | INFO  | Operation completions (save, delete, recover, move) |
//! | DEBUG | Cache hits/misses, commit appends, config choices |
//! | TRACE | Per-item iteration (listing rows, search candidates) |

/// Owner whose tree/log the operation targets.
pub const OWNER: &str = "owner";

/// Notebook name within the owner's tree.
pub const NOTEBOOK: &str = "notebook";

/// Note title (filename stem).
pub const TITLE: &str = "title";

/// Logical operation name.
/// Examples: "save_note", "delete_note", "move_note", "search"
pub const OPERATION: &str = "op";

/// Version ref produced or consumed by the operation.
pub const VERSION_REF: &str = "version_ref";

/// Path relative to the owner root, e.g. "work/plan.md".
pub const REL_PATH: &str = "rel_path";

/// Tombstone id for recover/purge operations.
pub const TOMBSTONE_ID: &str = "tombstone_id";

/// Number of results returned by a listing or search.
pub const RESULT_COUNT: &str = "result_count";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";
