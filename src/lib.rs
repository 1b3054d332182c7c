//! # Cardstash Architecture
//!
//! Cardstash is the **persistence engine** for a note-browsing card grid:
//! it keeps one user-preferences-and-view-state record trustworthy across
//! sessions, under a host that owns the actual file I/O. The rendering,
//! filter panel, and tag matching live elsewhere — they are consumers of
//! this engine, never participants in its internals.
//!
//! ## The Resilience Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence Façade (store/)                                │
//! │  - StashEngine: load() / save(), the only public surface    │
//! │  - HostStorage trait: FileHost (prod), MemoryHost (tests)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Migration Pipeline (migrate)                               │
//! │  - Upgrades old-version records step by step                │
//! │  - Collects warnings; never trusted without re-validation   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Schema Validator (validate)                                │
//! │  - Typed parse first, narrowing predicates second           │
//! │  - Pure, total, never panics on hostile input               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Backup Ring (backup) + Error/Retry Policy (report, retry)  │
//! │  - Bounded newest-first snapshots, scanned for recovery     │
//! │  - Categorized reporting, exponential-backoff retries       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Nothing Escalates Past the Façade
//!
//! Validation failures are booleans, never panics. Migration problems are
//! warnings carried in the result. Host I/O failures are classified,
//! logged, and converted into ring recovery or built-in defaults. The one
//! error a caller sees is a failed `save` (after retries), because the
//! retry-vs-abort decision belongs above this layer.
//!
//! ## Concurrency Contract
//!
//! Single logical writer, no internal locking. Validation and migration
//! are synchronous and side-effect-free; the retry helper is the only code
//! that voluntarily suspends. The backup ring is copy-on-write — every
//! mutation builds a new list, so callers sharing a record never alias.
//!
//! ## Module Overview
//!
//! - [`store`]: the façade — `StashEngine`, `HostStorage`, backends
//! - [`model`]: the record types and their documented defaults
//! - [`validate`]: narrowing predicates over untyped input
//! - [`migrate`]: versioned migration steps
//! - [`backup`]: rolling snapshot ring and recovery scan
//! - [`report`]: error taxonomy, user copy, bounded error log
//! - [`retry`]: exponential-backoff retry with permanent-failure detection
//! - [`error`]: error types

pub mod backup;
pub mod error;
pub mod migrate;
pub mod model;
pub mod report;
pub mod retry;
pub mod store;
pub mod validate;

pub use error::{Result, StashError};
pub use migrate::MigrationInfo;
pub use model::{
    BackupEntry, DateFilter, DateFilterKind, DateFilterValue, FilterState, PluginData,
    PluginSettings, SortConfig, SortOrder, CURRENT_VERSION, MAX_BACKUPS,
};
pub use report::{ErrorCategory, ErrorInfo, ErrorLog, NoticeSink};
pub use retry::{with_retry, RetryConfig};
pub use store::{fs::FileHost, memory::MemoryHost, HostStorage, LoadResult, Resolution, StashEngine};
