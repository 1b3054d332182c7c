//! # Persistence Façade
//!
//! The only externally visible surface of the engine. [`StashEngine`]
//! composes validation, migration, the backup ring, and the error/retry
//! policy into two operations: [`StashEngine::load`] and
//! [`StashEngine::save`].
//!
//! ## Host abstraction
//!
//! Actual I/O belongs to the host behind the [`HostStorage`] trait:
//! - [`fs::FileHost`]: production file-backed record storage
//! - [`memory::MemoryHost`]: in-memory storage with failure injection,
//!   for tests
//!
//! ## Load pipeline
//!
//! ```text
//! host read ──► migrate (declared version, default 0)
//!           ──► typed parse + schema predicate
//!           ──► Loaded(data)
//!     read or validation failure
//!           ──► backup ring recovery ──► Recovered(data, reason)
//!     nothing recoverable
//!           ──► Defaulted(reason)
//! ```
//!
//! The three-way outcome is ordinary control flow, not exception chaining:
//! callers get a [`Resolution`] tag alongside the data and migration info.
//! Host I/O failures never propagate out of `load` — they are classified,
//! logged, and converted into a safe fallback. `save` is the one operation
//! that returns an error, since the caller owns the retry-vs-abort call.

use crate::backup;
use crate::error::{Result, StashError};
use crate::migrate::{self, MigrationInfo};
use crate::model::{PluginData, CURRENT_VERSION};
use crate::report::{ErrorCategory, ErrorLog, NoticeSink, Reporter};
use crate::retry::{with_retry, RetryConfig};
use crate::validate;
use chrono::Utc;
use serde_json::{json, Value};

pub mod fs;
pub mod memory;

/// Abstract host storage: one opaque record, read and written wholesale.
///
/// `read` returns `Ok(None)` for an empty or missing store. Failures from
/// these two methods are the sole origin of "load failed"/"save failed"
/// reports.
pub trait HostStorage {
    fn read(&self) -> Result<Option<Value>>;
    fn write(&mut self, record: &Value) -> Result<()>;
}

/// How the loaded data was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The stored record was used as-is (after any migration).
    Loaded,
    /// The stored record was unusable; a backup ring entry was restored.
    Recovered { reason: String },
    /// Nothing usable was found; built-in defaults were returned.
    Defaulted { reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadResult {
    pub data: PluginData,
    pub migration: MigrationInfo,
    pub resolution: Resolution,
}

/// The persistence engine. Generic over [`HostStorage`] so tests run
/// against [`memory::MemoryHost`] while production uses [`fs::FileHost`].
///
/// Single-writer by contract: callers serialize `load`/`save` themselves
/// and coalesce bursts of saves upstream (e.g. debounce-on-idle).
pub struct StashEngine<H: HostStorage> {
    host: H,
    reporter: Reporter,
    retry: RetryConfig,
    /// Last known-good raw record, used for ring recovery when a fresh
    /// host read fails outright.
    last_record: Option<Value>,
}

impl<H: HostStorage> StashEngine<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            reporter: Reporter::new(),
            retry: RetryConfig::default(),
            last_record: None,
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_notice_sink(mut self, sink: Box<dyn NoticeSink>) -> Self {
        self.reporter.set_sink(sink);
        self
    }

    /// Handled failures for this engine instance, newest last.
    pub fn error_log(&self) -> &ErrorLog {
        self.reporter.log()
    }

    /// Loads the record, migrating and validating it, falling back to ring
    /// recovery and finally to defaults. Never returns an error.
    pub fn load(&mut self) -> LoadResult {
        let raw = with_retry(&self.retry, || self.host.read());

        let raw = match raw {
            Ok(raw) => raw,
            Err(err) => {
                self.reporter.handle(
                    &err,
                    ErrorCategory::Api,
                    Some(&json!({ "operation": "load" })),
                );
                let container = self.last_record.clone();
                return self.recover_or_default(
                    container.as_ref(),
                    "reading the stored record failed",
                );
            }
        };

        let raw = match raw {
            Some(raw) => raw,
            None => {
                log::debug!("no stored record; starting from defaults");
                return LoadResult {
                    data: PluginData::defaults(),
                    migration: MigrationInfo::unchanged(),
                    resolution: Resolution::Defaulted {
                        reason: "no stored record".to_string(),
                    },
                };
            }
        };

        let declared = raw.get("version").and_then(Value::as_u64);
        let migrated = migrate::migrate(raw.clone(), declared);

        // Two-stage gate: the typed parse rejects structural garbage, the
        // predicate independently enforces the semantic rules.
        if validate::is_plugin_data(&migrated.data) {
            if let Ok(data) = serde_json::from_value::<PluginData>(migrated.data.clone()) {
                if migrated.info.migrated {
                    log::debug!(
                        "record migrated from v{} to v{}",
                        migrated.info.from_version.unwrap_or(0),
                        migrated.info.to_version
                    );
                }
                self.last_record = Some(migrated.data);
                return LoadResult {
                    data,
                    migration: migrated.info,
                    resolution: Resolution::Loaded,
                };
            }
        }

        self.reporter.handle(
            &"stored record failed schema validation",
            ErrorCategory::Data,
            Some(&json!({ "declaredVersion": declared })),
        );
        let mut result = self.recover_or_default(Some(&raw), "stored record failed validation");
        let mut warnings = migrated.info.warnings;
        warnings.append(&mut result.migration.warnings);
        result.migration.warnings = warnings;
        result
    }

    /// Validates, snapshots a backup of the input, stamps the current
    /// schema version, and writes through the host. Invalid input is
    /// rejected before any I/O.
    pub fn save(&mut self, data: &PluginData) -> Result<()> {
        let as_value = serde_json::to_value(data)?;
        if !validate::is_plugin_data(&as_value) {
            let context = json!({
                "dataVersion": data.version.unwrap_or(0),
                "existingBackupsCount": data.backups.as_ref().map(Vec::len).unwrap_or(0),
            });
            self.reporter.handle(
                &"refusing to save a record that fails schema validation",
                ErrorCategory::Data,
                Some(&context),
            );
            return Err(StashError::Validation(
                "record failed schema validation before save".to_string(),
            ));
        }

        let mut stamped = data.clone();
        stamped.backups = Some(backup::create_backup(data, Utc::now().timestamp_millis()));
        stamped.version = Some(CURRENT_VERSION);
        let record = serde_json::to_value(&stamped)?;

        match with_retry(&self.retry, || self.host.write(&record)) {
            Ok(()) => {
                log::debug!("record saved at schema v{}", CURRENT_VERSION);
                self.last_record = Some(record);
                Ok(())
            }
            Err(err) => {
                self.reporter.handle(
                    &err,
                    ErrorCategory::Api,
                    Some(&json!({ "operation": "save" })),
                );
                Err(err)
            }
        }
    }

    fn recover_or_default(&mut self, container: Option<&Value>, reason: &str) -> LoadResult {
        if let Some(recovered) = container.and_then(backup::attempt_recovery) {
            log::warn!("{}; restored the newest valid backup", reason);
            if let Ok(record) = serde_json::to_value(&recovered) {
                self.last_record = Some(record);
            }
            return LoadResult {
                data: recovered,
                migration: MigrationInfo {
                    migrated: true,
                    from_version: None,
                    to_version: CURRENT_VERSION,
                    warnings: vec![format!("{}; restored from backup", reason)],
                },
                resolution: Resolution::Recovered {
                    reason: reason.to_string(),
                },
            };
        }

        log::warn!("{}; no valid backup found, using defaults", reason);
        LoadResult {
            data: PluginData::defaults(),
            migration: MigrationInfo {
                migrated: false,
                from_version: None,
                to_version: CURRENT_VERSION,
                warnings: vec![format!("{}; reset to defaults", reason)],
            },
            resolution: Resolution::Defaulted {
                reason: reason.to_string(),
            },
        }
    }
}
