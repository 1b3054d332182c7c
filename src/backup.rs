//! Rolling backup ring.
//!
//! Every successful save snapshots the record being written into a bounded,
//! newest-first ring carried inside the record itself. Recovery scans the
//! ring for the newest entry whose payload still validates on its own.
//!
//! The ring is copy-on-write throughout: no function here mutates its
//! input, so callers holding a reference to the same record never observe
//! aliased changes.

use crate::model::{BackupEntry, PluginData, MAX_BACKUPS};
use crate::validate;
use serde_json::Value;

/// Field-by-field copy of a record for storage in the ring, with its own
/// ring stripped so entries stay flat and self-restorable. The schema is
/// closed — every field is plain data — so this cannot fail.
pub fn snapshot(data: &PluginData) -> PluginData {
    PluginData {
        pinned_notes: data.pinned_notes.clone(),
        last_filters: data.last_filters.clone(),
        sort_config: data.sort_config.clone(),
        version: data.version,
        backups: None,
        settings: data.settings.clone(),
    }
}

/// Builds the ring that should accompany the next write: a new entry for
/// `data` (stamped `now_ms` and the record's version, default 0) prepended
/// to the record's existing ring, truncated to [`MAX_BACKUPS`] with the
/// oldest entries dropped.
pub fn create_backup(data: &PluginData, now_ms: i64) -> Vec<BackupEntry> {
    let entry = BackupEntry {
        timestamp: now_ms,
        version: data.version.unwrap_or(0),
        data: snapshot(data),
    };

    let mut ring = Vec::with_capacity(MAX_BACKUPS);
    ring.push(entry);
    if let Some(existing) = &data.backups {
        ring.extend(existing.iter().take(MAX_BACKUPS - 1).cloned());
    }
    ring
}

/// Scans a raw record's ring, newest first, for the first entry whose
/// payload independently passes the schema predicate. Malformed entries are
/// skipped; a missing, empty, or fully corrupt ring yields `None`.
pub fn attempt_recovery(container: &Value) -> Option<PluginData> {
    let entries = container.get("backups")?.as_array()?;
    for entry in entries {
        let payload = match entry.get("data") {
            Some(p) => p,
            None => continue,
        };
        if !validate::is_plugin_data_restricted(payload) {
            continue;
        }
        if let Ok(data) = serde_json::from_value::<PluginData>(payload.clone()) {
            return Some(data);
        }
    }
    None
}
