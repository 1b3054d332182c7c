//! Versioned migration pipeline.
//!
//! Records written by older builds are upgraded step by step, in ascending
//! version order, to [`CURRENT_VERSION`]. Each step is a pure function of
//! the older shape producing the newer shape plus warnings. The pipeline
//! never promises a valid result — the caller re-runs the schema predicate
//! on the output.

use crate::model::{FilterState, SortConfig, CURRENT_VERSION};
use serde_json::{Map, Value};

/// What the pipeline did, carried alongside the (possibly unchanged) data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfo {
    pub migrated: bool,
    pub from_version: Option<u64>,
    pub to_version: u64,
    pub warnings: Vec<String>,
}

impl MigrationInfo {
    pub fn unchanged() -> Self {
        Self {
            migrated: false,
            from_version: None,
            to_version: CURRENT_VERSION,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Migrated {
    pub data: Value,
    pub info: MigrationInfo,
}

/// Runs the pipeline on a raw record declaring `declared_version`
/// (`None` means a legacy, pre-versioning record — treated as version 0).
///
/// A record declaring a version at or beyond the current one is passed
/// through unchanged: equal means nothing to do, newer means we refuse to
/// guess at forward translation. The declared version is kept at full
/// `u64` width so an oversized tag compares as newer instead of wrapping.
pub fn migrate(raw: Value, declared_version: Option<u64>) -> Migrated {
    let from = declared_version.unwrap_or(0);
    if from >= CURRENT_VERSION {
        return Migrated {
            data: raw,
            info: MigrationInfo::unchanged(),
        };
    }

    let mut data = raw;
    let mut warnings = Vec::new();
    let mut version = from;
    while version < CURRENT_VERSION {
        let (next, mut step_warnings) = match version {
            0 => migrate_v0_to_v1(data),
            // Steps are added here as the schema evolves; an unknown gap
            // means a bug in CURRENT_VERSION bookkeeping.
            _ => (data, Vec::new()),
        };
        data = next;
        warnings.append(&mut step_warnings);
        version += 1;
    }

    Migrated {
        data,
        info: MigrationInfo {
            migrated: true,
            from_version: Some(from),
            to_version: CURRENT_VERSION,
            warnings,
        },
    }
}

/// v0 → v1: legacy records predate both the version tag and guaranteed
/// field presence. Missing fields are filled from defaults, a wrong-typed
/// pinned list is replaced wholesale, and a pinned list with stray
/// non-string elements is repaired by dropping them.
fn migrate_v0_to_v1(raw: Value) -> (Value, Vec<String>) {
    let mut warnings = Vec::new();
    let mut obj = match raw {
        Value::Object(obj) => obj,
        _ => {
            warnings.push("legacy record was not an object; rebuilt from defaults".to_string());
            Map::new()
        }
    };

    match obj.get_mut("pinnedNotes") {
        None => {
            obj.insert("pinnedNotes".to_string(), Value::Array(Vec::new()));
        }
        Some(Value::Array(items)) => {
            items.retain(Value::is_string);
        }
        Some(other) => {
            warnings.push(
                "pinnedNotes had an unexpected type and was reset to an empty list".to_string(),
            );
            *other = Value::Array(Vec::new());
        }
    }

    merge_over_default(
        &mut obj,
        "lastFilters",
        default_value_for(&FilterState::default()),
    );
    merge_over_default(
        &mut obj,
        "sortConfig",
        default_value_for(&SortConfig::default()),
    );

    obj.insert("version".to_string(), Value::from(CURRENT_VERSION));
    (Value::Object(obj), warnings)
}

/// Shallow-merges a stored object over its default shape: default fields
/// first, stored fields win. A missing or non-object stored value is
/// replaced by the default outright.
fn merge_over_default(obj: &mut Map<String, Value>, key: &str, default: Value) {
    let merged = match obj.remove(key) {
        Some(Value::Object(stored)) => {
            let mut base = match default {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            for (k, v) in stored {
                base.insert(k, v);
            }
            Value::Object(base)
        }
        _ => default,
    };
    obj.insert(key.to_string(), merged);
}

fn default_value_for<T: serde::Serialize>(value: &T) -> Value {
    // The typed defaults are plain data; serializing them cannot fail.
    serde_json::to_value(value).unwrap_or(Value::Null)
}
