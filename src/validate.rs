//! Narrowing predicates over untyped records.
//!
//! Everything the host hands back is treated as hostile until proven
//! otherwise. Each predicate takes a raw [`serde_json::Value`], returns a
//! plain `bool`, and never panics or propagates an error — a malformed value
//! is simply invalid.
//!
//! These predicates are the second stage of a two-stage pipeline: raw input
//! is first deserialized into the typed model (which rejects structurally
//! wrong input outright), then the predicate runs as an independent safety
//! net for the semantic rules serde cannot express — date parseability,
//! version integrality, backup self-restorability.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// True when `s` parses as a date: RFC 3339, `YYYY-MM-DDTHH:MM:SS`, or a
/// bare `YYYY-MM-DD`.
pub fn is_parseable_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Strict string-array check: rejects non-arrays and any non-string
/// element. No coercion.
pub fn is_string_array(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(Value::is_string),
        _ => false,
    }
}

/// Optional non-negative integer version tag. Floats, negatives, and
/// anything non-numeric are rejected.
pub fn is_version(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_u64(),
        _ => false,
    }
}

/// Date filter check. Absence is modeled as `null` and is valid; a present
/// filter needs a known type tag and a value that is either an
/// already-parsed millisecond epoch or a parseable date string.
pub fn is_date_filter(value: &Value) -> bool {
    let obj = match value {
        Value::Null => return true,
        Value::Object(obj) => obj,
        _ => return false,
    };
    let tag_ok = matches!(
        obj.get("type").and_then(Value::as_str),
        Some("within") | Some("after")
    );
    let value_ok = match obj.get("value") {
        // Epochs are kept in i64 range, matching the typed model
        Some(Value::Number(n)) => n.is_i64(),
        Some(Value::String(s)) => is_parseable_date(s),
        _ => false,
    };
    tag_ok && value_ok
}

pub fn is_sort_config(value: &Value) -> bool {
    let obj = match value {
        Value::Object(obj) => obj,
        _ => return false,
    };
    obj.get("key").map(Value::is_string).unwrap_or(false)
        && matches!(
            obj.get("order").and_then(Value::as_str),
            Some("asc") | Some("desc")
        )
}

pub fn is_filter_state(value: &Value) -> bool {
    let obj = match value {
        Value::Object(obj) => obj,
        _ => return false,
    };
    let required = obj.get("folders").map(is_string_array).unwrap_or(false)
        && obj.get("tags").map(is_string_array).unwrap_or(false)
        && obj.get("filename").map(Value::is_string).unwrap_or(false);
    let date_ok = obj.get("dateFilter").map(is_date_filter).unwrap_or(true);
    let excludes_ok = optional_string_array(obj.get("excludedFolders"))
        && optional_string_array(obj.get("excludedTags"));
    required && date_ok && excludes_ok
}

fn optional_string_array(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(v) => is_string_array(v),
    }
}

/// Settings are fully optional field-wise (defaults fill the gaps), but a
/// present field must carry the right type.
pub fn is_plugin_settings(value: &Value) -> bool {
    let obj = match value {
        Value::Object(obj) => obj,
        _ => return false,
    };
    obj.get("sortKey").map(Value::is_string).unwrap_or(true)
        && obj.get("autoStart").map(Value::is_boolean).unwrap_or(true)
        && obj
            .get("showInSidebar")
            .map(Value::is_boolean)
            .unwrap_or(true)
}

/// One backup ring entry: integer timestamp, integer version, and a `data`
/// payload that independently satisfies the restricted record predicate.
pub fn is_backup_entry(value: &Value) -> bool {
    let obj = match value {
        Value::Object(obj) => obj,
        _ => return false,
    };
    let timestamp_ok = obj
        .get("timestamp")
        .map(|v| v.as_i64().is_some())
        .unwrap_or(false);
    let version_ok = obj.get("version").map(is_version).unwrap_or(false);
    let data_ok = obj.get("data").map(is_plugin_data_restricted).unwrap_or(false);
    timestamp_ok && version_ok && data_ok
}

/// Full record predicate. Extra fields are tolerated for forward
/// compatibility; the required trio must be present and well-typed.
pub fn is_plugin_data(value: &Value) -> bool {
    plugin_data_shape(value, true)
}

/// Restricted variant used inside backup entries: identical to
/// [`is_plugin_data`] except that a nested `backups` field is rejected,
/// bounding recursion to one level.
pub fn is_plugin_data_restricted(value: &Value) -> bool {
    plugin_data_shape(value, false)
}

fn plugin_data_shape(value: &Value, allow_backups: bool) -> bool {
    let obj = match value {
        Value::Object(obj) => obj,
        _ => return false,
    };
    let required = obj.get("pinnedNotes").map(is_string_array).unwrap_or(false)
        && obj.get("lastFilters").map(is_filter_state).unwrap_or(false)
        && obj.get("sortConfig").map(is_sort_config).unwrap_or(false);
    let version_ok = match obj.get("version") {
        None => true,
        Some(v) => is_version(v),
    };
    let backups_ok = match obj.get("backups") {
        None | Some(Value::Null) => true,
        // Ring shape only; individual entries are re-checked during
        // recovery scans so one bad entry cannot sink the whole record.
        Some(Value::Array(_)) => allow_backups,
        Some(_) => false,
    };
    let settings_ok = match obj.get("settings") {
        None | Some(Value::Null) => true,
        Some(v) => is_plugin_settings(v),
    };
    required && version_ok && backups_ok && settings_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "pinnedNotes": ["a.md", "b.md"],
            "lastFilters": { "folders": [], "tags": ["#work"], "filename": "" },
            "sortConfig": { "key": "modified", "order": "desc" },
            "version": 1
        })
    }

    #[test]
    fn test_string_array() {
        assert!(is_string_array(&json!([])));
        assert!(is_string_array(&json!(["a", "b"])));
        assert!(!is_string_array(&json!("a")));
        assert!(!is_string_array(&json!(["a", 3])));
        assert!(!is_string_array(&json!(["a", null])));
        assert!(!is_string_array(&json!({ "0": "a" })));
    }

    #[test]
    fn test_version_tag() {
        assert!(is_version(&json!(0)));
        assert!(is_version(&json!(7)));
        assert!(!is_version(&json!(-1)));
        assert!(!is_version(&json!(1.5)));
        assert!(!is_version(&json!("1")));
        assert!(!is_version(&json!(null)));
    }

    #[test]
    fn test_date_filter_variants() {
        assert!(is_date_filter(&json!(null)));
        assert!(is_date_filter(
            &json!({ "type": "within", "value": "2026-01-15" })
        ));
        assert!(is_date_filter(
            &json!({ "type": "after", "value": "2026-01-15T10:30:00Z" })
        ));
        // Already-parsed epoch value
        assert!(is_date_filter(
            &json!({ "type": "after", "value": 1755000000000_i64 })
        ));
        // Out of i64 range: not representable as an epoch
        assert!(!is_date_filter(
            &json!({ "type": "after", "value": u64::MAX })
        ));
        assert!(!is_date_filter(
            &json!({ "type": "before", "value": "2026-01-15" })
        ));
        assert!(!is_date_filter(
            &json!({ "type": "within", "value": "not a date" })
        ));
        assert!(!is_date_filter(&json!({ "type": "within" })));
        assert!(!is_date_filter(&json!("within")));
    }

    #[test]
    fn test_filter_state() {
        assert!(is_filter_state(
            &json!({ "folders": ["inbox/"], "tags": [], "filename": "plan" })
        ));
        // dateFilter null is valid, garbage is not
        assert!(is_filter_state(
            &json!({ "folders": [], "tags": [], "filename": "", "dateFilter": null })
        ));
        assert!(!is_filter_state(
            &json!({ "folders": [], "tags": [], "filename": "", "dateFilter": 42 })
        ));
        assert!(!is_filter_state(&json!({ "folders": [], "tags": [] })));
        assert!(!is_filter_state(
            &json!({ "folders": "inbox/", "tags": [], "filename": "" })
        ));
    }

    #[test]
    fn test_plugin_data_accepts_extra_fields() {
        let mut record = valid_record();
        record["futureFeature"] = json!({ "anything": true });
        assert!(is_plugin_data(&record));
    }

    #[test]
    fn test_plugin_data_rejects_wrong_shapes() {
        assert!(!is_plugin_data(&json!(null)));
        assert!(!is_plugin_data(&json!([])));
        assert!(!is_plugin_data(&json!("record")));

        let mut record = valid_record();
        record["pinnedNotes"] = json!("not-an-array");
        assert!(!is_plugin_data(&record));

        let mut record = valid_record();
        record["version"] = json!(-2);
        assert!(!is_plugin_data(&record));
    }

    #[test]
    fn test_backup_entry_requires_restorable_data() {
        let entry = json!({
            "timestamp": 1755000000000_i64,
            "version": 1,
            "data": valid_record()
        });
        assert!(is_backup_entry(&entry));

        // Nested backups are excluded from ring entries
        let mut nested = valid_record();
        nested["backups"] = json!([]);
        let entry = json!({ "timestamp": 1, "version": 1, "data": nested });
        assert!(!is_backup_entry(&entry));

        assert!(!is_backup_entry(&json!(null)));
        assert!(!is_backup_entry(&json!({ "timestamp": "soon", "version": 1 })));
    }

    #[test]
    fn test_restricted_variant_bounds_recursion() {
        let mut record = valid_record();
        record["backups"] = json!([{ "timestamp": 1, "version": 0, "data": {} }]);
        assert!(is_plugin_data(&record));
        assert!(!is_plugin_data_restricted(&record));
    }
}
