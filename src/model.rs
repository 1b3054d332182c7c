use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Schema revision written by this build. Records tagged with an older
/// version are migrated on load; newer ones are passed through untouched.
pub const CURRENT_VERSION: u64 = 1;

/// Upper bound on the rolling backup ring carried inside the record.
pub const MAX_BACKUPS: usize = 3;

pub const DEFAULT_SORT_KEY: &str = "modified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: String,
    pub order: SortOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_SORT_KEY.to_string(),
            order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilterKind {
    Within,
    After,
}

/// A date filter's threshold: either the string the user entered (which
/// must parse as a date; see [`crate::validate::is_parseable_date`]) or an
/// already-parsed millisecond epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateFilterValue {
    Epoch(i64),
    Text(String),
}

/// Date-scoped filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    #[serde(rename = "type")]
    pub kind: DateFilterKind,
    pub value: DateFilterValue,
}

/// The filter panel's persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub folders: Vec<String>,
    pub tags: Vec<String>,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_filter: Option<DateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_folders: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_tags: Option<Vec<String>>,
}

/// Flat plugin settings. Every field carries a serde default so a partial
/// stored object merges field-wise with the documented defaults — after
/// load, settings are always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    #[serde(default = "default_sort_key")]
    pub sort_key: String,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_show_in_sidebar")]
    pub show_in_sidebar: bool,
}

fn default_sort_key() -> String {
    DEFAULT_SORT_KEY.to_string()
}

fn default_show_in_sidebar() -> bool {
    true
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            sort_key: default_sort_key(),
            auto_start: false,
            show_in_sidebar: default_show_in_sidebar(),
        }
    }
}

/// One snapshot in the backup ring.
///
/// Invariant: `data.backups` is always `None` — every entry is a flat,
/// self-restorable copy of a previously valid record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Millisecond epoch at snapshot time.
    pub timestamp: i64,
    /// Schema version the snapshot conformed to.
    pub version: u64,
    pub data: PluginData,
}

/// The single record the host loads and saves wholesale.
///
/// `pinnedNotes`, `lastFilters` and `sortConfig` are required on the wire;
/// everything else is optional and filled in (or tolerated) on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginData {
    pub pinned_notes: Vec<String>,
    pub last_filters: FilterState,
    pub sort_config: SortConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_backups",
        skip_serializing_if = "Option::is_none"
    )]
    pub backups: Option<Vec<BackupEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PluginSettings>,
}

/// Deserializes the backup ring, silently dropping entries that do not
/// parse. A half-corrupt ring must never reject the record that carries it;
/// entry-level validity is re-checked during recovery scans.
fn lenient_backups<'de, D>(deserializer: D) -> Result<Option<Vec<BackupEntry>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .filter_map(|e| serde_json::from_value(e).ok())
            .collect()
    }))
}

impl Default for PluginData {
    fn default() -> Self {
        Self {
            pinned_notes: Vec::new(),
            last_filters: FilterState::default(),
            sort_config: SortConfig::default(),
            version: Some(CURRENT_VERSION),
            backups: None,
            settings: None,
        }
    }
}

static DEFAULTS: Lazy<PluginData> = Lazy::new(PluginData::default);

impl PluginData {
    /// Fresh copy of the built-in defaults. Callers get an owned value, so
    /// mutating the result never leaks into later calls.
    pub fn defaults() -> Self {
        DEFAULTS.clone()
    }

    /// Settings merged with defaults; never partial.
    pub fn settings(&self) -> PluginSettings {
        self.settings.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_shape() {
        let d = PluginData::defaults();
        assert!(d.pinned_notes.is_empty());
        assert_eq!(d.version, Some(CURRENT_VERSION));
        assert!(d.backups.is_none());
        assert_eq!(d.sort_config.key, DEFAULT_SORT_KEY);
        assert_eq!(d.sort_config.order, SortOrder::Desc);
    }

    #[test]
    fn test_defaults_are_isolated_copies() {
        let mut a = PluginData::defaults();
        a.pinned_notes.push("note.md".to_string());
        let b = PluginData::defaults();
        assert!(b.pinned_notes.is_empty());
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let json = serde_json::to_value(PluginData::defaults()).unwrap();
        assert!(json.get("pinnedNotes").is_some());
        assert!(json.get("lastFilters").is_some());
        assert!(json.get("sortConfig").is_some());
        // Optional absent fields stay off the wire
        assert!(json.get("backups").is_none());
    }

    #[test]
    fn test_partial_settings_merge_with_defaults() {
        let parsed: PluginSettings =
            serde_json::from_value(serde_json::json!({ "autoStart": true })).unwrap();
        assert!(parsed.auto_start);
        assert_eq!(parsed.sort_key, DEFAULT_SORT_KEY);
        assert!(parsed.show_in_sidebar);
    }

    #[test]
    fn test_date_filter_roundtrip() {
        let f = DateFilter {
            kind: DateFilterKind::Within,
            value: DateFilterValue::Text("2026-01-15".to_string()),
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["type"], "within");
        let back: DateFilter = serde_json::from_value(json).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn test_date_filter_epoch_value_parses_and_roundtrips() {
        // An already-parsed date arrives as a bare number on the wire
        let raw = serde_json::json!({ "type": "after", "value": 1755000000000_i64 });
        let parsed: DateFilter = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.value, DateFilterValue::Epoch(1755000000000));

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["value"], serde_json::json!(1755000000000_i64));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        // lastFilters absent: the typed parse is the structural gate
        let raw = serde_json::json!({
            "pinnedNotes": [],
            "sortConfig": { "key": "modified", "order": "desc" }
        });
        assert!(serde_json::from_value::<PluginData>(raw).is_err());
    }

    #[test]
    fn test_wrong_pinned_notes_type_rejected() {
        let raw = serde_json::json!({
            "pinnedNotes": "not-an-array",
            "lastFilters": { "folders": [], "tags": [], "filename": "" },
            "sortConfig": { "key": "modified", "order": "desc" }
        });
        assert!(serde_json::from_value::<PluginData>(raw).is_err());
    }
}
