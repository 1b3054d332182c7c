use super::HostStorage;
use crate::error::Result;
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const RECORD_FILENAME: &str = "data.json";

/// File-backed host storage: the whole record lives in one JSON file.
///
/// A missing file is an empty store, not an error. Writes go through a
/// sibling temp file and a rename, so an interrupted write never truncates
/// the previous record.
pub struct FileHost {
    path: PathBuf,
}

impl FileHost {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Conventional per-user location for the record
    /// (e.g. `~/.local/share/cardstash/data.json`).
    pub fn in_user_dir() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "cardstash")?;
        Some(Self::new(dirs.data_dir().join(RECORD_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostStorage for FileHost {
    fn read(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let record: Value = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    fn write(&mut self, record: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn host_in(dir: &TempDir) -> FileHost {
        FileHost::new(dir.path().join(RECORD_FILENAME))
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let host = host_in(&dir);
        assert!(host.read().unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut host = host_in(&dir);
        let record = json!({ "pinnedNotes": ["a.md"], "version": 1 });
        host.write(&record).unwrap();
        assert_eq!(host.read().unwrap(), Some(record));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let mut host = FileHost::new(dir.path().join("nested/deeper").join(RECORD_FILENAME));
        host.write(&json!({})).unwrap();
        assert!(host.path().exists());
    }

    #[test]
    fn test_no_tmp_artifacts_left_behind() {
        let dir = TempDir::new().unwrap();
        let mut host = host_in(&dir);
        host.write(&json!({ "version": 1 })).unwrap();

        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name();
            let name = name.to_string_lossy();
            assert!(!name.ends_with(".tmp"), "leftover tmp file: {}", name);
        }
    }

    #[test]
    fn test_unparsable_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RECORD_FILENAME), "{not json").unwrap();
        let host = host_in(&dir);
        assert!(host.read().is_err());
    }
}
