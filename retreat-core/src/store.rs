//! Whole-value JSON record storage.
//!
//! One file per record under the data directory. Every save replaces the
//! full value atomically (tmp + rename); there are no partial updates and
//! no history. Loads fall back to the caller's default when the file is
//! absent or unreadable, so a corrupt record never takes the app down.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::error::{RetreatError, RetreatResult};
use crate::record::RecordKey;

#[derive(Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open (and create if needed) the record directory.
    pub fn open(dir: PathBuf) -> RetreatResult<Store> {
        std::fs::create_dir_all(&dir)?;
        Ok(Store { dir })
    }

    pub fn path(&self, key: RecordKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.name()))
    }

    /// Directory for auxiliary state files (sync markers, usage counters).
    pub fn state_dir(&self) -> PathBuf {
        self.dir.join(".state")
    }

    /// Persist the full value under a key, replacing whatever was there.
    pub fn save(&self, key: RecordKey, value: &Value) -> RetreatResult<()> {
        let content = serde_json::to_vec_pretty(value)
            .map_err(|e| RetreatError::Serialization(e.to_string()))?;

        let path = self.path(key);
        let temp = path.with_extension("json.tmp");

        std::fs::write(&temp, content).map_err(map_write_error)?;
        std::fs::rename(&temp, &path).map_err(map_write_error)?;
        Ok(())
    }

    pub fn save_record<T: Serialize>(&self, key: RecordKey, record: &T) -> RetreatResult<()> {
        let value =
            serde_json::to_value(record).map_err(|e| RetreatError::Serialization(e.to_string()))?;
        self.save(key, &value)
    }

    /// Load the stored value, or `default` when absent or corrupt.
    pub fn load(&self, key: RecordKey, default: Value) -> Value {
        self.load_raw(key).unwrap_or(default)
    }

    /// Load the stored value if one exists and parses.
    pub fn load_raw(&self, key: RecordKey) -> Option<Value> {
        let content = std::fs::read_to_string(self.path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Typed load; `None` when absent or when the stored value no longer
    /// matches the expected shape.
    pub fn load_record<T: serde::de::DeserializeOwned>(&self, key: RecordKey) -> Option<T> {
        serde_json::from_value(self.load_raw(key)?).ok()
    }

    pub fn remove(&self, key: RecordKey) -> RetreatResult<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Delete every record. Irreversible.
    pub fn clear_all(&self) -> RetreatResult<()> {
        for key in RecordKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }

    /// Bundle every record into one JSON object keyed by logical name.
    /// Absent records export as null so the backup lists all keys.
    pub fn export_all(&self) -> Value {
        let mut doc = serde_json::Map::new();
        for key in RecordKey::ALL {
            doc.insert(key.name().to_string(), self.load(key, Value::Null));
        }
        Value::Object(doc)
    }

    /// Import a backup document produced by [`Store::export_all`].
    ///
    /// The document is parsed and validated before anything is written, so
    /// a malformed file aborts the whole import with no records touched.
    /// Only recognized keys with non-null values overwrite local records;
    /// unknown keys are ignored. Returns the list of imported keys.
    pub fn import(&self, content: &str) -> RetreatResult<Vec<RecordKey>> {
        let doc: Value = serde_json::from_str(content)
            .map_err(|e| RetreatError::Import(format!("Not a valid backup file: {e}")))?;

        let Value::Object(entries) = doc else {
            return Err(RetreatError::Import(
                "Backup must be a JSON object keyed by record name".into(),
            ));
        };

        let recognized: Vec<(RecordKey, &Value)> = entries
            .iter()
            .filter_map(|(name, value)| {
                let key = RecordKey::from_name(name).ok()?;
                (!value.is_null()).then_some((key, value))
            })
            .collect();

        let mut imported = Vec::with_capacity(recognized.len());
        for (key, value) in recognized {
            self.save(key, value)?;
            imported.push(key);
        }
        Ok(imported)
    }
}

/// A full disk is the filesystem's quota-exceeded: surface it as such so
/// the caller can tell the user to export and free space.
fn map_write_error(e: std::io::Error) -> RetreatError {
    match e.kind() {
        std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => {
            RetreatError::QuotaExceeded
        }
        _ => RetreatError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("records")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_load_after_save_is_deep_equal() {
        let (_dir, store) = temp_store();

        let value = json!({
            "checked": {"0_2": true, "custom_1730000000000": false},
            "custom": [{"id": 1730000000000i64, "category": "Tech", "item": "Chargers"}],
        });
        store.save(RecordKey::Supplies, &value).unwrap();

        assert_eq!(store.load(RecordKey::Supplies, Value::Null), value);
    }

    #[test]
    fn test_load_returns_default_when_absent_or_corrupt() {
        let (_dir, store) = temp_store();

        let default = json!({"develop": [], "ready": [], "parking": []});
        assert_eq!(store.load(RecordKey::Kanban, default.clone()), default);

        std::fs::write(store.path(RecordKey::Kanban), "{not json").unwrap();
        assert_eq!(store.load(RecordKey::Kanban, default.clone()), default);
    }

    #[test]
    fn test_save_replaces_whole_value() {
        let (_dir, store) = temp_store();

        store
            .save(RecordKey::Ikigai, &json!({"love": "a", "good_at": "b"}))
            .unwrap();
        store.save(RecordKey::Ikigai, &json!({"love": "c"})).unwrap();

        assert_eq!(
            store.load(RecordKey::Ikigai, Value::Null),
            json!({"love": "c"})
        );
    }

    #[test]
    fn test_remove_and_clear_all() {
        let (_dir, store) = temp_store();

        store.save(RecordKey::Ikigai, &json!({"love": "x"})).unwrap();
        store.save(RecordKey::Kanban, &json!({"develop": []})).unwrap();

        store.remove(RecordKey::Ikigai).unwrap();
        assert!(store.load_raw(RecordKey::Ikigai).is_none());

        store.clear_all().unwrap();
        assert!(store.load_raw(RecordKey::Kanban).is_none());
    }

    #[test]
    fn test_export_lists_every_key() {
        let (_dir, store) = temp_store();
        store.save(RecordKey::Ikigai, &json!({"love": "x"})).unwrap();

        let doc = store.export_all();
        let entries = doc.as_object().unwrap();
        assert_eq!(entries.len(), RecordKey::ALL.len());
        assert_eq!(entries["ikigai"], json!({"love": "x"}));
        assert!(entries["kanban"].is_null());
    }

    #[test]
    fn test_import_skips_unknown_and_null_entries() {
        let (_dir, store) = temp_store();

        let backup = json!({
            "ikigai": {"love": "surfing"},
            "kanban": null,
            "someday": {"not": "ours"},
        });
        let imported = store.import(&backup.to_string()).unwrap();

        assert_eq!(imported, vec![RecordKey::Ikigai]);
        assert_eq!(
            store.load(RecordKey::Ikigai, Value::Null),
            json!({"love": "surfing"})
        );
        assert!(store.load_raw(RecordKey::Kanban).is_none());
    }

    #[test]
    fn test_malformed_import_writes_nothing() {
        let (_dir, store) = temp_store();

        assert!(store.import("{broken").is_err());
        assert!(store.import("[1, 2, 3]").is_err());

        for key in RecordKey::ALL {
            assert!(store.load_raw(key).is_none());
        }
    }
}
