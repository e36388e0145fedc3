//! Per-user journals: daily reflections, freeform entries and the letter
//! to the future self.
//!
//! Reflection and letter fields are open-ended maps rather than fixed
//! structs: the forms evolve and old entries must keep loading.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::RetreatResult;
use crate::record::{RecordKey, User};
use crate::workspace::Workspace;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub daily: BTreeMap<String, DailyReflection>,
    #[serde(default)]
    pub freeform: Vec<FreeformEntry>,
    #[serde(default)]
    pub future_letter: FutureLetter,
}

/// One day's reflection, keyed by `YYYY-MM-DD` in [`Journal::daily`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyReflection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeformEntry {
    pub id: i64,
    pub date: String,
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FutureLetter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Current time as the ISO string journals are stamped with.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Workspace-backed access to one user's journal record. Saves go through
/// the workspace so they reach the mirror.
pub struct Journals<'a> {
    workspace: &'a Workspace,
    key: RecordKey,
}

impl<'a> Journals<'a> {
    pub fn for_user(workspace: &'a Workspace, user: User) -> Journals<'a> {
        Journals {
            workspace,
            key: RecordKey::journals_for(user),
        }
    }

    pub fn load(&self) -> Journal {
        self.workspace.store.load_record(self.key).unwrap_or_default()
    }

    pub fn save(&self, journal: &Journal) -> RetreatResult<()> {
        self.workspace.save_record(self.key, journal)
    }

    /// Save the reflection for a date, stamping it with the current time.
    pub fn save_daily(&self, date: &str, fields: Map<String, Value>) -> RetreatResult<()> {
        let mut journal = self.load();
        journal.daily.insert(
            date.to_string(),
            DailyReflection {
                timestamp: Some(iso_now()),
                fields,
            },
        );
        self.save(&journal)
    }

    pub fn daily(&self, date: &str) -> Option<DailyReflection> {
        self.load().daily.get(date).cloned()
    }

    pub fn delete_daily(&self, date: &str) -> RetreatResult<bool> {
        let mut journal = self.load();
        if journal.daily.remove(date).is_none() {
            return Ok(false);
        }
        self.save(&journal)?;
        Ok(true)
    }

    /// Insert or update a freeform entry, keeping entries newest-first.
    pub fn save_freeform(&self, mut entry: FreeformEntry) -> RetreatResult<FreeformEntry> {
        let mut journal = self.load();

        if entry.id == 0 {
            entry.id = unique_entry_id(journal.freeform.iter().map(|e| e.id));
        }
        if entry.timestamp.is_empty() {
            entry.timestamp = iso_now();
        }

        match journal.freeform.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => journal.freeform.push(entry.clone()),
        }
        journal.freeform.sort_by(|a, b| b.date.cmp(&a.date));

        self.save(&journal)?;
        Ok(entry)
    }

    pub fn entries(&self) -> Vec<FreeformEntry> {
        self.load().freeform
    }

    pub fn delete_freeform(&self, id: i64) -> RetreatResult<bool> {
        let mut journal = self.load();
        let before = journal.freeform.len();
        journal.freeform.retain(|e| e.id != id);
        if journal.freeform.len() == before {
            return Ok(false);
        }
        self.save(&journal)?;
        Ok(true)
    }

    pub fn save_future_letter(&self, fields: Map<String, Value>) -> RetreatResult<()> {
        let mut journal = self.load();
        journal.future_letter = FutureLetter {
            timestamp: Some(iso_now()),
            fields,
        };
        self.save(&journal)
    }

    pub fn future_letter(&self) -> FutureLetter {
        self.load().future_letter
    }
}

/// Entry ids are creation timestamps in milliseconds; nudge forward on the
/// rare same-millisecond collision so ids stay unique.
fn unique_entry_id(existing: impl Iterator<Item = i64> + Clone) -> i64 {
    let mut id = Utc::now().timestamp_millis();
    while existing.clone().any(|e| e == id) {
        id += 1;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::testing::temp_workspace;
    use serde_json::json;

    #[test]
    fn test_daily_reflection_round_trip_adds_timestamp() {
        let (_dir, workspace) = temp_workspace();
        let journals = Journals::for_user(&workspace, User::Dillyn);

        let mut fields = Map::new();
        fields.insert("intention".into(), json!("Focus"));
        fields.insert("energy".into(), json!(7));
        journals.save_daily("2025-10-24", fields).unwrap();

        let loaded = journals.daily("2025-10-24").unwrap();
        assert_eq!(loaded.fields["intention"], json!("Focus"));
        assert_eq!(loaded.fields["energy"], json!(7));
        let timestamp = loaded.timestamp.expect("save should stamp the entry");
        assert!(
            chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok(),
            "timestamp should be an ISO string, got {timestamp}"
        );
    }

    #[test]
    fn test_journals_are_separate_per_user() {
        let (_dir, workspace) = temp_workspace();
        let dillyn = Journals::for_user(&workspace, User::Dillyn);
        let ashlee = Journals::for_user(&workspace, User::Ashlee);

        dillyn
            .save_daily("2025-10-24", Map::from_iter([("intention".into(), json!("Focus"))]))
            .unwrap();

        assert!(dillyn.daily("2025-10-24").is_some());
        assert!(ashlee.daily("2025-10-24").is_none());
    }

    #[test]
    fn test_freeform_entries_sorted_newest_first_and_upserted() {
        let (_dir, workspace) = temp_workspace();
        let journals = Journals::for_user(&workspace, User::Ashlee);

        let first = journals
            .save_freeform(FreeformEntry {
                id: 1,
                date: "2025-10-24".into(),
                text: "day one".into(),
                timestamp: String::new(),
            })
            .unwrap();
        journals
            .save_freeform(FreeformEntry {
                id: 2,
                date: "2025-10-26".into(),
                text: "day three".into(),
                timestamp: String::new(),
            })
            .unwrap();

        let entries = journals.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "2025-10-26");
        assert_eq!(entries[1].date, "2025-10-24");

        // Updating an existing id replaces rather than duplicates.
        journals
            .save_freeform(FreeformEntry {
                text: "day one, revised".into(),
                ..first
            })
            .unwrap();
        let entries = journals.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].text, "day one, revised");
    }

    #[test]
    fn test_delete_daily_and_freeform() {
        let (_dir, workspace) = temp_workspace();
        let journals = Journals::for_user(&workspace, User::Dillyn);

        journals.save_daily("2025-10-25", Map::new()).unwrap();
        assert!(journals.delete_daily("2025-10-25").unwrap());
        assert!(!journals.delete_daily("2025-10-25").unwrap());

        let entry = journals
            .save_freeform(FreeformEntry {
                id: 0,
                date: "2025-10-25".into(),
                text: "thoughts".into(),
                timestamp: String::new(),
            })
            .unwrap();
        assert!(entry.id > 0);
        assert!(journals.delete_freeform(entry.id).unwrap());
        assert!(journals.entries().is_empty());
    }
}
