//! Business-planning worksheets.
//!
//! SWOT, Ikigai, the Value Proposition Canvas and the 90-day action plan
//! all share one field-map shape and one save/load path, parameterized by
//! the worksheet's record key and field schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{RetreatError, RetreatResult};
use crate::journal::iso_now;
use crate::record::RecordKey;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Worksheet {
    Swot,
    Ikigai,
    ValueProp,
    ActionPlan,
}

impl Worksheet {
    pub const ALL: [Worksheet; 4] = [
        Worksheet::Swot,
        Worksheet::Ikigai,
        Worksheet::ValueProp,
        Worksheet::ActionPlan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Worksheet::Swot => "swot",
            Worksheet::Ikigai => "ikigai",
            Worksheet::ValueProp => "value",
            Worksheet::ActionPlan => "action",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Worksheet::Swot => "SWOT Analysis",
            Worksheet::Ikigai => "Ikigai",
            Worksheet::ValueProp => "Value Proposition Canvas",
            Worksheet::ActionPlan => "90-Day Action Plan",
        }
    }

    pub fn from_name(name: &str) -> RetreatResult<Worksheet> {
        Worksheet::ALL
            .into_iter()
            .find(|w| w.name() == name)
            .ok_or_else(|| RetreatError::UnknownRecord(format!("worksheet '{name}'")))
    }

    pub fn record_key(&self) -> RecordKey {
        match self {
            Worksheet::Swot => RecordKey::SwotAnalyses,
            Worksheet::Ikigai => RecordKey::Ikigai,
            Worksheet::ValueProp => RecordKey::ValueProp,
            Worksheet::ActionPlan => RecordKey::ActionPlan,
        }
    }

    /// The fields this worksheet's form collects.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Worksheet::Swot => &[
                "idea_name",
                "strengths",
                "weaknesses",
                "opportunities",
                "threats",
            ],
            Worksheet::Ikigai => &["love", "good_at", "paid_for", "world_needs"],
            Worksheet::ValueProp => &[
                "customer_jobs",
                "pains",
                "gains",
                "products",
                "pain_relievers",
                "gain_creators",
            ],
            Worksheet::ActionPlan => &[
                "business_idea",
                "vision",
                "month1_goal",
                "month2_goal",
                "month3_goal",
            ],
        }
    }
}

impl fmt::Display for Worksheet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorksheetData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl WorksheetData {
    /// Field text, if present and non-empty.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn field_or(&self, name: &str, fallback: &'static str) -> String {
        self.field(name).unwrap_or(fallback).to_string()
    }
}

/// Workspace-backed access to the shared worksheet records. Saves go
/// through the workspace so they reach the mirror.
pub struct Worksheets<'a> {
    workspace: &'a Workspace,
}

impl<'a> Worksheets<'a> {
    pub fn new(workspace: &'a Workspace) -> Worksheets<'a> {
        Worksheets { workspace }
    }

    pub fn load(&self, worksheet: Worksheet) -> WorksheetData {
        self.workspace
            .store
            .load_record(worksheet.record_key())
            .unwrap_or_default()
    }

    /// Merge field updates into the worksheet and stamp `last_modified`.
    pub fn set_fields(
        &self,
        worksheet: Worksheet,
        updates: Map<String, Value>,
    ) -> RetreatResult<WorksheetData> {
        let mut data = self.load(worksheet);
        for (field, value) in updates {
            data.fields.insert(field, value);
        }
        data.last_modified = Some(iso_now());
        self.workspace.save_record(worksheet.record_key(), &data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::workspace::testing::temp_workspace;

    #[test]
    fn test_set_fields_merges_and_stamps() {
        let (_dir, workspace) = temp_workspace();
        let worksheets = Worksheets::new(&workspace);

        worksheets
            .set_fields(
                Worksheet::Swot,
                Map::from_iter([("strengths".into(), json!("small team, fast"))]),
            )
            .unwrap();
        let data = worksheets
            .set_fields(
                Worksheet::Swot,
                Map::from_iter([("threats".into(), json!("seasonality"))]),
            )
            .unwrap();

        assert_eq!(data.field("strengths"), Some("small team, fast"));
        assert_eq!(data.field("threats"), Some("seasonality"));
        assert!(data.last_modified.is_some());

        let reloaded = worksheets.load(Worksheet::Swot);
        assert_eq!(reloaded.field("strengths"), Some("small team, fast"));
    }

    #[test]
    fn test_field_ignores_blank_values() {
        let mut data = WorksheetData::default();
        data.fields.insert("vision".into(), json!("   "));
        assert_eq!(data.field("vision"), None);
        assert_eq!(data.field_or("vision", "Not specified"), "Not specified");
    }

    #[test]
    fn test_each_worksheet_maps_to_its_record() {
        assert_eq!(Worksheet::Swot.record_key(), RecordKey::SwotAnalyses);
        assert_eq!(Worksheet::ActionPlan.record_key(), RecordKey::ActionPlan);
        for w in Worksheet::ALL {
            assert_eq!(Worksheet::from_name(w.name()).unwrap(), w);
            assert!(!w.fields().is_empty());
        }
    }
}
