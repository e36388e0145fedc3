//! The packing checklist.
//!
//! The default checklist ships with the itinerary; users add their own
//! items on top. Checked state for both lives in one sparse map keyed
//! `"<categoryIndex>_<itemIndex>"` for defaults and `"custom_<id>"` for
//! custom items, so the default list can change without migrations.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::journal::iso_now;

/// A category of the fixed default checklist.
pub struct ChecklistCategory {
    pub name: &'static str,
    pub items: &'static [&'static str],
}

/// The default packing list. Checked state references items by position
/// (`"<categoryIndex>_<itemIndex>"`), so entries are appended, never
/// reordered.
pub const DEFAULT_CHECKLIST: &[ChecklistCategory] = &[
    ChecklistCategory {
        name: "Essentials",
        items: &[
            "Keys to the house",
            "Phone chargers",
            "Medications",
            "Toiletries",
            "Comfortable clothes",
            "Rain jackets",
        ],
    },
    ChecklistCategory {
        name: "Business Planning",
        items: &[
            "Notebooks (one each)",
            "Pens and markers",
            "Sticky notes for the idea board",
            "Laptop",
            "Printed worksheets",
        ],
    },
    ChecklistCategory {
        name: "Food & Kitchen",
        items: &[
            "Groceries for six meals",
            "Coffee and tea",
            "Snacks",
            "Water bottles",
            "Cooler",
        ],
    },
    ChecklistCategory {
        name: "Comfort",
        items: &[
            "Blankets",
            "Candles",
            "Books",
            "Walking shoes",
        ],
    },
];

/// Items on the default checklist.
pub fn default_item_count() -> usize {
    DEFAULT_CHECKLIST.iter().map(|c| c.items.len()).sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSupply {
    /// Creation timestamp in milliseconds.
    pub id: i64,
    pub category: String,
    pub item: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Supplies {
    #[serde(default)]
    pub checked: BTreeMap<String, bool>,
    #[serde(default)]
    pub custom: Vec<CustomSupply>,
}

impl Supplies {
    pub fn default_key(category: usize, item: usize) -> String {
        format!("{category}_{item}")
    }

    pub fn custom_key(id: i64) -> String {
        format!("custom_{id}")
    }

    pub fn is_checked(&self, key: &str) -> bool {
        self.checked.get(key).copied().unwrap_or(false)
    }

    /// Flip an item's checked state and return the new state.
    pub fn toggle(&mut self, key: &str) -> bool {
        let state = !self.is_checked(key);
        self.checked.insert(key.to_string(), state);
        state
    }

    /// Uncheck everything; custom items stay.
    pub fn reset(&mut self) {
        self.checked.clear();
    }

    pub fn checked_count(&self) -> usize {
        self.checked.values().filter(|v| **v).count()
    }

    /// Packing progress as a percentage of `total_items`.
    pub fn progress(&self, total_items: usize) -> u8 {
        if total_items == 0 {
            return 0;
        }
        ((self.checked_count() * 100 + total_items / 2) / total_items).min(100) as u8
    }

    pub fn add_custom(&mut self, category: &str, item: &str) -> i64 {
        let id = self.unique_custom_id();
        self.custom.push(CustomSupply {
            id,
            category: category.to_string(),
            item: item.to_string(),
            created_at: iso_now(),
            updated_at: None,
        });
        id
    }

    pub fn edit_custom(&mut self, id: i64, category: &str, item: &str) -> bool {
        match self.custom.iter_mut().find(|s| s.id == id) {
            Some(supply) => {
                supply.category = category.to_string();
                supply.item = item.to_string();
                supply.updated_at = Some(iso_now());
                true
            }
            None => false,
        }
    }

    /// Remove a custom item along with its checked-state entry.
    pub fn delete_custom(&mut self, id: i64) -> bool {
        let before = self.custom.len();
        self.custom.retain(|s| s.id != id);
        if self.custom.len() == before {
            return false;
        }
        self.checked.remove(&Supplies::custom_key(id));
        true
    }

    fn unique_custom_id(&self) -> i64 {
        let mut id = Utc::now().timestamp_millis();
        while self.custom.iter().any(|s| s.id == id) {
            id += 1;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_uses_sparse_key_format() {
        let mut supplies = Supplies::default();

        assert!(supplies.toggle(&Supplies::default_key(0, 2)));
        assert!(supplies.is_checked("0_2"));
        assert!(!supplies.toggle("0_2"));
        assert!(!supplies.is_checked("0_2"));
    }

    #[test]
    fn test_custom_items_and_checked_state() {
        let mut supplies = Supplies::default();
        let id = supplies.add_custom("Tech", "Spare chargers");

        let key = Supplies::custom_key(id);
        assert!(key.starts_with("custom_"));
        supplies.toggle(&key);
        assert!(supplies.is_checked(&key));

        assert!(supplies.edit_custom(id, "Tech", "USB-C chargers"));
        assert_eq!(supplies.custom[0].item, "USB-C chargers");
        assert!(supplies.custom[0].updated_at.is_some());

        assert!(supplies.delete_custom(id));
        assert!(!supplies.is_checked(&key), "checked entry goes with the item");
        assert!(!supplies.delete_custom(id));
    }

    #[test]
    fn test_reset_keeps_custom_items() {
        let mut supplies = Supplies::default();
        supplies.add_custom("Food", "Trail mix");
        supplies.toggle("0_0");
        supplies.toggle("1_3");

        supplies.reset();

        assert_eq!(supplies.checked_count(), 0);
        assert_eq!(supplies.custom.len(), 1);
    }

    #[test]
    fn test_progress_rounds_to_percent() {
        let mut supplies = Supplies::default();
        supplies.toggle("0_0");
        supplies.toggle("0_1");

        assert_eq!(supplies.progress(3), 67);
        assert_eq!(supplies.progress(0), 0);
        assert_eq!(supplies.progress(2), 100);
    }
}
