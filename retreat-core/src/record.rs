//! Record keys, sharing scope and the two retreat users.
//!
//! Every persisted document is identified by a [`RecordKey`]. Each key
//! declares its own sharing [`Scope`] rather than relying on a hardcoded
//! list of "shared" keys elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RetreatError, RetreatResult};

/// Where a record lives when mirrored: under the signed-in account's own
/// subtree, or in the workspace area both users read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    PerUser,
    Shared,
}

/// One of the two named retreat participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum User {
    Dillyn,
    Ashlee,
}

impl User {
    pub fn name(&self) -> &'static str {
        match self {
            User::Dillyn => "Dillyn",
            User::Ashlee => "Ashlee",
        }
    }

    pub fn from_name(name: &str) -> RetreatResult<User> {
        match name.to_lowercase().as_str() {
            "dillyn" => Ok(User::Dillyn),
            "ashlee" => Ok(User::Ashlee),
            other => Err(RetreatError::Config(format!(
                "Unknown user '{other}'. Expected Dillyn or Ashlee."
            ))),
        }
    }

}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A named logical document in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKey {
    Supplies,
    DillynJournals,
    AshleeJournals,
    SwotAnalyses,
    Ikigai,
    ValueProp,
    Kanban,
    ActionPlan,
    UserPreferences,
}

impl RecordKey {
    pub const ALL: [RecordKey; 9] = [
        RecordKey::Supplies,
        RecordKey::DillynJournals,
        RecordKey::AshleeJournals,
        RecordKey::SwotAnalyses,
        RecordKey::Ikigai,
        RecordKey::ValueProp,
        RecordKey::Kanban,
        RecordKey::ActionPlan,
        RecordKey::UserPreferences,
    ];

    /// The wire name: local file stem, export key and remote slot name.
    pub fn name(&self) -> &'static str {
        match self {
            RecordKey::Supplies => "supplies",
            RecordKey::DillynJournals => "dillyn_journals",
            RecordKey::AshleeJournals => "ashlee_journals",
            RecordKey::SwotAnalyses => "swot_analyses",
            RecordKey::Ikigai => "ikigai",
            RecordKey::ValueProp => "value_prop",
            RecordKey::Kanban => "kanban",
            RecordKey::ActionPlan => "action_plan",
            RecordKey::UserPreferences => "user_preferences",
        }
    }

    pub fn from_name(name: &str) -> RetreatResult<RecordKey> {
        RecordKey::ALL
            .into_iter()
            .find(|key| key.name() == name)
            .ok_or_else(|| RetreatError::UnknownRecord(name.to_string()))
    }

    pub fn scope(&self) -> Scope {
        match self {
            RecordKey::DillynJournals | RecordKey::AshleeJournals | RecordKey::UserPreferences => {
                Scope::PerUser
            }
            _ => Scope::Shared,
        }
    }

    /// Whether this record participates in mirroring for the given user.
    ///
    /// Shared records always mirror. Journals mirror only on their owner's
    /// device, and preferences (the device's current-user selection) never
    /// leave the device.
    pub fn mirrored(&self, user: User) -> bool {
        match self {
            RecordKey::UserPreferences => false,
            RecordKey::DillynJournals => user == User::Dillyn,
            RecordKey::AshleeJournals => user == User::Ashlee,
            _ => true,
        }
    }

    pub fn journals_for(user: User) -> RecordKey {
        match user {
            User::Dillyn => RecordKey::DillynJournals,
            User::Ashlee => RecordKey::AshleeJournals,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-device preferences, stored as the `user_preferences` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub current_user: User,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            current_user: User::Dillyn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for key in RecordKey::ALL {
            assert_eq!(RecordKey::from_name(key.name()).unwrap(), key);
        }
        assert!(RecordKey::from_name("nope").is_err());
    }

    #[test]
    fn test_journals_are_per_user_and_tools_shared() {
        assert_eq!(RecordKey::DillynJournals.scope(), Scope::PerUser);
        assert_eq!(RecordKey::AshleeJournals.scope(), Scope::PerUser);
        assert_eq!(RecordKey::UserPreferences.scope(), Scope::PerUser);
        for key in [
            RecordKey::Supplies,
            RecordKey::SwotAnalyses,
            RecordKey::Ikigai,
            RecordKey::ValueProp,
            RecordKey::Kanban,
            RecordKey::ActionPlan,
        ] {
            assert_eq!(key.scope(), Scope::Shared);
        }
    }

    #[test]
    fn test_preferences_never_mirror() {
        assert!(!RecordKey::UserPreferences.mirrored(User::Dillyn));
        assert!(!RecordKey::UserPreferences.mirrored(User::Ashlee));
        assert!(RecordKey::DillynJournals.mirrored(User::Dillyn));
        assert!(!RecordKey::DillynJournals.mirrored(User::Ashlee));
        assert!(RecordKey::Kanban.mirrored(User::Ashlee));
    }
}
