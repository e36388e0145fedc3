//! The assembled application state.
//!
//! Everything the commands need, constructed once at startup from the
//! persisted config and preferences: the record store, the current user,
//! and the mirror when a signed-in remote is configured. There is no
//! global mutable state; commands receive a `Workspace`, and every record
//! save goes through it so the mirror sees each write exactly once.

use std::sync::Arc;

use serde_json::Value;

use crate::config::RetreatConfig;
use crate::error::{RetreatError, RetreatResult};
use crate::journal::Journals;
use crate::kanban::Board;
use crate::record::{Preferences, RecordKey, User};
use crate::schedule::Itinerary;
use crate::store::Store;
use crate::supplies::Supplies;
use crate::sync::{Mirror, WriteOrigin};
use crate::worksheets::Worksheets;

#[derive(Clone)]
pub struct Workspace {
    pub config: RetreatConfig,
    pub store: Store,
    pub mirror: Option<Arc<Mirror>>,
    pub user: User,
}

impl Workspace {
    /// Build the workspace from persisted config and preferences.
    pub fn open() -> RetreatResult<Workspace> {
        let config = RetreatConfig::load()?;
        let store = Store::open(config.data_path().join("records"))?;

        let user = store
            .load_record::<Preferences>(RecordKey::UserPreferences)
            .unwrap_or_default()
            .current_user;

        // Mirroring needs a configured remote with a signed-in account;
        // otherwise the app runs local-only.
        let mirror = config
            .remote
            .clone()
            .filter(|remote| remote.account().is_some())
            .map(|remote| Mirror::new(remote, user).map(Arc::new))
            .transpose()?;

        Ok(Workspace {
            config,
            store,
            mirror,
            user,
        })
    }

    /// Save a record and mirror it when appropriate.
    pub fn save(&self, key: RecordKey, value: &Value) -> RetreatResult<()> {
        self.save_from(key, value, WriteOrigin::Local)
    }

    pub fn save_from(
        &self,
        key: RecordKey,
        value: &Value,
        origin: WriteOrigin,
    ) -> RetreatResult<()> {
        self.store.save(key, value)?;
        if let Some(mirror) = &self.mirror {
            mirror.after_local_save(key, value, origin);
        }
        Ok(())
    }

    pub fn save_record<T: serde::Serialize>(
        &self,
        key: RecordKey,
        record: &T,
    ) -> RetreatResult<()> {
        let value = serde_json::to_value(record)
            .map_err(|e| RetreatError::Serialization(e.to_string()))?;
        self.save(key, &value)
    }

    // RECORD ACCESSORS:

    pub fn journals_for(&self, user: User) -> Journals<'_> {
        Journals::for_user(self, user)
    }

    pub fn worksheets(&self) -> Worksheets<'_> {
        Worksheets::new(self)
    }

    pub fn board(&self) -> Board {
        self.store.load_record(RecordKey::Kanban).unwrap_or_default()
    }

    pub fn save_board(&self, board: &Board) -> RetreatResult<()> {
        self.save_record(RecordKey::Kanban, board)
    }

    pub fn supplies(&self) -> Supplies {
        self.store
            .load_record(RecordKey::Supplies)
            .unwrap_or_default()
    }

    pub fn save_supplies(&self, supplies: &Supplies) -> RetreatResult<()> {
        self.save_record(RecordKey::Supplies, supplies)
    }

    pub fn itinerary(&self) -> RetreatResult<Itinerary> {
        Itinerary::load(&self.config.data_path().join("itinerary.json"))
    }

    pub fn set_current_user(&mut self, user: User) -> RetreatResult<()> {
        self.user = user;
        self.save_record(RecordKey::UserPreferences, &Preferences { current_user: user })
    }

    /// Directory for auxiliary state files (assist usage counters).
    pub fn state_dir(&self) -> std::path::PathBuf {
        self.store.state_dir()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A throwaway workspace over a temp directory, local-only.
    pub fn temp_workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("records")).unwrap();
        let workspace = Workspace {
            config: RetreatConfig::default(),
            store,
            mirror: None,
            user: User::Dillyn,
        };
        (dir, workspace)
    }
}
