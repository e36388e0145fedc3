//! Local/remote record mirroring.
//!
//! Local storage stays the read path; the mirror is a best-effort cloud
//! copy. Local saves push in the background and failures are logged, never
//! surfaced. Writes that *came from* the remote are flagged so they are
//! not pushed straight back, which is the only thing standing between a
//! live subscription and an infinite local->remote->local loop.
//!
//! Conflict policy is remote-wins with no merge: acceptable for two users
//! editing asynchronously, and documented as such.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{RetreatError, RetreatResult};
use crate::record::{RecordKey, User};
use crate::remote::Remote;
use crate::remote::protocol::RecordSlot;
use crate::store::Store;

/// Who initiated a local save. Remote-origin saves are never re-pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    Local,
    Remote,
}

/// What `sync_key` did for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote had a value; it overwrote the local copy (remote wins).
    Pulled,
    /// Remote slot was empty; the local value was pushed.
    Pushed,
    /// Neither side had a value.
    Empty,
}

/// An attached mirror: a provider-backed remote plus the signed-in
/// identity writes are tagged with.
pub struct Mirror {
    remote: Remote,
    user: User,
    updated_by: String,
    pushes: AtomicU64,
    pending: std::sync::Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl Mirror {
    /// Requires a signed-in account on the remote config.
    pub fn new(remote: Remote, user: User) -> RetreatResult<Mirror> {
        let updated_by = remote.account().ok_or(RetreatError::NotAuthenticated)?;
        Ok(Mirror {
            remote,
            user,
            updated_by,
            pushes: AtomicU64::new(0),
            pending: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn remote(&self) -> &Remote {
        &self.remote
    }

    pub fn account(&self) -> &str {
        &self.updated_by
    }

    /// The records this device mirrors.
    pub fn keys(&self) -> Vec<RecordKey> {
        RecordKey::ALL
            .into_iter()
            .filter(|key| key.mirrored(self.user))
            .collect()
    }

    /// Remote writes attempted since the mirror was attached.
    pub fn push_count(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }

    /// Mirror a completed local save.
    ///
    /// Fire-and-forget: the caller's save already succeeded locally and a
    /// mirror failure must not affect it. Remote-origin saves are skipped
    /// entirely to break the subscription loop.
    pub fn after_local_save(self: &Arc<Self>, key: RecordKey, value: &Value, origin: WriteOrigin) {
        if origin == WriteOrigin::Remote || !key.mirrored(self.user) {
            return;
        }

        self.pushes.fetch_add(1, Ordering::Relaxed);
        let mirror = Arc::clone(self);
        let value = value.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = mirror.push(key, value).await {
                tracing::warn!(record = key.name(), error = %e, "mirror push failed");
            }
        });
        self.pending.lock().unwrap().push(handle);
    }

    /// Wait for in-flight background pushes. Call before process exit so
    /// fire-and-forget writes are not dropped mid-request.
    pub async fn flush(&self) {
        let handles: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    pub async fn push(&self, key: RecordKey, value: Value) -> RetreatResult<()> {
        self.remote.push(key, value, &self.updated_by).await
    }

    /// Reconcile one record: the remote copy wins whenever it exists; the
    /// local copy is pushed only into an empty slot.
    pub async fn sync_key(&self, store: &Store, key: RecordKey) -> RetreatResult<SyncOutcome> {
        match self.remote.pull(key).await? {
            Some(slot) => {
                store.save(key, &slot.data)?;
                Ok(SyncOutcome::Pulled)
            }
            None => match store.load_raw(key) {
                Some(local) => {
                    self.push(key, local).await?;
                    Ok(SyncOutcome::Pushed)
                }
                None => Ok(SyncOutcome::Empty),
            },
        }
    }

    /// Reconcile every mirrored record. Per-record failures are collected,
    /// not fatal: local state stays authoritative for this session.
    pub async fn sync_all(&self, store: &Store) -> Vec<(RecordKey, RetreatResult<SyncOutcome>)> {
        let mut results = Vec::new();
        for key in self.keys() {
            results.push((key, self.sync_key(store, key).await));
        }
        results
    }

    /// Pull every mirrored record that exists remotely into the store.
    pub async fn pull_all(&self, store: &Store) -> RetreatResult<usize> {
        let mut pulled = 0;
        for key in self.keys() {
            if let Some(slot) = self.remote.pull(key).await? {
                store.save(key, &slot.data)?;
                pulled += 1;
            }
        }
        Ok(pulled)
    }

    /// Push every locally-present mirrored record to the remote.
    pub async fn push_all(&self, store: &Store) -> RetreatResult<usize> {
        let mut pushed = 0;
        for key in self.keys() {
            if let Some(local) = store.load_raw(key) {
                self.push(key, local).await?;
                pushed += 1;
            }
        }
        Ok(pushed)
    }

    /// Attach live subscriptions for every mirrored record and apply each
    /// delivery as a remote-origin local overwrite. Runs until all
    /// subscriptions end. `on_change` fires after each applied overwrite.
    pub async fn watch(
        self: &Arc<Self>,
        store: &Store,
        mut on_change: impl FnMut(RecordKey),
    ) -> RetreatResult<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        for key in self.keys() {
            let mut subscription = self.remote.subscribe(key).await?;
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut gate = SnapshotGate::new();
                loop {
                    match subscription.next().await {
                        Ok(Some(slot)) => {
                            if let Some(slot) = gate.admit(slot)
                                && tx.send((key, slot)).is_err()
                            {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(record = key.name(), error = %e, "subscription failed");
                            break;
                        }
                    }
                }
            });
        }
        drop(tx);

        while let Some((key, slot)) = rx.recv().await {
            // A null-data delivery means the slot is empty; there is
            // nothing to overwrite locally.
            if slot.data.is_null() {
                continue;
            }
            store.save(key, &slot.data)?;
            on_change(key);
        }
        Ok(())
    }
}

/// Drops the first delivery of a subscription: it is the initial snapshot,
/// not a change, and applying it would redundantly overwrite local state
/// on every startup.
pub struct SnapshotGate {
    seen_snapshot: bool,
}

impl SnapshotGate {
    pub fn new() -> SnapshotGate {
        SnapshotGate {
            seen_snapshot: false,
        }
    }

    pub fn admit(&mut self, slot: RecordSlot) -> Option<RecordSlot> {
        if self.seen_snapshot {
            return Some(slot);
        }
        self.seen_snapshot = true;
        None
    }
}

impl Default for SnapshotGate {
    fn default() -> Self {
        SnapshotGate::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteConfig;
    use crate::remote::provider::Provider;
    use serde_json::json;
    use std::collections::HashMap;

    fn test_mirror() -> Arc<Mirror> {
        let mut config = HashMap::new();
        config.insert(
            "loopback_account".to_string(),
            toml::Value::String("dillyn@example.com".to_string()),
        );
        let remote = Remote::new(Provider::from_name("loopback"), RemoteConfig(config));
        Arc::new(Mirror::new(remote, User::Dillyn).unwrap())
    }

    #[test]
    fn test_mirror_requires_account() {
        let remote = Remote::new(
            Provider::from_name("loopback"),
            RemoteConfig(HashMap::new()),
        );
        assert!(matches!(
            Mirror::new(remote, User::Dillyn),
            Err(RetreatError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_remote_origin_save_is_never_pushed_back() {
        let mirror = test_mirror();
        let value = json!({"develop": []});

        mirror.after_local_save(RecordKey::Kanban, &value, WriteOrigin::Remote);
        assert_eq!(mirror.push_count(), 0);

        mirror.after_local_save(RecordKey::Kanban, &value, WriteOrigin::Local);
        assert_eq!(mirror.push_count(), 1);

        // The push fails (no such provider binary) but fire-and-forget
        // means flush still completes quietly.
        mirror.flush().await;
    }

    #[tokio::test]
    async fn test_unmirrored_records_are_never_pushed() {
        let mirror = test_mirror();

        // Preferences stay on the device; the other user's journal is not
        // this device's to mirror.
        mirror.after_local_save(
            RecordKey::UserPreferences,
            &json!({"current_user": "Dillyn"}),
            WriteOrigin::Local,
        );
        mirror.after_local_save(
            RecordKey::AshleeJournals,
            &json!({"daily": {}}),
            WriteOrigin::Local,
        );
        assert_eq!(mirror.push_count(), 0);

        mirror.after_local_save(RecordKey::DillynJournals, &json!({"daily": {}}), WriteOrigin::Local);
        assert_eq!(mirror.push_count(), 1);
    }

    #[test]
    fn test_snapshot_gate_drops_only_first_delivery() {
        let mut gate = SnapshotGate::new();
        let slot = |n: i64| RecordSlot {
            data: json!(n),
            updated_at: None,
            updated_by: None,
        };

        assert!(gate.admit(slot(1)).is_none(), "first delivery is the snapshot");
        assert_eq!(gate.admit(slot(2)).unwrap().data, json!(2));
        assert_eq!(gate.admit(slot(3)).unwrap().data, json!(3));
    }
}
