//! Debounced auto-save.
//!
//! Wraps a save function so rapid edits (every keystroke) collapse into
//! one save after a quiet period, while blur/exit can force an immediate
//! save. The timer task owns the save closure; the handle is cheap to
//! clone into UI callbacks.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

enum Msg {
    Trigger,
    SaveNow,
    Cancel,
}

#[derive(Clone)]
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Msg>,
}

impl AutoSaver {
    /// Spawn the timer task. `save` runs on it, so it reads whatever state
    /// is current when the timer actually fires.
    pub fn new<F>(delay: Duration, mut save: F) -> AutoSaver
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();

        tokio::spawn(async move {
            let mut deadline: Option<Instant> = None;
            loop {
                let timer = async {
                    match deadline {
                        Some(at) => sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                };

                tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(Msg::Trigger) => deadline = Some(Instant::now() + delay),
                        Some(Msg::SaveNow) => {
                            deadline = None;
                            save();
                        }
                        Some(Msg::Cancel) => deadline = None,
                        // Handle dropped: discard any pending timer.
                        None => break,
                    },
                    _ = timer => {
                        deadline = None;
                        save();
                    }
                }
            }
        });

        AutoSaver { tx }
    }

    /// Schedule a save after the quiet period, resetting any pending timer.
    pub fn trigger(&self) {
        let _ = self.tx.send(Msg::Trigger);
    }

    /// Save immediately and cancel any pending timer.
    pub fn save_now(&self) {
        let _ = self.tx.send(Msg::SaveNow);
    }

    /// Discard a pending save without firing it.
    pub fn cancel(&self) {
        let _ = self.tx.send(Msg::Cancel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// A recording save target: remembers each saved snapshot of `state`.
    fn recording() -> (Arc<Mutex<String>>, Arc<Mutex<Vec<String>>>) {
        (Arc::default(), Arc::default())
    }

    fn saver(
        delay_ms: u64,
        state: &Arc<Mutex<String>>,
        saves: &Arc<Mutex<Vec<String>>>,
    ) -> AutoSaver {
        let state = Arc::clone(state);
        let saves = Arc::clone(saves);
        AutoSaver::new(Duration::from_millis(delay_ms), move || {
            saves.lock().unwrap().push(state.lock().unwrap().clone());
        })
    }

    /// Let the timer task process everything queued so far.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_triggers_collapse_into_one_save_with_last_state() {
        let (state, saves) = recording();
        let autosaver = saver(1000, &state, &saves);

        for i in 1..=5 {
            *state.lock().unwrap() = format!("draft {i}");
            autosaver.trigger();
            tokio::time::advance(Duration::from_millis(200)).await;
        }
        settle().await;
        assert!(saves.lock().unwrap().is_empty(), "still inside the window");

        tokio::time::advance(Duration::from_millis(1000)).await;
        settle().await;

        let saves = saves.lock().unwrap();
        assert_eq!(saves.len(), 1, "exactly one save for 5 triggers");
        assert_eq!(saves[0], "draft 5", "save observes the last-trigger state");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_fires_immediately_and_cancels_timer() {
        let (state, saves) = recording();
        let autosaver = saver(1000, &state, &saves);

        *state.lock().unwrap() = "typed".into();
        autosaver.trigger();
        autosaver.save_now();
        settle().await;
        assert_eq!(saves.lock().unwrap().len(), 1);

        // The debounce timer was cancelled: nothing fires later.
        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(saves.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_save() {
        let (state, saves) = recording();
        let autosaver = saver(1000, &state, &saves);

        autosaver.trigger();
        autosaver.cancel();
        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;

        assert!(saves.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_after_fire_schedules_again() {
        let (state, saves) = recording();
        let autosaver = saver(500, &state, &saves);

        *state.lock().unwrap() = "first".into();
        autosaver.trigger();
        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;

        *state.lock().unwrap() = "second".into();
        autosaver.trigger();
        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;

        assert_eq!(*saves.lock().unwrap(), vec!["first", "second"]);
    }
}
