use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{session::UserId, store::WeekStore, utils::clock::Clock};

use super::week::WeekLog;

/// Edits inside this window coalesce into a single write.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

/// A full-week snapshot queued for persistence. Later snapshots for the same
/// week supersede earlier ones; only the last state after a quiet period
/// reaches the store.
#[derive(Debug, Clone)]
pub struct WeekEdit {
    pub user: UserId,
    pub week_key: String,
    pub log: WeekLog,
}

/// Debounced week persistence. Every incoming edit replaces the pending
/// snapshot and restarts the countdown; the write fires once the countdown
/// elapses uninterrupted. At most one countdown is pending at a time, and an
/// edit targeting a different week key flushes the previous week right away
/// so no state is lost when the displayed week changes.
pub struct DebouncedSaver<S> {
    store: S,
    receiver: mpsc::Receiver<WeekEdit>,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
    quiet_period: Duration,
}

impl<S: WeekStore> DebouncedSaver<S> {
    pub fn new(
        store: S,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
        quiet_period: Duration,
    ) -> (mpsc::Sender<WeekEdit>, Self) {
        let (sender, receiver) = mpsc::channel(10);
        (
            sender,
            Self {
                store,
                receiver,
                shutdown,
                clock,
                quiet_period,
            },
        )
    }

    /// Executes the saver event loop. Returns once the edit channel closes or
    /// the shutdown token fires, flushing any pending snapshot first.
    pub async fn run(mut self) -> Result<()> {
        let mut pending: Option<WeekEdit> = None;
        let mut deadline = self.clock.instant();

        loop {
            tokio::select! {
                edit = self.receiver.recv() => match edit {
                    Some(edit) => {
                        if pending
                            .as_ref()
                            .is_some_and(|p| p.week_key != edit.week_key || p.user != edit.user)
                        {
                            // Switching weeks writes the old one out immediately,
                            // the countdown only ever guards a single week key.
                            let previous = pending.take().expect("checked above");
                            let _ = self.save(previous).await;
                        }
                        debug!("Pending snapshot for week {}", edit.week_key);
                        deadline = self.clock.instant() + self.quiet_period;
                        pending = Some(edit);
                    }
                    None => break,
                },
                _ = self.shutdown.cancelled() => break,
                _ = self.clock.sleep_until(deadline), if pending.is_some() => {
                    let edit = pending.take().expect("guarded by pending.is_some()");
                    // Failures are reported and the loop keeps serving edits;
                    // the in-memory state of the caller stays intact.
                    let _ = self.save(edit).await;
                }
            }
        }

        match pending.take() {
            Some(edit) => self.save(edit).await,
            None => Ok(()),
        }
    }

    async fn save(&self, edit: WeekEdit) -> Result<()> {
        self.store
            .save_week(&edit.user, &edit.week_key, edit.log)
            .await
            .inspect(|_| info!("Persisted week {} for {}", edit.week_key, edit.user))
            .inspect_err(|e| error!("Failed to persist week {}: {e:?}", edit.week_key))
    }
}
