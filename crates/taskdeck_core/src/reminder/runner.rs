//! Background reminder loop.
//!
//! Runs [`ReminderScheduler::tick`] on a tokio interval and forwards fired
//! reminders over an unbounded channel. The loop ends when its cancellation
//! token fires or when the receiving side is dropped.

use super::{ReminderEvent, ReminderScheduler};
use crate::clock::Clock;
use crate::repo::kv_repo::KvRepository;
use crate::service::task_store::TaskStore;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Store handle shared between renderer commands and the reminder loop.
pub type SharedTaskStore<R, C> = Arc<Mutex<TaskStore<R, C>>>;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic driver for the reminder scheduler.
pub struct ReminderRunner<R: KvRepository, C: Clock> {
    store: SharedTaskStore<R, C>,
    scheduler: ReminderScheduler,
    events_tx: mpsc::UnboundedSender<ReminderEvent>,
    cancel: CancellationToken,
    interval: Duration,
}

impl<R, C> ReminderRunner<R, C>
where
    R: KvRepository + Send + 'static,
    C: Clock + 'static,
{
    pub fn new(
        store: SharedTaskStore<R, C>,
        scheduler: ReminderScheduler,
        events_tx: mpsc::UnboundedSender<ReminderEvent>,
    ) -> Self {
        Self {
            store,
            scheduler,
            events_tx,
            cancel: CancellationToken::new(),
            interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Overrides the scan period (default 60 s).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Ties the loop to an externally owned token, e.g. an app-wide shutdown.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Starts the loop on the current tokio runtime.
    ///
    /// The first scan happens one full interval after this call.
    pub fn spawn(self) -> ReminderHandle {
        let cancel = self.cancel.clone();
        let join = tokio::spawn(self.run());
        ReminderHandle {
            cancel,
            join: Some(join),
        }
    }

    async fn run(self) {
        info!(
            "event=reminder_loop module=reminder status=start interval_ms={} enabled={}",
            self.interval.as_millis(),
            self.scheduler.is_enabled()
        );
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("event=reminder_loop module=reminder status=stopped reason=cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.scan_once().await {
                        warn!("event=reminder_loop module=reminder status=stopped reason=receiver_closed");
                        break;
                    }
                }
            }
        }
    }

    /// Returns `false` once nobody is listening for events.
    async fn scan_once(&self) -> bool {
        if self.events_tx.is_closed() {
            return false;
        }
        let fired = {
            let mut store = self.store.lock().await;
            self.scheduler.tick(&mut *store)
        };

        let events = match fired {
            Ok(events) => events,
            Err(err) => {
                error!(
                    "event=reminder_tick module=reminder status=error error_code=tick_failed error={}",
                    err
                );
                return !self.events_tx.is_closed();
            }
        };

        events
            .into_iter()
            .all(|event| self.events_tx.send(event).is_ok())
    }
}

/// Owner handle for a spawned reminder loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct ReminderHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl ReminderHandle {
    /// Requests the loop to stop without waiting for it.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                error!(
                    "event=reminder_loop module=reminder status=error error_code=join_failed error={}",
                    err
                );
            }
        }
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
