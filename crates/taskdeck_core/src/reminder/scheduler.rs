//! Synchronous reminder scan over a task store.

use super::{ReminderEvent, ReminderKind};
use crate::clock::Clock;
use crate::model::task::Task;
use crate::repo::kv_repo::KvRepository;
use crate::service::display::{format_due_date, time_until_due};
use crate::service::task_store::{TaskStore, TaskStoreResult};
use chrono::{DateTime, Duration, FixedOffset};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const DEFAULT_INTERVAL_SECS: u64 = 60;
const DEFAULT_DUE_SOON_WINDOW_MINS: i64 = 30;

/// Reminder feature settings (`[reminders]` in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub due_soon_window_mins: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_INTERVAL_SECS,
            due_soon_window_mins: DEFAULT_DUE_SOON_WINDOW_MINS,
        }
    }
}

impl ReminderConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn due_soon_window(&self) -> Duration {
        Duration::minutes(self.due_soon_window_mins.max(0))
    }
}

/// Decides which reminders are due and records them in the store.
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    enabled: bool,
    window: Duration,
}

impl ReminderScheduler {
    pub fn new(config: &ReminderConfig) -> Self {
        Self {
            enabled: config.enabled,
            window: config.due_soon_window(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reminder a task should fire right now, if any.
    ///
    /// Due-soon takes precedence, so one scan never yields both kinds.
    pub fn pending_reminder(&self, task: &Task, now: DateTime<FixedOffset>) -> Option<ReminderKind> {
        if task.completed {
            return None;
        }
        let remaining = time_until_due(task.due_date?, now);

        if !task.notified_due_soon && remaining > Duration::zero() && remaining <= self.window {
            Some(ReminderKind::DueSoon)
        } else if !task.notified_overdue && remaining <= Duration::zero() {
            Some(ReminderKind::Overdue)
        } else {
            None
        }
    }

    /// Scans the store once, marking and returning every fired reminder.
    ///
    /// Each flag is persisted before its event is returned. A write failure
    /// stops the scan; events for flags already persisted are still
    /// returned, and the error is only propagated when nothing was flagged.
    pub fn tick<R: KvRepository, C: Clock>(
        &self,
        store: &mut TaskStore<R, C>,
    ) -> TaskStoreResult<Vec<ReminderEvent>> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let now = store.now();
        let due: Vec<(Task, ReminderKind)> = store
            .all()
            .iter()
            .filter_map(|task| {
                self.pending_reminder(task, now)
                    .map(|kind| (task.clone(), kind))
            })
            .collect();

        let mut events = Vec::with_capacity(due.len());
        for (task, kind) in due {
            let marked = match store.mark_notified(task.id, kind) {
                Ok(marked) => marked,
                Err(err) if events.is_empty() => return Err(err),
                Err(err) => {
                    warn!(
                        "event=reminder_tick module=reminder status=partial id={} kind={} emitted={} error={}",
                        task.id,
                        kind,
                        events.len(),
                        err
                    );
                    break;
                }
            };
            if marked.is_none() {
                continue;
            }
            info!(
                "event=reminder_emit module=reminder status=ok id={} kind={}",
                task.id, kind
            );
            events.push(ReminderEvent {
                kind,
                task_id: task.id,
                text: task.text,
                due_label: format_due_date(task.due_date),
            });
        }

        debug!(
            "event=reminder_tick module=reminder status=ok scanned={} emitted={}",
            store.len(),
            events.len()
        );
        Ok(events)
    }
}
