//! Due-date reminders.
//!
//! # Responsibility
//! - Detect tasks entering the due-soon window or passing their deadline.
//! - Emit one event per task per transition and record it in the store.
//! - Drive periodic scans from a background task with explicit teardown.
//!
//! # Invariants
//! - Completed tasks never produce reminders.
//! - Each reminder kind fires at most once until priority or due date is edited.
//! - A task produces at most one reminder per tick.

pub mod runner;
pub mod scheduler;

use crate::model::task::TaskId;
use std::fmt::{Display, Formatter};

pub use runner::{ReminderHandle, ReminderRunner, SharedTaskStore};
pub use scheduler::{ReminderConfig, ReminderScheduler};

/// Which transition a reminder reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    DueSoon,
    Overdue,
}

impl ReminderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DueSoon => "due_soon",
            Self::Overdue => "overdue",
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification payload handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEvent {
    pub kind: ReminderKind,
    pub task_id: TaskId,
    pub text: String,
    /// Due timestamp formatted for display.
    pub due_label: String,
}

impl ReminderEvent {
    pub fn title(&self) -> &'static str {
        match self.kind {
            ReminderKind::DueSoon => "Task Due Soon!",
            ReminderKind::Overdue => "Task Overdue!",
        }
    }

    pub fn message(&self) -> String {
        match self.kind {
            ReminderKind::DueSoon => format!("Task: \"{}\" is due at {}", self.text, self.due_label),
            ReminderKind::Overdue => format!("Task: \"{}\" was due at {}", self.text, self.due_label),
        }
    }
}
