//! Task domain model.
//!
//! # Responsibility
//! - Define the single persisted entity and its wire shape.
//! - Validate user-supplied text and due dates before any write.
//!
//! # Invariants
//! - `id` is unique within a collection and never changes.
//! - `text` is trimmed and non-empty.
//! - `due_date` is stored at minute precision and was in the future at the
//!   time it was last written. It may fall into the past later.
//! - `notified_overdue` travels as `notifiedCompleted` on the wire.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Stable numeric task identifier.
pub type TaskId = u64;

/// Wire format for due dates (`datetime-local` style).
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DUE_DATE_FORMAT_WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// Task urgency, ordered high to low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: high=1, medium=2, low=3.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(TaskValidationError::InvalidPriority(other.to_string())),
        }
    }
}

/// Which one-shot reminders a task has already produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Unnotified,
    DueSoonNotified,
    OverdueNotified,
}

/// Input validation failures for task writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Text is empty after trimming.
    EmptyText,
    /// No due date was supplied where one is required.
    MissingDueDate,
    /// Due date is not strictly after the current time.
    DueDateNotInFuture {
        due: NaiveDateTime,
        now: NaiveDateTime,
    },
    /// Due date text could not be parsed.
    InvalidDueDate(String),
    /// Priority text is not one of high|medium|low.
    InvalidPriority(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text cannot be empty"),
            Self::MissingDueDate => write!(f, "please select a due date and time"),
            Self::DueDateNotInFuture { due, now } => write!(
                f,
                "due date {} must be later than the current minute {}; due times have minute precision",
                due.format(DUE_DATE_FORMAT),
                now.format(DUE_DATE_FORMAT)
            ),
            Self::InvalidDueDate(value) => write!(
                f,
                "invalid due date `{value}`; expected YYYY-MM-DDTHH:MM"
            ),
            Self::InvalidPriority(value) => write!(
                f,
                "invalid priority `{value}`; expected high|medium|low"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Local wall-clock due time. Empty string on the wire when unset.
    #[serde(default, with = "due_date_serde")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub notified_due_soon: bool,
    #[serde(default, rename = "notifiedCompleted")]
    pub notified_overdue: bool,
}

impl Task {
    /// Builds a fresh, incomplete task with cleared reminder flags.
    ///
    /// Callers are expected to have validated `text` and `due_date`.
    pub fn new(
        id: TaskId,
        text: impl Into<String>,
        priority: Priority,
        created_at: DateTime<Utc>,
        due_date: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            priority,
            completed: false,
            created_at,
            due_date,
            notified_due_soon: false,
            notified_overdue: false,
        }
    }

    /// Re-arms both reminders.
    pub fn reset_notifications(&mut self) {
        self.notified_due_soon = false;
        self.notified_overdue = false;
    }

    pub fn notification_state(&self) -> NotificationState {
        if self.notified_overdue {
            NotificationState::OverdueNotified
        } else if self.notified_due_soon {
            NotificationState::DueSoonNotified
        } else {
            NotificationState::Unnotified
        }
    }
}

/// Trims task text and rejects empty input.
pub fn validate_text(text: &str) -> Result<String, TaskValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Truncates a due date to minutes and checks it lies strictly after `now`.
pub fn validate_due_date(
    due: NaiveDateTime,
    now: DateTime<FixedOffset>,
) -> Result<NaiveDateTime, TaskValidationError> {
    let due = truncate_to_minute(due);
    let now = now.naive_local();
    if due <= now {
        return Err(TaskValidationError::DueDateNotInFuture { due, now });
    }
    Ok(due)
}

/// Parses `YYYY-MM-DDTHH:MM` (seconds optional). A space may replace the `T`.
pub fn parse_due_date(value: &str) -> Result<NaiveDateTime, TaskValidationError> {
    let normalized = value.trim().replacen(' ', "T", 1);
    NaiveDateTime::parse_from_str(&normalized, DUE_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, DUE_DATE_FORMAT_WITH_SECONDS))
        .map_err(|_| TaskValidationError::InvalidDueDate(value.trim().to_string()))
}

fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(value)
}

mod due_date_serde {
    use super::{parse_due_date, NaiveDateTime, DUE_DATE_FORMAT};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(due) => serializer.collect_str(&due.format(DUE_DATE_FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_due_date(text).map(Some).map_err(de::Error::custom),
        }
    }
}
