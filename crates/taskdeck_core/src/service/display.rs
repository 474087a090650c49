//! Derived read-only projections for renderers: counts, labels, indicators.
//!
//! Nothing here mutates tasks; every helper takes the current time
//! explicitly so callers control the clock.

use crate::model::task::Task;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};

/// Label used when a task carries no due date.
pub const NO_DUE_DATE_LABEL: &str = "No due date";
const DISPLAY_DUE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Aggregate counts over the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    /// Rounded share of completed tasks, 0 for an empty list.
    pub progress_percent: u8,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|task| task.completed).count();
        let progress_percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            total,
            pending: total - completed,
            completed,
            progress_percent,
        }
    }
}

/// Visual urgency of an incomplete task with a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueIndicator {
    DueSoon,
    Overdue,
}

/// Time left until `due`, measured in local wall-clock terms.
pub fn time_until_due(due: NaiveDateTime, now: DateTime<FixedOffset>) -> Duration {
    due - now.naive_local()
}

/// Classifies a task as due soon (within `window`) or overdue.
///
/// Completed tasks and tasks without a due date have no indicator.
pub fn due_indicator(
    task: &Task,
    now: DateTime<FixedOffset>,
    window: Duration,
) -> Option<DueIndicator> {
    if task.completed {
        return None;
    }
    let remaining = time_until_due(task.due_date?, now);
    if remaining <= Duration::zero() {
        Some(DueIndicator::Overdue)
    } else if remaining <= window {
        Some(DueIndicator::DueSoon)
    } else {
        None
    }
}

pub fn format_due_date(due: Option<NaiveDateTime>) -> String {
    match due {
        Some(due) => due.format(DISPLAY_DUE_FORMAT).to_string(),
        None => NO_DUE_DATE_LABEL.to_string(),
    }
}

/// Human-friendly age of a task, e.g. "3h ago" or "Yesterday".
pub fn relative_created_label(created_at: DateTime<Utc>, now: DateTime<FixedOffset>) -> String {
    let elapsed = now.with_timezone(&Utc) - created_at;
    let hours = elapsed.num_hours();
    let days = hours.div_euclid(24);

    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{days} days ago")
    } else {
        created_at
            .with_timezone(now.offset())
            .format("%Y-%m-%d")
            .to_string()
    }
}

/// Whether the task was created on `now`'s local calendar day.
pub fn created_today(task: &Task, now: DateTime<FixedOffset>) -> bool {
    task.created_at.with_timezone(now.offset()).date_naive() == now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-06-10T12:00:00+02:00").unwrap()
    }

    fn task_due_in(minutes: i64) -> Task {
        let due = now().naive_local() + Duration::minutes(minutes);
        Task::new(1, "t", Priority::High, now().with_timezone(&Utc), Some(due))
    }

    #[test]
    fn stats_count_and_round_progress() {
        let mut tasks = vec![task_due_in(10), task_due_in(20), task_due_in(30)];
        assert_eq!(TaskStats::from_tasks(&tasks).progress_percent, 0);

        tasks[0].completed = true;
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.progress_percent, 33);

        tasks[1].completed = true;
        assert_eq!(TaskStats::from_tasks(&tasks).progress_percent, 67);
        assert_eq!(TaskStats::from_tasks(&[]), TaskStats::default());
    }

    #[test]
    fn due_indicator_windows() {
        let window = Duration::minutes(30);
        assert_eq!(due_indicator(&task_due_in(45), now(), window), None);
        assert_eq!(
            due_indicator(&task_due_in(30), now(), window),
            Some(DueIndicator::DueSoon)
        );
        assert_eq!(
            due_indicator(&task_due_in(0), now(), window),
            Some(DueIndicator::Overdue)
        );

        let mut done = task_due_in(-5);
        done.completed = true;
        assert_eq!(due_indicator(&done, now(), window), None);
    }

    #[test]
    fn relative_labels_cover_each_bucket() {
        let at = |hours: i64| now().with_timezone(&Utc) - Duration::hours(hours);
        assert_eq!(relative_created_label(at(0), now()), "Just now");
        assert_eq!(relative_created_label(at(5), now()), "5h ago");
        assert_eq!(relative_created_label(at(30), now()), "Yesterday");
        assert_eq!(relative_created_label(at(72), now()), "3 days ago");
        assert_eq!(relative_created_label(at(24 * 10), now()), "2026-05-31");
    }

    #[test]
    fn created_today_uses_local_day() {
        let mut task = task_due_in(10);
        assert!(created_today(&task, now()));

        // 23:30 UTC on June 9th is already June 10th at +02:00.
        task.created_at = DateTime::parse_from_rfc3339("2026-06-09T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(created_today(&task, now()));

        task.created_at = DateTime::parse_from_rfc3339("2026-06-09T21:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(!created_today(&task, now()));
    }

    #[test]
    fn format_due_date_handles_missing() {
        assert_eq!(format_due_date(None), NO_DUE_DATE_LABEL);
        assert_eq!(
            format_due_date(task_due_in(60).due_date),
            "2026-06-10 13:00"
        );
    }
}
