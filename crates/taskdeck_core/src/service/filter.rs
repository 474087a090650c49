//! Filter/sort engine for task list views.
//!
//! # Invariants
//! - `all` and `priority` views are stably sorted by priority rank.
//! - `pending` and `completed` views keep newest-first store order.

use crate::model::task::Task;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Named view selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Pending,
    Completed,
    Priority,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 4] = [
        FilterMode::All,
        FilterMode::Pending,
        FilterMode::Completed,
        FilterMode::Priority,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Priority => "priority",
        }
    }

    fn includes(self, task: &Task) -> bool {
        match self {
            Self::All | Self::Priority => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }

    fn sorts_by_priority(self) -> bool {
        matches!(self, Self::All | Self::Priority)
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilterMode(pub String);

impl Display for UnknownFilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown filter `{}`; expected all|pending|completed|priority",
            self.0
        )
    }
}

impl Error for UnknownFilterMode {}

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or(UnknownFilterMode(normalized))
    }
}

/// Derives the ordered view for `mode` from a newest-first task slice.
pub fn filtered_view(tasks: &[Task], mode: FilterMode) -> Vec<Task> {
    let mut view: Vec<Task> = tasks
        .iter()
        .filter(|task| mode.includes(task))
        .cloned()
        .collect();

    if mode.sorts_by_priority() {
        // `sort_by_key` is stable, so equal ranks keep store order.
        view.sort_by_key(|task| task.priority.rank());
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use chrono::Utc;
    use rstest::rstest;

    fn task(id: u64, priority: Priority, completed: bool) -> Task {
        let mut task = Task::new(id, format!("task {id}"), priority, Utc::now(), None);
        task.completed = completed;
        task
    }

    fn sample() -> Vec<Task> {
        vec![
            task(6, Priority::Low, false),
            task(5, Priority::High, true),
            task(4, Priority::Medium, false),
            task(3, Priority::High, false),
            task(2, Priority::Low, true),
            task(1, Priority::Medium, true),
        ]
    }

    fn ids(view: &[Task]) -> Vec<u64> {
        view.iter().map(|task| task.id).collect()
    }

    #[rstest]
    #[case::all(FilterMode::All, vec![5, 3, 4, 1, 6, 2])]
    #[case::priority(FilterMode::Priority, vec![5, 3, 4, 1, 6, 2])]
    #[case::pending(FilterMode::Pending, vec![6, 4, 3])]
    #[case::completed(FilterMode::Completed, vec![5, 2, 1])]
    fn view_order_matches_mode(#[case] mode: FilterMode, #[case] expected: Vec<u64>) {
        assert_eq!(ids(&filtered_view(&sample(), mode)), expected);
    }

    #[test]
    fn pending_and_completed_partition_the_collection() {
        let tasks = sample();
        let pending = filtered_view(&tasks, FilterMode::Pending);
        let completed = filtered_view(&tasks, FilterMode::Completed);

        assert_eq!(pending.len() + completed.len(), tasks.len());
        assert!(pending.iter().all(|task| !task.completed));
        assert!(completed.iter().all(|task| task.completed));
    }

    #[rstest]
    #[case("all", FilterMode::All)]
    #[case(" Pending ", FilterMode::Pending)]
    #[case("COMPLETED", FilterMode::Completed)]
    #[case("priority", FilterMode::Priority)]
    fn parses_mode_names(#[case] raw: &str, #[case] expected: FilterMode) {
        assert_eq!(raw.parse::<FilterMode>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "overdue".parse::<FilterMode>().unwrap_err();
        assert_eq!(err, UnknownFilterMode("overdue".to_string()));
    }
}
