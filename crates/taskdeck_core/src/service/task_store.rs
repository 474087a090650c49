//! Task store: the single owner of the task collection.
//!
//! # Responsibility
//! - Provide add/update/toggle/delete entry points for renderers.
//! - Persist the full collection under one key after every mutation.
//! - Rehydrate from storage at startup, tolerating unreadable data.
//! - Notify registered listeners after each committed change.
//!
//! # Invariants
//! - Collection order is newest-first; new tasks are prepended.
//! - New ids are `max(existing) + 1`, or 1 for an empty collection.
//! - A mutation is committed to memory only after its write succeeds.
//! - Validation failures never touch memory or storage.
//! - Unknown ids on toggle/update/delete are silent no-ops.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{
    validate_due_date, validate_text, Priority, Task, TaskId, TaskValidationError,
};
use crate::repo::kv_repo::{KvRepository, RepoError};
use crate::reminder::ReminderKind;
use crate::service::display::TaskStats;
use crate::service::filter::{filtered_view, FilterMode};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key holding the serialized collection.
pub const TASKS_KEY: &str = "tasks";
/// Text of the demo task created on first launch.
pub const SAMPLE_TASK_TEXT: &str = "Start a new journey with this task!";

/// Error for task store writes.
#[derive(Debug)]
pub enum TaskStoreError {
    Validation(TaskValidationError),
    Repo(RepoError),
}

impl Display for TaskStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "failed to persist tasks: {err}"),
        }
    }
}

impl Error for TaskStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for TaskStoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for TaskStoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Partial edit request. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDateTime>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.priority.is_none() && self.due_date.is_none()
    }

    /// Editing priority or due date re-arms both reminders.
    fn rearms_reminders(&self) -> bool {
        self.priority.is_some() || self.due_date.is_some()
    }
}

/// A committed change, delivered to listeners after persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    Added(Task),
    Updated(Task),
    Toggled(Task),
    Deleted(TaskId),
    Notified { id: TaskId, kind: ReminderKind },
}

/// Observer for committed task changes.
pub trait TaskListener: Send + Sync {
    fn on_task_change(&self, change: &TaskChange);
}

impl<F> TaskListener for F
where
    F: Fn(&TaskChange) + Send + Sync,
{
    fn on_task_change(&self, change: &TaskChange) {
        self(change)
    }
}

/// In-memory task collection backed by a key-value repository.
pub struct TaskStore<R: KvRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    tasks: Vec<Task>,
    listeners: Vec<Box<dyn TaskListener>>,
}

impl<R: KvRepository, C: Clock> TaskStore<R, C> {
    /// Loads the collection stored under [`TASKS_KEY`].
    ///
    /// Missing, unreadable or unparseable data yields an empty collection.
    pub fn open(repo: R, clock: C) -> Self {
        let tasks = load_tasks(&repo);
        Self {
            repo,
            clock,
            tasks,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener for committed changes.
    pub fn subscribe(&mut self, listener: impl TaskListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    /// Read-only snapshot, newest first.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn filtered_view(&self, mode: FilterMode) -> Vec<Task> {
        filtered_view(&self.tasks, mode)
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    /// Creates a task and prepends it to the collection.
    ///
    /// # Errors
    /// - `Validation` for empty text, a missing due date, or a due date that
    ///   is not strictly in the future.
    /// - `Repo` when the write fails; the collection is unchanged.
    pub fn add(
        &mut self,
        text: &str,
        priority: Priority,
        due_date: Option<NaiveDateTime>,
    ) -> TaskStoreResult<Task> {
        let now = self.clock.now();
        let text = validate_text(text)?;
        let due = due_date.ok_or(TaskValidationError::MissingDueDate)?;
        let due = validate_due_date(due, now)?;

        let task = Task::new(
            self.next_id(),
            text,
            priority,
            now.with_timezone(&Utc),
            Some(due),
        );
        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task.clone());
        next.extend(self.tasks.iter().cloned());

        self.commit("task_add", next)?;
        info!(
            "event=task_add module=store status=ok id={} priority={}",
            task.id, task.priority
        );
        self.emit(TaskChange::Added(task.clone()));
        Ok(task)
    }

    /// Flips completion. Returns `None` when the id is unknown.
    pub fn toggle_completed(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let Some(index) = self.position(id) else {
            info!("event=task_toggle module=store status=skipped reason=not_found id={id}");
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        next[index].completed = !next[index].completed;
        let toggled = next[index].clone();

        self.commit("task_toggle", next)?;
        info!(
            "event=task_toggle module=store status=ok id={} completed={}",
            id, toggled.completed
        );
        self.emit(TaskChange::Toggled(toggled.clone()));
        Ok(Some(toggled))
    }

    /// Applies a partial edit. Returns `None` when the id is unknown.
    ///
    /// Provided text must be non-empty and a provided due date must be in
    /// the future. Setting priority or due date clears both reminder flags.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> TaskStoreResult<Option<Task>> {
        let now = self.clock.now();
        let text = patch.text.as_deref().map(validate_text).transpose()?;
        let due = patch
            .due_date
            .map(|due| validate_due_date(due, now))
            .transpose()?;

        let Some(index) = self.position(id) else {
            info!("event=task_update module=store status=skipped reason=not_found id={id}");
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        let task = &mut next[index];
        if let Some(text) = text {
            task.text = text;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if due.is_some() {
            task.due_date = due;
        }
        if patch.rearms_reminders() {
            task.reset_notifications();
        }
        let updated = task.clone();

        self.commit("task_update", next)?;
        info!(
            "event=task_update module=store status=ok id={} rearmed={}",
            id,
            patch.rearms_reminders()
        );
        self.emit(TaskChange::Updated(updated.clone()));
        Ok(Some(updated))
    }

    /// Removes a task. Returns the removed task, or `None` when absent.
    pub fn delete(&mut self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let Some(index) = self.position(id) else {
            info!("event=task_delete module=store status=skipped reason=not_found id={id}");
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        let removed = next.remove(index);

        self.commit("task_delete", next)?;
        info!("event=task_delete module=store status=ok id={id}");
        self.emit(TaskChange::Deleted(id));
        Ok(Some(removed))
    }

    /// Adds the first-launch demo task when the collection is empty.
    pub fn seed_sample_if_empty(&mut self) -> TaskStoreResult<Option<Task>> {
        if !self.tasks.is_empty() {
            return Ok(None);
        }
        let due = self.clock.now().naive_local() + Duration::days(1);
        self.add(SAMPLE_TASK_TEXT, Priority::High, Some(due)).map(Some)
    }

    /// Sets the reminder flag for `kind` and persists. Unknown ids are ignored.
    pub(crate) fn mark_notified(
        &mut self,
        id: TaskId,
        kind: ReminderKind,
    ) -> TaskStoreResult<Option<Task>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        match kind {
            ReminderKind::DueSoon => next[index].notified_due_soon = true,
            ReminderKind::Overdue => next[index].notified_overdue = true,
        }
        let marked = next[index].clone();

        self.commit("task_notify", next)?;
        self.emit(TaskChange::Notified { id, kind });
        Ok(Some(marked))
    }

    fn next_id(&self) -> TaskId {
        self.tasks.iter().map(|task| task.id).max().map_or(1, |max| max + 1)
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn commit(&mut self, event: &'static str, next: Vec<Task>) -> TaskStoreResult<()> {
        if let Err(err) = persist_tasks(&mut self.repo, &next) {
            error!(
                "event={} module=store status=error error_code=persist_failed error={}",
                event, err
            );
            return Err(err.into());
        }
        self.tasks = next;
        Ok(())
    }

    fn emit(&self, change: TaskChange) {
        for listener in &self.listeners {
            listener.on_task_change(&change);
        }
    }
}

fn load_tasks(repo: &impl KvRepository) -> Vec<Task> {
    let raw = match repo.get_value(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("event=tasks_load module=store status=ok source=empty count=0");
            return Vec::new();
        }
        Err(err) => {
            warn!("event=tasks_load module=store status=degraded error_code=read_failed error={err}");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => {
            info!(
                "event=tasks_load module=store status=ok source=storage count={}",
                tasks.len()
            );
            tasks
        }
        Err(err) => {
            warn!(
                "event=tasks_load module=store status=degraded error_code=decode_failed bytes={} error={}",
                raw.len(),
                err
            );
            Vec::new()
        }
    }
}

fn persist_tasks(repo: &mut impl KvRepository, tasks: &[Task]) -> Result<(), RepoError> {
    let encoded = serde_json::to_string(tasks)?;
    repo.set_value(TASKS_KEY, &encoded)
}
