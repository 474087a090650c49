//! Core domain logic for TaskDeck.
//! This crate is the single source of truth for task invariants; renderers
//! (the CLI today) only call into it.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LoggingConfig, StorageConfig, TaskDeckConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    parse_due_date, NotificationState, Priority, Task, TaskId, TaskValidationError,
};
pub use reminder::{
    ReminderConfig, ReminderEvent, ReminderHandle, ReminderKind, ReminderRunner,
    ReminderScheduler, SharedTaskStore,
};
pub use repo::kv_repo::{
    KvRepository, MemoryKvRepository, RepoError, RepoResult, SqliteKvRepository,
};
pub use service::display::{
    created_today, due_indicator, format_due_date, relative_created_label, DueIndicator,
    TaskStats,
};
pub use service::filter::{filtered_view, FilterMode, UnknownFilterMode};
pub use service::task_store::{
    TaskChange, TaskListener, TaskPatch, TaskStore, TaskStoreError, TaskStoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
