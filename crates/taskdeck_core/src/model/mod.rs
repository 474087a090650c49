//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the task record shared by store, views and reminders.
//! - Own input validation rules for task text, priority and due dates.
//!
//! # Invariants
//! - Every task is identified by a stable numeric `TaskId`.
//! - Deletion removes the record; there are no tombstones.

pub mod task;
