//! Core use-case services.
//!
//! # Responsibility
//! - Own the task collection and its mutation rules (`task_store`).
//! - Derive ordered views (`filter`) and read-only projections (`display`).
//! - Keep renderers decoupled from storage details.

pub mod display;
pub mod filter;
pub mod task_store;
