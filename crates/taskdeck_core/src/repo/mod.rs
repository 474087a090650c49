//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the key-value storage contract used by the task store.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs report transport failures; they never interpret the
//!   stored blobs.

pub mod kv_repo;
