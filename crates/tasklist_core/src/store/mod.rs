//! In-memory task collection with write-through persistence.
//!
//! # Responsibility
//! - Own the ordered task collection for one session.
//! - Validate input, assign ids and creation timestamps.
//! - Hand every mutation to a `TaskPersistence` adapter before committing it.

pub mod task_store;
