//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the canonical task record and its wire shape.
//! - Own input normalization (text trim, due date format, priority labels).
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - `text` is never empty once a `Task` exists.

pub mod task;
