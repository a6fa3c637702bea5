//! Read-side projections over the task collection.
//!
//! # Responsibility
//! - Derive the displayed list from the store without copying or mutating.

pub mod projection;
