//! In-memory chronological views over the task tree.
//!
//! # Responsibility
//! - Hold the root task list and the global all-tasks index.
//! - Provide the only insertion paths that keep both views complete.

pub mod task_store;
