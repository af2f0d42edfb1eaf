//! Task domain model.
//!
//! # Responsibility
//! - Define the task tree node and its recurrence descriptor.
//! - Keep completion and child ordering rules next to the data they guard.
//!
//! # Invariants
//! - Tasks own their subtasks exclusively; the tree has no back-references.
//! - Sibling order is chronological by due date.

pub mod recurrence;
pub mod task;
