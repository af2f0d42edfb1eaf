//! Load-time recurrence advancement.
//!
//! # Responsibility
//! - Move persisted recurring tasks to the occurrence that applies today.
//! - Decide whether a recurring task's window has elapsed.
//!
//! # Invariants
//! - Runs before a task is inserted into the store, never after.
//! - Each task is evaluated on its own; a parent's outcome does not change
//!   how its subtask is advanced.

pub mod engine;
