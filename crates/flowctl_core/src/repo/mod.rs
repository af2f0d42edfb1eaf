//! Persistence layer for the task tree.
//!
//! # Responsibility
//! - Define the flat text format and its codec.
//! - Define the repository contract used by use-case services.
//! - Keep file handling out of the store and service layers.
//!
//! # Invariants
//! - Corrupt content fails a load as a whole; it is never partially applied.
//! - A failed save leaves the previous persisted content in place.

pub mod codec;
pub mod task_repo;
