//! Core domain logic for flowctl.
//! This crate is the single source of truth for task tree invariants,
//! recurrence advancement and the flat-file persistence format.

pub mod config;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{CodecConfig, ConfigError, StorageConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::recurrence::{Recurrence, RecurrenceUnit};
pub use model::task::{Task, TaskId, TaskValidationError};
pub use recurrence::engine::{advance, Advancement};
pub use repo::codec::{CodecError, CodecResult, TaskCodec};
pub use repo::task_repo::{
    FileTaskRepository, LoadOutcome, RepoError, RepoResult, TaskRepository,
};
pub use service::task_service::{
    ScheduleTaskRequest, ServiceError, ServiceResult, SubtaskRequest, TaskService,
};
pub use store::task_store::{StoreError, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
