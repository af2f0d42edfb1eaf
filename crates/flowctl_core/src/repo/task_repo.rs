//! Task repository contracts and flat-file implementation.
//!
//! # Responsibility
//! - Load a user's persisted task tree into a fresh store.
//! - Replace the persisted tree with the current store contents.
//!
//! # Invariants
//! - A missing backing file is created empty and reported as "not existed".
//! - Save is atomic: readers see the previous or the new document, never a
//!   partially written one.
//! - I/O failures are reported separately from malformed content.

use crate::config::{ConfigError, StorageConfig};
use crate::repo::codec::{CodecError, TaskCodec};
use crate::store::task_store::TaskStore;
use chrono::NaiveDate;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Backing file could not be read, created or replaced.
    Io(io::Error),
    /// Backing file content violates the task format.
    Codec(CodecError),
    Config(ConfigError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "task store I/O failed: {err}"),
            Self::Codec(err) => write!(f, "malformed task store: {err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<io::Error> for RepoError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CodecError> for RepoError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<ConfigError> for RepoError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Result of a load call.
#[derive(Debug)]
pub struct LoadOutcome {
    pub store: TaskStore,
    /// `false` on first run, when the backing file had to be created.
    pub existed: bool,
}

/// Repository interface for task tree persistence.
pub trait TaskRepository {
    /// Loads the persisted tree, advancing recurring tasks to `today`.
    fn load(&self, today: NaiveDate) -> RepoResult<LoadOutcome>;
    /// Replaces the persisted tree with `store`.
    fn save(&self, store: &TaskStore) -> RepoResult<()>;
}

/// Flat-file repository for one user identity.
#[derive(Debug, Clone)]
pub struct FileTaskRepository {
    path: PathBuf,
    codec: TaskCodec,
}

impl FileTaskRepository {
    /// Resolves the backing file of `username` under `storage`.
    pub fn for_user(storage: &StorageConfig, username: &str, codec: TaskCodec) -> RepoResult<Self> {
        let path = storage.path_for(username)?;
        Ok(Self { path, codec })
    }

    /// Uses an explicit backing file path.
    pub fn at_path(path: impl Into<PathBuf>, codec: TaskCodec) -> Self {
        Self {
            path: path.into(),
            codec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskRepository for FileTaskRepository {
    fn load(&self, today: NaiveDate) -> RepoResult<LoadOutcome> {
        let started_at = Instant::now();
        info!("event=store_load module=repo status=start");

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                create_empty(&self.path).map_err(|err| {
                    error!(
                        "event=store_load module=repo status=error error_code=create_failed duration_ms={} error={}",
                        started_at.elapsed().as_millis(),
                        err
                    );
                    RepoError::Io(err)
                })?;
                info!(
                    "event=store_load module=repo status=ok existed=false duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Ok(LoadOutcome {
                    store: TaskStore::new(),
                    existed: false,
                });
            }
            Err(err) => {
                error!(
                    "event=store_load module=repo status=error error_code=read_failed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        match self.codec.decode_bytes(&bytes, today) {
            Ok(store) => {
                info!(
                    "event=store_load module=repo status=ok existed=true tasks={} duration_ms={}",
                    store.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(LoadOutcome {
                    store,
                    existed: true,
                })
            }
            Err(err) => {
                error!(
                    "event=store_load module=repo status=error error_code=malformed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn save(&self, store: &TaskStore) -> RepoResult<()> {
        let started_at = Instant::now();
        let document = self.codec.encode(store)?;

        match write_atomic(&self.path, &document) {
            Ok(()) => {
                info!(
                    "event=store_save module=repo status=ok tasks={} bytes={} duration_ms={}",
                    store.len(),
                    document.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=repo status=error error_code=write_failed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

fn create_empty(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // `create_new` keeps a concurrently created file intact.
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err),
    }
}

/// Writes a sibling temp file, syncs it, then renames it over `path`.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_name = format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("tasks"),
        std::process::id()
    );
    let tmp_path = path
        .parent()
        .map(|parent| parent.join(&tmp_name))
        .unwrap_or_else(|| PathBuf::from(&tmp_name));

    let result = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp_path, path));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
