//! In-memory chronological task store.
//!
//! # Responsibility
//! - Own every root task and, through them, the whole task tree.
//! - Maintain a global chronological index over tasks at every depth.
//!
//! # Invariants
//! - `top_level` and every child list are sorted ascending by due date.
//! - `all_tasks` holds one entry per registered task, sorted ascending by
//!   the due date the task had when it was registered.
//! - Equal dates: the newest entry is placed before older ones.
//! - Entries are never removed and never re-sorted. Callers must finalize a
//!   task's due date before inserting it.

use crate::model::task::{lower_bound, Task, TaskId};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store insertion and lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Parent passed to `attach_subtask` is not in this store.
    ParentNotFound(TaskId),
    /// Target task is not in this store.
    TaskNotFound(TaskId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParentNotFound(id) => write!(f, "parent task not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for StoreError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    due_date: NaiveDate,
    id: TaskId,
}

/// Chronological store over the task universe.
#[derive(Debug, Default)]
pub struct TaskStore {
    top_level: Vec<Task>,
    all_tasks: Vec<IndexEntry>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root tasks in chronological order.
    pub fn top_level(&self) -> &[Task] {
        &self.top_level
    }

    /// Number of registered tasks across all depths.
    pub fn len(&self) -> usize {
        self.all_tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_tasks.is_empty()
    }

    /// Inserts a root task and registers it (not its children) globally.
    ///
    /// Returns the id of the inserted task.
    pub fn insert_top_level(&mut self, task: Task) -> TaskId {
        let id = task.id();
        let due_date = task.due_date;
        let index = lower_bound(&self.top_level, due_date, |root| root.due_date);
        self.top_level.insert(index, task);
        self.register(id, due_date);
        id
    }

    /// Inserts a root task and registers every node of its subtree.
    ///
    /// Used for trees built off-store, e.g. by [`Task::duplicate`].
    pub fn insert_top_level_tree(&mut self, task: Task) -> TaskId {
        let mut entries = Vec::new();
        task.walk(&mut |node, _| entries.push((node.id(), node.due_date)));

        let root_id = task.id();
        let index = lower_bound(&self.top_level, task.due_date, |root| root.due_date);
        self.top_level.insert(index, task);
        for (id, due_date) in entries {
            self.register(id, due_date);
        }
        root_id
    }

    /// Adds one task (not its children) to the global index.
    pub fn register_all(&mut self, task: &Task) {
        self.register(task.id(), task.due_date);
    }

    /// Attaches `child` under `parent` and registers it globally.
    ///
    /// # Errors
    /// - `ParentNotFound` when `parent` is not in this store; `child` is dropped.
    pub fn attach_subtask(&mut self, parent: TaskId, child: Task) -> StoreResult<TaskId> {
        let id = child.id();
        let due_date = child.due_date;
        let parent_task = self
            .find_mut(parent)
            .ok_or(StoreError::ParentNotFound(parent))?;
        parent_task.add_subtask(child);
        self.register(id, due_date);
        Ok(id)
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.top_level.iter().find_map(|root| root.find(id))
    }

    pub fn find_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.top_level.iter_mut().find_map(|root| root.find_mut(id))
    }

    /// Every registered task in global chronological order.
    pub fn all_tasks(&self) -> Vec<&Task> {
        let mut by_id: HashMap<TaskId, &Task> = HashMap::with_capacity(self.all_tasks.len());
        for root in &self.top_level {
            root.walk(&mut |node, _| {
                by_id.insert(node.id(), node);
            });
        }
        self.all_tasks
            .iter()
            .filter_map(|entry| by_id.get(&entry.id).copied())
            .collect()
    }

    /// Completes `id` when all of its direct children are complete.
    ///
    /// A rejection is reported as `Ok(false)`, not as an error.
    pub fn mark_complete(&mut self, id: TaskId) -> StoreResult<bool> {
        let task = self.find_mut(id).ok_or(StoreError::TaskNotFound(id))?;
        Ok(task.mark_complete())
    }

    pub fn mark_incomplete(&mut self, id: TaskId) -> StoreResult<()> {
        let task = self.find_mut(id).ok_or(StoreError::TaskNotFound(id))?;
        task.mark_incomplete();
        Ok(())
    }

    fn register(&mut self, id: TaskId, due_date: NaiveDate) {
        let index = lower_bound(&self.all_tasks, due_date, |entry| entry.due_date);
        self.all_tasks.insert(index, IndexEntry { due_date, id });
    }
}
