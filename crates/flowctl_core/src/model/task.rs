//! Task domain model.
//!
//! # Responsibility
//! - Define the task node that owns its subtasks.
//! - Enforce completion rules over direct children.
//!
//! # Invariants
//! - `children` is sorted ascending by `due_date`; a new equal-date child is
//!   placed before existing equal-date children.
//! - A task becomes complete only when every direct child is complete.
//! - A task exclusively owns its children; there are no parent references.

use crate::model::recurrence::Recurrence;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// In-memory identity of a task. Not persisted.
pub type TaskId = Uuid;

/// Validation errors for task content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace only.
    BlankTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// A titled, dated unit of work owning zero or more subtasks.
///
/// Not `Clone`; ids are unique per node. [`Task::duplicate`] builds an
/// independent copy with fresh ids.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    complete: bool,
    pub recurrence: Option<Recurrence>,
    children: Vec<Task>,
}

impl Task {
    /// Creates an incomplete, non-recurring task with an empty description.
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            due_date,
            complete: false,
            recurrence: None,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Checks content rules that do not depend on the storage format.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Incomplete and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.complete && self.due_date < today
    }

    /// Direct subtasks in chronological order.
    pub fn children(&self) -> &[Task] {
        &self.children
    }

    /// Marks the task complete.
    ///
    /// Returns `false` and leaves state untouched when any direct child is
    /// still incomplete. Grandchildren are not inspected.
    pub fn mark_complete(&mut self) -> bool {
        if self.children.iter().any(|child| !child.complete) {
            return false;
        }
        self.complete = true;
        true
    }

    /// Marks the task incomplete. Parents and children are not touched.
    pub fn mark_incomplete(&mut self) {
        self.complete = false;
    }

    /// Deep copy with fresh ids. Completion is reset on every copied node.
    pub fn duplicate(&self) -> Task {
        let mut copy = Task {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            complete: false,
            recurrence: self.recurrence,
            children: Vec::with_capacity(self.children.len()),
        };
        for child in &self.children {
            copy.add_subtask(child.duplicate());
        }
        copy
    }

    /// Finds `id` in this subtree, including `self`.
    pub fn find(&self, id: TaskId) -> Option<&Task> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Visits this node and all descendants in depth-first pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Task, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a Task, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Inserts `sub` at the lower bound of its due date.
    ///
    /// Only the store attaches subtasks to registered tasks so that the
    /// global index stays complete.
    pub(crate) fn add_subtask(&mut self, sub: Task) {
        let index = lower_bound(&self.children, sub.due_date, |task| task.due_date);
        self.children.insert(index, sub);
    }
}

/// Leftmost index whose date is not less than `date`.
pub(crate) fn lower_bound<T>(
    items: &[T],
    date: NaiveDate,
    date_of: impl Fn(&T) -> NaiveDate,
) -> usize {
    items.partition_point(|item| date_of(item) < date)
}
