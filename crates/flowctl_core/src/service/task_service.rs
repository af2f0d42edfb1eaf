//! Task use-case service.
//!
//! # Responsibility
//! - Provide the entry points a presentation layer calls: load, schedule,
//!   add subtasks, complete/reopen, save.
//! - Validate request shape before anything touches the store.
//!
//! # Invariants
//! - Every task is built with its final due date before insertion.
//! - `today` is fixed for the lifetime of a service instance.
//! - A rejected completion is a `false` result, not an error.

use crate::model::recurrence::{Recurrence, RecurrenceUnit};
use crate::model::task::{Task, TaskId, TaskValidationError};
use crate::repo::task_repo::{RepoError, TaskRepository};
use crate::store::task_store::{StoreError, TaskStore};
use chrono::{Datelike, Days, NaiveDate};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_WEEKLY_STARTS: usize = 7;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from task service operations.
#[derive(Debug)]
pub enum ServiceError {
    Validation(TaskValidationError),
    /// Number of start dates does not fit the recurrence kind.
    StartDateCount { found: usize },
    /// A start date lies before the service's `today`.
    StartBeforeToday { start: NaiveDate, today: NaiveDate },
    /// An extra weekly start date falls outside the Sunday-to-Saturday week
    /// of the first one.
    StartOutsideWeek {
        start: NaiveDate,
        week_start: NaiveDate,
        week_end: NaiveDate,
    },
    /// A start date lies after the recurrence end.
    StartAfterUntil { start: NaiveDate, until: NaiveDate },
    /// Subtask of a one-off task needs an explicit due date.
    DueDateRequired,
    /// Subtask due date must lie within `[earliest, latest]`.
    DueDateOutOfRange {
        due: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },
    Store(StoreError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::StartDateCount { found } => {
                write!(f, "unsupported number of start dates: {found}")
            }
            Self::StartBeforeToday { start, today } => {
                write!(f, "start date {start} is before today ({today})")
            }
            Self::StartOutsideWeek {
                start,
                week_start,
                week_end,
            } => write!(
                f,
                "weekly start date {start} is outside the week {week_start}..{week_end}"
            ),
            Self::StartAfterUntil { start, until } => {
                write!(f, "start date {start} is after recurrence end {until}")
            }
            Self::DueDateRequired => write!(f, "subtask due date is required"),
            Self::DueDateOutOfRange {
                due,
                earliest,
                latest,
            } => write!(
                f,
                "subtask due date {due} must be between {earliest} and {latest}"
            ),
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for ServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Request model for creating root tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTaskRequest {
    pub title: String,
    pub description: String,
    /// One date, or for weekly recurrence one date per weekday.
    pub starts: Vec<NaiveDate>,
    pub recurrence: Option<Recurrence>,
}

/// Request model for creating a subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskRequest {
    pub title: String,
    pub description: String,
    /// Ignored under a recurring parent.
    pub due_date: Option<NaiveDate>,
}

/// Task use-case facade over a repository and its loaded store.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    store: TaskStore,
    today: NaiveDate,
}

impl<R: TaskRepository> TaskService<R> {
    /// Loads the persisted tree as of `today`.
    ///
    /// Returns the service and whether a prior store existed.
    pub fn load(repo: R, today: NaiveDate) -> ServiceResult<(Self, bool)> {
        let outcome = repo.load(today)?;
        let service = Self {
            repo,
            store: outcome.store,
            today,
        };
        Ok((service, outcome.existed))
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Creates root tasks from `request`.
    ///
    /// # Contract
    /// - One-off, daily, monthly and yearly requests take exactly one date.
    /// - Weekly requests take one to seven dates and create one task each.
    /// - No start date may be before `today` or after the recurrence end.
    /// - Extra weekly dates must fall in the Sunday-to-Saturday week of the
    ///   first date.
    /// - Returns the created ids in request order.
    pub fn schedule_task(&mut self, request: &ScheduleTaskRequest) -> ServiceResult<Vec<TaskId>> {
        let max_starts = match request.recurrence {
            Some(Recurrence {
                unit: RecurrenceUnit::Weekly,
                ..
            }) => MAX_WEEKLY_STARTS,
            _ => 1,
        };
        let found = request.starts.len();
        if found == 0 || found > max_starts {
            return Err(ServiceError::StartDateCount { found });
        }

        let week = week_of(request.starts[0]);
        let mut tasks = Vec::with_capacity(found);
        for &start in &request.starts {
            if start < self.today {
                return Err(ServiceError::StartBeforeToday {
                    start,
                    today: self.today,
                });
            }
            if let Some((week_start, week_end)) = week {
                if start < week_start || start > week_end {
                    return Err(ServiceError::StartOutsideWeek {
                        start,
                        week_start,
                        week_end,
                    });
                }
            }
            let mut task =
                Task::new(request.title.clone(), start).with_description(request.description.clone());
            if let Some(recurrence) = request.recurrence {
                if start > recurrence.until {
                    return Err(ServiceError::StartAfterUntil {
                        start,
                        until: recurrence.until,
                    });
                }
                task = task.with_recurrence(recurrence);
            }
            task.validate()?;
            tasks.push(task);
        }

        let ids: Vec<TaskId> = tasks
            .into_iter()
            .map(|task| self.store.insert_top_level(task))
            .collect();
        info!(
            "event=task_schedule module=service status=ok created={} recurring={}",
            ids.len(),
            request.recurrence.is_some()
        );
        Ok(ids)
    }

    /// Creates a subtask under `parent`.
    ///
    /// # Contract
    /// - Recurring parent: the subtask copies the parent's date and recurrence.
    /// - Otherwise: `due_date` is required and must be within
    ///   `[today, parent.due_date]`.
    pub fn add_subtask(&mut self, parent: TaskId, request: &SubtaskRequest) -> ServiceResult<TaskId> {
        let parent_task = self
            .store
            .find(parent)
            .ok_or(StoreError::ParentNotFound(parent))?;

        let mut task = match parent_task.recurrence {
            Some(recurrence) => {
                Task::new(request.title.clone(), parent_task.due_date).with_recurrence(recurrence)
            }
            None => {
                let due = request.due_date.ok_or(ServiceError::DueDateRequired)?;
                if due < self.today || due > parent_task.due_date {
                    return Err(ServiceError::DueDateOutOfRange {
                        due,
                        earliest: self.today,
                        latest: parent_task.due_date,
                    });
                }
                Task::new(request.title.clone(), due)
            }
        };
        task.description = request.description.clone();
        task.validate()?;

        let id = self.store.attach_subtask(parent, task)?;
        info!("event=subtask_add module=service status=ok");
        Ok(id)
    }

    /// Copies the subtree rooted at `id` into a new independent root.
    pub fn duplicate_task(&mut self, id: TaskId) -> ServiceResult<TaskId> {
        let copy = self
            .store
            .find(id)
            .ok_or(StoreError::TaskNotFound(id))?
            .duplicate();
        Ok(self.store.insert_top_level_tree(copy))
    }

    /// Completes `id` if all of its direct subtasks are complete.
    pub fn complete(&mut self, id: TaskId) -> ServiceResult<bool> {
        let completed = self.store.mark_complete(id)?;
        if !completed {
            info!("event=task_complete module=service status=rejected reason=open_subtasks");
        }
        Ok(completed)
    }

    pub fn reopen(&mut self, id: TaskId) -> ServiceResult<()> {
        Ok(self.store.mark_incomplete(id)?)
    }

    /// Incomplete tasks due before today, in global chronological order.
    pub fn overdue(&self) -> Vec<&Task> {
        self.store
            .all_tasks()
            .into_iter()
            .filter(|task| task.is_overdue(self.today))
            .collect()
    }

    /// Persists the current store. The in-memory state stays usable on error.
    pub fn save(&self) -> ServiceResult<()> {
        Ok(self.repo.save(&self.store)?)
    }
}

/// Sunday-to-Saturday week containing `date`, or `None` at the calendar edge.
fn week_of(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    let start = date.checked_sub_days(Days::new(offset))?;
    let end = start.checked_add_days(Days::new(6))?;
    Some((start, end))
}
