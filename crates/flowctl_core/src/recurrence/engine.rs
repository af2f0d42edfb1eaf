//! Recurrence engine applied to freshly decoded tasks.

use crate::model::recurrence::{Recurrence, RecurrenceUnit};
use crate::model::task::Task;
use chrono::NaiveDate;

/// Outcome of advancing one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advancement {
    /// Keep the task with its (possibly adjusted) due date.
    Keep,
    /// Recurrence window has elapsed; the task must not be inserted.
    Drop,
}

/// Advances `task` relative to `today`.
///
/// Non-recurring tasks are always kept unchanged.
///
/// # Contract
/// - Daily: past the window drops; a missed occurrence moves to `today` and
///   is reset to incomplete.
/// - Weekly/monthly/yearly: catch up period by period while the date is
///   before `today`. An incomplete task that had to catch up is rolled back
///   one period so it surfaces as overdue. Dropped when the resulting date
///   is after `until`.
/// - Completion carries over whenever no rollback applies.
pub fn advance(task: &mut Task, today: NaiveDate) -> Advancement {
    let Some(recurrence) = task.recurrence else {
        return Advancement::Keep;
    };

    match recurrence.unit {
        RecurrenceUnit::Daily => advance_daily(task, recurrence, today),
        RecurrenceUnit::Weekly | RecurrenceUnit::Monthly | RecurrenceUnit::Yearly => {
            advance_periodic(task, recurrence, today)
        }
    }
}

fn advance_daily(task: &mut Task, recurrence: Recurrence, today: NaiveDate) -> Advancement {
    if today > recurrence.until {
        return Advancement::Drop;
    }
    if today > task.due_date {
        task.due_date = today;
        task.mark_incomplete();
    }
    Advancement::Keep
}

fn advance_periodic(task: &mut Task, recurrence: Recurrence, today: NaiveDate) -> Advancement {
    let unit = recurrence.unit;
    let mut next = task.due_date;
    let mut jumped = false;

    while next < today {
        // Overflow lies beyond any encodable `until`.
        let Some(stepped) = unit.step_forward(next) else {
            return Advancement::Drop;
        };
        next = stepped;
        jumped = true;
    }

    if jumped && !task.is_complete() {
        let Some(previous) = unit.step_back(next) else {
            return Advancement::Drop;
        };
        next = previous;
    }

    if next > recurrence.until {
        return Advancement::Drop;
    }
    task.due_date = next;
    Advancement::Keep
}
