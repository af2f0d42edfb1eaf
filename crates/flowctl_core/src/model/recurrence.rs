//! Recurrence descriptor for repeating tasks.
//!
//! # Responsibility
//! - Define the recurrence unit/until pair attached to a task.
//! - Provide calendar stepping used by the load-time recurrence engine.
//! - Convert between the descriptor and its persisted period code.
//!
//! # Invariants
//! - Month/year stepping clamps to the last valid day of the target month.
//! - Stepping never panics; calendar overflow is reported as `None`.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

const PERIOD_UNIT_DIVISOR: u32 = 100_000_000;
const YEAR_DIVISOR: u32 = 10_000;
const MONTH_DIVISOR: u32 = 100;
const DAYS_PER_WEEK: u64 = 7;
const MONTHS_PER_YEAR: u32 = 12;

/// Period at which a recurring task's due date regenerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceUnit {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceUnit {
    /// Leading digit of the persisted period code.
    pub fn code(self) -> u32 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 2,
            Self::Monthly => 3,
            Self::Yearly => 4,
        }
    }

    /// Inverse of [`RecurrenceUnit::code`].
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Daily),
            2 => Some(Self::Weekly),
            3 => Some(Self::Monthly),
            4 => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Moves `date` one period forward.
    ///
    /// Returns `None` when the result falls outside the supported calendar.
    pub fn step_forward(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => date.checked_add_days(Days::new(1)),
            Self::Weekly => date.checked_add_days(Days::new(DAYS_PER_WEEK)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Yearly => date.checked_add_months(Months::new(MONTHS_PER_YEAR)),
        }
    }

    /// Moves `date` one period backward.
    pub fn step_back(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => date.checked_sub_days(Days::new(1)),
            Self::Weekly => date.checked_sub_days(Days::new(DAYS_PER_WEEK)),
            Self::Monthly => date.checked_sub_months(Months::new(1)),
            Self::Yearly => date.checked_sub_months(Months::new(MONTHS_PER_YEAR)),
        }
    }
}

/// Recurrence window of a task: repeat every `unit` until `until` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub unit: RecurrenceUnit,
    pub until: NaiveDate,
}

impl Recurrence {
    pub fn new(unit: RecurrenceUnit, until: NaiveDate) -> Self {
        Self { unit, until }
    }

    /// Encodes as `unit * 10^8 + YYYYMMDD(until)`.
    ///
    /// Returns `None` when `until` has no 8-digit `YYYYMMDD` form.
    pub fn period_code(&self) -> Option<u32> {
        let until = date_to_yyyymmdd(self.until)?;
        Some(self.unit.code() * PERIOD_UNIT_DIVISOR + until)
    }

    /// Decodes a non-zero period code.
    ///
    /// Returns `None` for an unknown unit digit or an invalid `until` date.
    pub fn from_period_code(code: u32) -> Option<Self> {
        let unit = RecurrenceUnit::from_code(code / PERIOD_UNIT_DIVISOR)?;
        let until = yyyymmdd_to_date(code % PERIOD_UNIT_DIVISOR)?;
        Some(Self { unit, until })
    }
}

/// Packs a date into `YYYYMMDD` form.
///
/// Only years `0..=9999` fit in eight digits; anything else yields `None`.
pub fn date_to_yyyymmdd(date: NaiveDate) -> Option<u32> {
    let year = u32::try_from(date.year()).ok()?;
    if year >= YEAR_DIVISOR {
        return None;
    }
    Some(year * YEAR_DIVISOR + date.month() * MONTH_DIVISOR + date.day())
}

/// Unpacks a `YYYYMMDD` value with division/modulo arithmetic.
pub fn yyyymmdd_to_date(value: u32) -> Option<NaiveDate> {
    let year = i32::try_from(value / YEAR_DIVISOR).ok()?;
    let month = (value % YEAR_DIVISOR) / MONTH_DIVISOR;
    let day = value % MONTH_DIVISOR;
    NaiveDate::from_ymd_opt(year, month, day)
}
