//! Depth-encoded flat text codec for the task tree.
//!
//! # Responsibility
//! - Serialize a store as one line per task in depth-first pre-order.
//! - Parse the same format back into a store, applying recurrence
//!   advancement before each task is inserted.
//!
//! # Invariants
//! - Numeric fields are decoded with integer arithmetic, never by slicing.
//! - Malformed input fails the whole decode; no partial store is returned.
//! - Encoding either produces the full document or an error.
//! - A task dropped by the recurrence engine is never used as a parent; later
//!   lines attach to the last task registered one level up.
//!
//! # Format
//! ```text
//! Tasks:
//! <M*><D>title<D>description<D>YYYYMMDD<D>true|false<D>periodcode
//! end
//! ```

use crate::config::{is_line_break, CodecConfig, ConfigError};
use crate::model::recurrence::{date_to_yyyymmdd, yyyymmdd_to_date, Recurrence};
use crate::model::task::{Task, TaskId};
use crate::recurrence::engine::{advance, Advancement};
use crate::store::task_store::TaskStore;
use chrono::NaiveDate;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

const FIELDS_AFTER_DEPTH: usize = 5;
const DATE_DIGITS: usize = 8;
const PERIOD_CODE_DIGITS: usize = 9;
const NO_RECURRENCE: &str = "0";
const TRUE_FLAG: &str = "true";
const FALSE_FLAG: &str = "false";

pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from encoding or decoding the flat task format.
///
/// Decode variants carry the 1-based line number of the offending line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input is not UTF-8; `byte` is the offset of the first bad byte.
    InvalidUtf8 { line: usize, byte: usize },
    /// First line is not the configured header.
    InvalidHeader { found: String },
    /// Depth prefix contains something other than markers, or the line has
    /// no delimiter at all.
    InvalidDepthPrefix { line: usize },
    /// Wrong number of delimiter-separated fields after the depth prefix.
    FieldCount { line: usize, found: usize },
    InvalidDate { line: usize, value: String },
    InvalidCompletionFlag { line: usize, value: String },
    InvalidRecurrence { line: usize, value: String },
    /// No task is registered at `depth - 1` to act as parent.
    OrphanDepth { line: usize, depth: usize },
    /// Title or description contains a reserved character.
    ReservedCharacter {
        task: TaskId,
        field: &'static str,
        ch: char,
    },
    /// Due date or until date has no `YYYYMMDD` form.
    UnencodableDate { task: TaskId, date: NaiveDate },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUtf8 { line, byte } => {
                write!(f, "line {line}: invalid UTF-8 at byte {byte}")
            }
            Self::InvalidHeader { found } => write!(f, "unexpected header line `{found}`"),
            Self::InvalidDepthPrefix { line } => {
                write!(f, "line {line}: malformed depth prefix")
            }
            Self::FieldCount { line, found } => write!(
                f,
                "line {line}: expected {FIELDS_AFTER_DEPTH} fields, found {found}"
            ),
            Self::InvalidDate { line, value } => {
                write!(f, "line {line}: invalid date field `{value}`")
            }
            Self::InvalidCompletionFlag { line, value } => {
                write!(f, "line {line}: invalid completion flag `{value}`")
            }
            Self::InvalidRecurrence { line, value } => {
                write!(f, "line {line}: invalid period code `{value}`")
            }
            Self::OrphanDepth { line, depth } => {
                write!(f, "line {line}: depth {depth} has no parent at depth {}", depth - 1)
            }
            Self::ReservedCharacter { task, field, ch } => {
                write!(f, "task {task}: {field} contains reserved character {ch:?}")
            }
            Self::UnencodableDate { task, date } => {
                write!(f, "task {task}: date {date} cannot be stored as YYYYMMDD")
            }
        }
    }
}

impl Error for CodecError {}

/// Flat text codec bound to one grammar configuration.
#[derive(Debug, Clone)]
pub struct TaskCodec {
    config: CodecConfig,
}

impl TaskCodec {
    /// Creates a codec after validating `config`.
    pub fn new(config: CodecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Serializes every root task and its subtree.
    ///
    /// # Errors
    /// - `ReservedCharacter` when a title/description would corrupt the line.
    /// - `UnencodableDate` when a date does not fit `YYYYMMDD`.
    pub fn encode(&self, store: &TaskStore) -> CodecResult<String> {
        let mut out = String::new();
        out.push_str(&self.config.header);
        out.push('\n');

        let mut failure = None;
        for root in store.top_level() {
            root.walk(&mut |task, depth| {
                if failure.is_some() {
                    return;
                }
                if let Err(err) = self.encode_line(&mut out, task, depth) {
                    failure = Some(err);
                }
            });
            if let Some(err) = failure.take() {
                return Err(err);
            }
        }

        out.push_str(&self.config.trailer);
        out.push('\n');
        debug!(
            "event=codec_encode module=codec status=ok tasks={}",
            store.len()
        );
        Ok(out)
    }

    /// Decodes raw file content, rejecting bytes that are not UTF-8.
    pub fn decode_bytes(&self, bytes: &[u8], today: NaiveDate) -> CodecResult<TaskStore> {
        let text = std::str::from_utf8(bytes).map_err(|err| {
            let byte = err.valid_up_to();
            let line = bytes[..byte].iter().filter(|&&b| b == b'\n').count() + 1;
            CodecError::InvalidUtf8 { line, byte }
        })?;
        self.decode(text, today)
    }

    /// Parses `text` into a new store, advancing recurring tasks to `today`.
    ///
    /// Empty input decodes to an empty store. Input ends at the trailer line
    /// or at end of text, whichever comes first.
    pub fn decode(&self, text: &str, today: NaiveDate) -> CodecResult<TaskStore> {
        let mut store = TaskStore::new();
        let mut lines = text.lines().enumerate();

        match lines.next() {
            None => return Ok(store),
            Some((_, header)) if header == self.config.header => {}
            Some((_, header)) => {
                return Err(CodecError::InvalidHeader {
                    found: header.to_string(),
                })
            }
        }

        // Last task registered at each depth. Dropped lines leave it as is.
        let mut parents: Vec<TaskId> = Vec::new();
        let mut dropped = 0usize;

        for (index, raw) in lines {
            if raw == self.config.trailer {
                break;
            }
            let line = index + 1;
            let (depth, mut task) = self.decode_line(raw, line)?;

            if depth > parents.len() {
                return Err(CodecError::OrphanDepth { line, depth });
            }
            if advance(&mut task, today) == Advancement::Drop {
                dropped += 1;
                continue;
            }

            let id = match depth {
                0 => store.insert_top_level(task),
                _ => store
                    .attach_subtask(parents[depth - 1], task)
                    .map_err(|_| CodecError::OrphanDepth { line, depth })?,
            };
            parents.truncate(depth);
            parents.push(id);
        }

        debug!(
            "event=codec_decode module=codec status=ok tasks={} dropped={}",
            store.len(),
            dropped
        );
        Ok(store)
    }

    fn encode_line(&self, out: &mut String, task: &Task, depth: usize) -> CodecResult<()> {
        self.check_text(task, "title", &task.title)?;
        self.check_text(task, "description", &task.description)?;

        let due = date_to_yyyymmdd(task.due_date).ok_or(CodecError::UnencodableDate {
            task: task.id(),
            date: task.due_date,
        })?;
        let period_code = match task.recurrence {
            None => 0,
            Some(recurrence) => {
                recurrence
                    .period_code()
                    .ok_or(CodecError::UnencodableDate {
                        task: task.id(),
                        date: recurrence.until,
                    })?
            }
        };

        let delimiter = self.config.delimiter;
        out.extend(std::iter::repeat(self.config.marker).take(depth));
        out.push_str(&format!(
            "{delimiter}{}{delimiter}{}{delimiter}{due:08}{delimiter}{}{delimiter}{period_code}\n",
            task.title,
            task.description,
            task.is_complete(),
        ));
        Ok(())
    }

    fn check_text(&self, task: &Task, field: &'static str, value: &str) -> CodecResult<()> {
        let reserved = value
            .chars()
            .find(|&ch| ch == self.config.delimiter || ch == self.config.marker || is_line_break(ch));
        match reserved {
            Some(ch) => Err(CodecError::ReservedCharacter {
                task: task.id(),
                field,
                ch,
            }),
            None => Ok(()),
        }
    }

    fn decode_line(&self, raw: &str, line: usize) -> CodecResult<(usize, Task)> {
        let (prefix, rest) = raw
            .split_once(self.config.delimiter)
            .ok_or(CodecError::InvalidDepthPrefix { line })?;
        if prefix.chars().any(|ch| ch != self.config.marker) {
            return Err(CodecError::InvalidDepthPrefix { line });
        }
        let depth = prefix.chars().count();

        let fields: Vec<&str> = rest.split(self.config.delimiter).collect();
        let &[title, description, due, complete, period] = fields.as_slice() else {
            return Err(CodecError::FieldCount {
                line,
                found: fields.len(),
            });
        };

        let due_date = parse_digits(due, DATE_DIGITS)
            .and_then(yyyymmdd_to_date)
            .ok_or_else(|| CodecError::InvalidDate {
                line,
                value: due.to_string(),
            })?;

        let mut task = Task::new(title, due_date).with_description(description);
        match complete {
            TRUE_FLAG => {
                task.mark_complete();
            }
            FALSE_FLAG => {}
            other => {
                return Err(CodecError::InvalidCompletionFlag {
                    line,
                    value: other.to_string(),
                })
            }
        }

        if period != NO_RECURRENCE {
            let recurrence = parse_digits(period, PERIOD_CODE_DIGITS)
                .and_then(Recurrence::from_period_code)
                .ok_or_else(|| CodecError::InvalidRecurrence {
                    line,
                    value: period.to_string(),
                })?;
            task.recurrence = Some(recurrence);
        }

        Ok((depth, task))
    }
}

/// Parses exactly `width` ASCII digits.
fn parse_digits(value: &str, width: usize) -> Option<u32> {
    if value.len() != width || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
