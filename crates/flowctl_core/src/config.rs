//! Storage and codec configuration.
//!
//! # Responsibility
//! - Describe the flat-file grammar (delimiter, depth marker, header, trailer).
//! - Resolve a user identity to its backing file path.
//!
//! # Invariants
//! - Delimiter and marker are distinct and never line breaks.
//! - Header and trailer can never be mistaken for a task line.
//! - Resolved paths always stay inside `root_dir`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_DELIMITER: char = '\t';
pub const DEFAULT_MARKER: char = '+';
pub const DEFAULT_HEADER: &str = "Tasks:";
pub const DEFAULT_TRAILER: &str = "end";
pub const DEFAULT_EXTENSION: &str = ".txt";

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Delimiter and marker use the same character.
    DelimiterEqualsMarker(char),
    /// Delimiter or marker is a line break.
    LineBreakSeparator(char),
    /// Header or trailer is empty or spans multiple lines.
    InvalidFrameLine(&'static str),
    /// Header or trailer starts like a task line.
    AmbiguousFrameLine(&'static str),
    /// Username is blank or escapes the storage directory.
    InvalidUsername(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DelimiterEqualsMarker(ch) => {
                write!(f, "delimiter and depth marker must differ, both are {ch:?}")
            }
            Self::LineBreakSeparator(ch) => {
                write!(f, "line break {ch:?} cannot be used as a separator")
            }
            Self::InvalidFrameLine(which) => {
                write!(f, "{which} line must be a non-empty single line")
            }
            Self::AmbiguousFrameLine(which) => write!(
                f,
                "{which} line must not start with the delimiter or depth marker"
            ),
            Self::InvalidUsername(name) => write!(f, "invalid username `{name}`"),
        }
    }
}

impl Error for ConfigError {}

/// Flat-file grammar settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub delimiter: char,
    pub marker: char,
    pub header: String,
    pub trailer: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            marker: DEFAULT_MARKER,
            header: DEFAULT_HEADER.to_string(),
            trailer: DEFAULT_TRAILER.to_string(),
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for ch in [self.delimiter, self.marker] {
            if is_line_break(ch) {
                return Err(ConfigError::LineBreakSeparator(ch));
            }
        }
        if self.delimiter == self.marker {
            return Err(ConfigError::DelimiterEqualsMarker(self.delimiter));
        }
        self.validate_frame_line("header", &self.header)?;
        self.validate_frame_line("trailer", &self.trailer)
    }

    fn validate_frame_line(&self, which: &'static str, line: &str) -> Result<(), ConfigError> {
        if line.is_empty() || line.chars().any(is_line_break) {
            return Err(ConfigError::InvalidFrameLine(which));
        }
        if line.starts_with(self.delimiter) || line.starts_with(self.marker) {
            return Err(ConfigError::AmbiguousFrameLine(which));
        }
        Ok(())
    }
}

/// Location of per-user backing files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_dir: PathBuf,
    pub extension: String,
}

impl StorageConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Backing file for `username`: `<root_dir>/<username><extension>`.
    ///
    /// # Errors
    /// - `InvalidUsername` for blank names, path separators or `..`.
    pub fn path_for(&self, username: &str) -> Result<PathBuf, ConfigError> {
        let trimmed = username.trim();
        if trimmed.is_empty()
            || trimmed.contains(['/', '\\'])
            || trimmed == "."
            || trimmed.contains("..")
        {
            return Err(ConfigError::InvalidUsername(username.to_string()));
        }
        Ok(self.root_dir.join(format!("{trimmed}{}", self.extension)))
    }
}

pub(crate) fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

#[cfg(test)]
mod tests {
    use super::{CodecConfig, ConfigError, StorageConfig};
    use std::path::PathBuf;

    #[test]
    fn default_codec_config_is_valid() {
        assert_eq!(CodecConfig::default().validate(), Ok(()));
    }

    #[test]
    fn codec_config_rejects_colliding_separators() {
        let config = CodecConfig {
            marker: '\t',
            ..CodecConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DelimiterEqualsMarker('\t'))
        );

        let config = CodecConfig {
            trailer: "+done".to_string(),
            ..CodecConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::AmbiguousFrameLine("trailer"))
        );
    }

    #[test]
    fn path_for_appends_extension_and_rejects_traversal() {
        let storage = StorageConfig::new("/data/flow");
        assert_eq!(
            storage.path_for("ada").unwrap(),
            PathBuf::from("/data/flow/ada.txt")
        );
        assert!(storage.path_for("../etc/passwd").is_err());
        assert!(storage.path_for("   ").is_err());
    }
}
