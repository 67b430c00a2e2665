//! Error types for the experiment core
//!
//! Provides error handling for:
//! - Configuration loading and validation
//! - Color schedule generation
//! - Prompt display conflicts
//! - Experiment log persistence

use std::path::PathBuf;

/// Top-level session error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schedule could not be generated
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Prompt could not be displayed
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Log sink failure
    #[error("log error: {0}")]
    Log(#[from] LogError),
}

impl SessionError {
    /// Whether the session can keep running after this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::Prompt(_) | SessionError::Log(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Box total must be a positive multiple of the group size
    #[error("invalid box total {total}: must be at least 4 and a multiple of 4")]
    InvalidBoxTotal { total: usize },

    /// Timing value is negative or not finite
    #[error("invalid timing value for {field}: {value}")]
    InvalidTiming { field: &'static str, value: f64 },

    /// A prompt list that must not be empty is empty
    #[error("prompt list '{0}' is empty")]
    EmptyPromptList(&'static str),

    /// Participant id is blank
    #[error("participant id must not be empty")]
    MissingParticipant,

    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Schedule generation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Total is zero or not a multiple of 4
    #[error("cannot build a schedule of {0} boxes: total must be a positive multiple of 4")]
    InvalidTotal(usize),

    /// Explicit schedule has no boxes
    #[error("schedule must contain at least one box")]
    Empty,
}

/// Prompt display errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    /// A blocking yes/no prompt is showing and excludes all other prompts
    #[error("a prompt is awaiting a yes/no response")]
    AwaitingResponse,

    /// An answer arrived while no yes/no prompt is showing
    #[error("no prompt is awaiting a response")]
    NoResponsePending,

    /// The requested prompt list is empty
    #[error("prompt list '{0}' is empty")]
    EmptyCatalog(&'static str),
}

impl PromptError {
    /// Rejections caused by the participant rather than by configuration
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, PromptError::EmptyCatalog(_))
    }
}

/// Log sink errors
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Underlying file I/O failed
    #[error("log I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Text tag that does not name a known variant
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseTagError {
    /// What was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseTagError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability() {
        assert!(SessionError::from(PromptError::AwaitingResponse).is_recoverable());
        assert!(!SessionError::from(ScheduleError::InvalidTotal(3)).is_recoverable());
        assert!(!PromptError::EmptyCatalog("ambiguous").is_transient());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = ConfigError::InvalidBoxTotal { total: 10 };
        assert!(err.to_string().contains("10"));
        let err = ParseTagError::new("area", "attic");
        assert_eq!(err.to_string(), "unknown area: 'attic'");
    }
}
