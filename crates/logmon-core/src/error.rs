//! Error type shared by every logmon crate.
//!
//! Failures are reported as result codes, not as exceptions that escape to
//! the caller: each [`MonitorError`] variant maps to exactly one
//! [`ResultCode`] through [`MonitorError::code`], and the binary turns the
//! terminal code into the process exit status.

use std::path::{Path, PathBuf};

use crate::codes::ResultCode;
use crate::types::Mode;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A document or store could not be opened.
    #[error("cannot access {}: {source}", path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document exists but does not have the expected shape.
    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    /// One or more configuration fields are missing or carry invalid values.
    #[error("invalid configuration: {}", problems.join("; "))]
    InvalidField { problems: Vec<String> },

    /// Settings could not be layered or deserialized.
    #[error("invalid settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("another `{0}` instance is already running")]
    DuplicateProcess(Mode),

    /// A mailbox record lacks a field every record must carry.
    #[error("record {index} in the mailbox is missing field `{field}`")]
    MissingOutputField { index: usize, field: String },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A fatal event was appended and the run must stop.
    #[error("terminated with code {code}: {description}")]
    Terminated { code: ResultCode, description: String },

    /// Any other I/O failure on a file the monitor owns.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn missing_file(path: &Path, source: std::io::Error) -> Self {
        Self::MissingFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The result code this error terminates (or is recorded) with.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::MissingFile { .. } => ResultCode::MissingFile,
            Self::MalformedDocument { .. } | Self::Settings(_) => ResultCode::MalformedDocument,
            Self::InvalidField { .. } => ResultCode::InvalidField,
            Self::DuplicateProcess(_) => ResultCode::DuplicateProcess,
            Self::MissingOutputField { .. } => ResultCode::MissingOutputField,
            Self::UnsupportedPlatform(_) => ResultCode::UnsupportedPlatform,
            Self::Terminated { code, .. } => *code,
            Self::Io { .. } | Self::Encode(_) => ResultCode::Undefined,
        }
    }
}
