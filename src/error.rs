//! Error taxonomy shared by every operation.
//!
//! Any error aborts the operation before the document is modified.

use std::fmt;

/// How an external tool stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process exited with the given status code.
    Exited(i32),
    /// The process was killed by the given signal.
    Signaled(i32),
    /// The platform reported neither a code nor a signal.
    Unknown,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "was killed by signal {signal}"),
            Self::Unknown => write!(f, "terminated abnormally"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An external tool exited unsuccessfully or was signaled.
    #[error("{tool} {termination}{}", format_diagnostics(.diagnostics))]
    ProcessFailure {
        tool: String,
        termination: Termination,
        diagnostics: String,
    },

    /// Tool output was missing required elements or could not be decoded.
    #[error("malformed {tool} output: {reason}")]
    MalformedOutput { tool: String, reason: String },

    /// Two edits claim overlapping bytes of the pre-edit document.
    #[error("edits overlap: [{lower_start}, {lower_end}) runs into [{upper_start}, {upper_end})")]
    RangeOverlap {
        lower_start: usize,
        lower_end: usize,
        upper_start: usize,
        upper_end: usize,
    },

    /// An edit reaches past the end of the document.
    #[error("edit at byte {offset} with length {length} exceeds document size {size}")]
    RangeOutOfBounds {
        offset: usize,
        length: usize,
        size: usize,
    },

    /// A byte offset bisects a multi-byte UTF-8 sequence.
    #[error("byte offset {offset} is not on a character boundary")]
    EncodingAlignment { offset: usize },

    /// The environment cannot support the operation (no file identity,
    /// missing tool, wrong version-control backend, untracked file).
    #[error("{0}")]
    EnvironmentPrecondition(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_diagnostics(diagnostics: &str) -> String {
    let trimmed = diagnostics.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(tool: &str, reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}
