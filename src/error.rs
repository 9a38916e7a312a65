//! Error types shared across the crate
//!
//! Everything that can go wrong before the scheduling loop starts is a fatal
//! `CroreError`, surfaced to `main` and formatted with a line number where
//! one is available. Once the loop is running, the conditions that would
//! have mapped to `SpawnError` / `ChildNonZero` / `OutputCaptureFailure` are
//! logged and recovered from rather than propagated — see the executor and
//! scheduler modules.

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, CroreError>;

/// Errors that can occur while loading configuration and building the job
/// set. All variants are fatal: anything reaching `main` as a `CroreError`
/// terminates the process with a non-zero exit code.
#[derive(Error, Debug)]
pub enum CroreError {
    /// A cron field failed the grammar or range checks in a tab line
    #[error("invalid cron expression{}: {detail}", line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    InvalidExpression { line: Option<usize>, detail: String },

    /// Shell-word splitting failed on a tab line's command portion
    #[error("bad command{}: {detail}", line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    BadCommand { line: Option<usize>, detail: String },

    /// A config file line was neither blank, a comment, nor `key = val`
    #[error("invalid config line {line}: {text}")]
    BadConfigLine { line: usize, text: String },

    /// The tabfile (or config file) could not be opened, read, or decoded
    #[error("io error: {0}")]
    IoFailure(#[from] std::io::Error),

    /// The tab was loaded but contained no jobs
    #[error("tab is empty, nothing to schedule")]
    EmptyTab,

    /// Command-line argument parsing failed
    #[error("invalid command line: {0}")]
    BadArgs(String),
}

impl CroreError {
    /// Attach a line number to an error that doesn't already carry one
    pub fn with_line(self, line: usize) -> Self {
        match self {
            Self::InvalidExpression { detail, .. } => {
                Self::InvalidExpression { line: Some(line), detail }
            }
            Self::BadCommand { detail, .. } => Self::BadCommand { line: Some(line), detail },
            other => other,
        }
    }

    pub fn invalid_expression(detail: impl Into<String>) -> Self {
        Self::InvalidExpression { line: None, detail: detail.into() }
    }

    pub fn bad_command(detail: impl Into<String>) -> Self {
        Self::BadCommand { line: None, detail: detail.into() }
    }
}
