//! Error types.
//!
//! The library reports failures through [`HarnessError`]. The `astrofit` binary
//! wraps those in [`AppError`], which carries the process exit code.

use serde::{Deserialize, Serialize};

/// Failures raised by dataset construction, fitting, comparison and ingest.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HarnessError {
    /// Malformed input (dataset columns, model bounds, configuration).
    #[error("validation error: {0}")]
    Validation(String),

    /// Filtering or ingest left no usable points.
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    #[error("underdetermined fit: {points} point(s) cannot constrain {parameters} parameter(s)")]
    Underdetermined { points: usize, parameters: usize },

    /// The optimizer did not terminate within its iteration or time budget.
    #[error("optimizer diverged: {0}")]
    OptimizerDiverged(String),

    /// A model produced a non-finite value inside its declared bounds.
    #[error("model domain error in '{model}': {message}")]
    Domain { model: String, message: String },

    #[error("i/o error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Serializable discriminant of [`HarnessError`], used in batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    EmptyDataset,
    Underdetermined,
    OptimizerDiverged,
    Domain,
    Io,
    Parse,
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::Validation(_) => ErrorKind::Validation,
            HarnessError::EmptyDataset(_) => ErrorKind::EmptyDataset,
            HarnessError::Underdetermined { .. } => ErrorKind::Underdetermined,
            HarnessError::OptimizerDiverged(_) => ErrorKind::OptimizerDiverged,
            HarnessError::Domain { .. } => ErrorKind::Domain,
            HarnessError::Io(_) => ErrorKind::Io,
            HarnessError::Parse(_) => ErrorKind::Parse,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        HarnessError::Validation(message.into())
    }
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

/// Error surfaced by the binary: a message plus the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<HarnessError> for AppError {
    fn from(err: HarnessError) -> Self {
        // 2: bad input, 3: not enough data, 4: the fit itself failed.
        let exit_code = match err.kind() {
            ErrorKind::Validation | ErrorKind::Io | ErrorKind::Parse => 2,
            ErrorKind::EmptyDataset | ErrorKind::Underdetermined => 3,
            ErrorKind::OptimizerDiverged | ErrorKind::Domain => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let e: AppError = HarnessError::validation("bad").into();
        assert_eq!(e.exit_code(), 2);
        let e: AppError = HarnessError::Underdetermined { points: 2, parameters: 3 }.into();
        assert_eq!(e.exit_code(), 3);
        let e: AppError = HarnessError::OptimizerDiverged("budget".into()).into();
        assert_eq!(e.exit_code(), 4);
        assert!(e.to_string().contains("budget"));
    }
}
