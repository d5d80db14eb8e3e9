//! Error types for canopy
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown tree/task, uninitialized project)
//! - 3: Review blocked (invalid workflow transition, missing rejection note)
//! - 4: Operation failed (I/O, serialization, lock timeout)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the canopy CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const REVIEW_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for canopy operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Not a canopy project: {0} (run `canopy init` first)")]
    NotAProject(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tree not found: {0}")]
    TreeNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Review blocks (exit code 3)
    #[error("Invalid review transition for task {task_id}: cannot {action} a task that is {state}")]
    InvalidTransition {
        task_id: String,
        action: String,
        state: String,
    },

    #[error("A rejection note is required to reject task {0}")]
    NoteRequired(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotAProject(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TreeNotFound(_)
            | Error::TaskNotFound(_) => exit_codes::USER_ERROR,

            // Review blocks
            Error::InvalidTransition { .. } | Error::NoteRequired(_) => {
                exit_codes::REVIEW_BLOCKED
            }

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for the JSON error envelope, when the variant
    /// carries more than its message.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidTransition {
                task_id,
                action,
                state,
            } => Some(serde_json::json!({
                "task_id": task_id,
                "action": action,
                "state": state,
            })),
            _ => None,
        }
    }
}

/// Result type alias for canopy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
