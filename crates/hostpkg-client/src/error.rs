//! Error types for hostpkg-client

use thiserror::Error;

use crate::types::{Backend, Intent};

/// Errors that can occur during package operations
#[derive(Error, Debug, Clone)]
pub enum PackageError {
    /// Malformed input (empty package list, unsafe name, bad version string)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Option not meaningful for the chosen backend
    #[error("option `{option}` is not supported by {backend}")]
    UnsupportedOption {
        /// Backend the option was requested on
        backend: Backend,
        /// Name of the rejected option
        option: &'static str,
    },

    /// Intent not available on the chosen backend
    #[error("{backend} does not support {intent}")]
    UnsupportedOperation {
        /// Backend the intent was requested on
        backend: Backend,
        /// The unavailable intent
        intent: Intent,
    },

    /// A mutating command returned a non-zero exit status
    #[error("command `{command}` failed: {status} - {stderr}")]
    CommandFailed {
        /// Exact command line that was executed
        command: String,
        /// Exit status
        status: i32,
        /// Captured stderr
        stderr: String,
    },

    /// Execution error from the executor
    #[error("execution error: {0}")]
    ExecutionError(String),
}

impl PackageError {
    /// Check if the error was detected before anything was executed
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PackageError::InvalidArgument(_)
                | PackageError::UnsupportedOption { .. }
                | PackageError::UnsupportedOperation { .. }
        )
    }
}
