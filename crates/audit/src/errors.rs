//! Error types for the audit domain.
//!
//! There are three layers, matching how far a failure is allowed to travel:
//!
//! - [`ApiError`]: the shape every remote-call failure surfaces as. The
//!   [`crate::ErrorClassifier`] depends only on this shape.
//! - [`CheckError`]: a failure that crosses the [`crate::Check::execute`]
//!   boundary. It aborts only the check that raised it.
//! - [`AuditError`]: an orchestration failure. The executor could not
//!   schedule work at all, so the whole run is aborted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Remote API errors
// ---------------------------------------------------------------------------

/// A failed call to the remote Octopus API.
///
/// `status` is `None` when no HTTP response was received (connection reset,
/// timeout, malformed body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status code, if a response was received.
    pub status: Option<u16>,
    /// Error message reported by the server or the transport.
    pub message: String,
}

impl ApiError {
    /// Creates an error for an HTTP response with the given status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an error for a failure that produced no HTTP status.
    pub fn without_status(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "Octopus API returned {code}: {}", self.message),
            None => write!(f, "Octopus API request failed: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

// ---------------------------------------------------------------------------
// Per-check errors
// ---------------------------------------------------------------------------

/// A fatal failure of a single check.
///
/// Soft failures never become a [`CheckError`]: they are converted to a
/// Permission-level result where they occur.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    /// A remote call failed and the failure was classified as fatal.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The check's own configuration is unusable.
    #[error("Invalid check configuration: {message}")]
    InvalidConfiguration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The check could not complete for a reason unrelated to the remote API
    /// (e.g. the task running it panicked).
    #[error("Internal check failure: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl CheckError {
    /// Returns the underlying [`ApiError`] when this failure came from the
    /// remote API.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that abort the whole audit run.
///
/// Distinct from [`CheckError`]: no individual check outcome ever produces
/// one of these.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The executor could not schedule or join check tasks.
    #[error("Failed to schedule checks: {message}")]
    Scheduling {
        /// Description of the scheduling failure.
        message: String,
    },

    /// The run configuration is invalid.
    ///
    /// Produced before any check starts; the run never begins with an
    /// invalid config.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}
