//! Remote-error classification.
//!
//! Decides whether a failed API call is an expected access limitation (soft:
//! the run continues and the check reports a Permission-level result) or a
//! real failure (fatal: only the check that hit it is aborted).

use crate::{CheckError, CheckGroup, CheckId, CheckResult, Severity};

/// Message fragments that mark an error as an access limitation, matched
/// case-insensitively.
const PERMISSION_MESSAGES: &[&str] = &[
    "you do not have permission",
    "invalid username or password",
    "support for password authentication was removed",
];

/// Outcome of classifying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// Expected access limitation; continue and report at Permission level.
    Soft,
    /// Unexpected failure; abort the current check.
    Fatal,
}

/// Policy deciding how checks react to failed remote calls.
///
/// Shared by every check of a run as an `Arc<dyn ErrorClassifier>`.
pub trait ErrorClassifier: Send + Sync {
    /// Classifies `err`.
    fn classify(&self, err: &CheckError) -> ErrorClassification;

    /// Returns `true` when a check may swallow `err` and keep going.
    ///
    /// Intended for use inside a check's own fan-out, so a single
    /// sub-resource failure does not abort the whole check.
    fn should_continue(&self, err: &CheckError) -> bool {
        self.classify(err) == ErrorClassification::Soft
    }

    /// Converts `err` into the check's final outcome.
    ///
    /// Soft errors become a Permission-level result; fatal errors are
    /// returned unchanged so the caller aborts just this check.
    fn handle_error(
        &self,
        id: &CheckId,
        group: CheckGroup,
        err: CheckError,
    ) -> Result<Option<CheckResult>, CheckError> {
        match self.classify(&err) {
            ErrorClassification::Soft => Ok(Some(CheckResult::new(
                id.clone(),
                group,
                Severity::Permission,
                format!("You do not have permission to run the check: {err}"),
            ))),
            ErrorClassification::Fatal => Err(err),
        }
    }
}

/// Default policy: 401, 403 and 404 responses and known permission messages
/// are soft, everything else is fatal.
///
/// 404s are included because the server answers with one when the caller
/// cannot see a resource it otherwise knows exists (deployment processes are
/// the common case). Errors without a status code are fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveErrorClassifier;

impl ErrorClassifier for PermissiveErrorClassifier {
    fn classify(&self, err: &CheckError) -> ErrorClassification {
        let Some(api_error) = err.as_api_error() else {
            return ErrorClassification::Fatal;
        };

        let status_is_soft = matches!(api_error.status, Some(401 | 403 | 404));
        let message = api_error.message.to_lowercase();
        let message_is_soft = PERMISSION_MESSAGES.iter().any(|m| message.contains(m));

        if status_is_soft || message_is_soft {
            ErrorClassification::Soft
        } else {
            ErrorClassification::Fatal
        }
    }
}
