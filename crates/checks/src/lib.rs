//! octolint check executor, check factory, and audit rules.
//!
//! This crate drives the [`audit`] domain: it builds the enabled checks
//! ([`CheckFactory`]), runs them under a two-level concurrency budget
//! ([`CheckExecutor`]), and holds the rule implementations themselves.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Rules sequence calls to the [`audit::OctopusApi`]
//! port and turn the responses into [`audit::CheckResult`]s. They never talk
//! HTTP directly.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`executor`] | `CheckExecutor`, `FailureDisposition` |
//! | [`factory`] | `CheckFactory`, the registered check list |
//! | [`fan_out`] | Bounded per-check fan-out |
//! | [`naming`] | Naming rules |
//! | [`organization`] | Organization rules |
//! | [`security`] | Security rules |
//! | [`performance`] | Performance rules |

use std::sync::Arc;

use audit::{
    AuditConfig, CheckError, CheckGroup, CheckId, CheckResult, ErrorClassifier, OctopusApi,
    ResourceFilter,
};

pub mod executor;
pub mod factory;
pub mod fan_out;
pub mod naming;
pub mod organization;
pub mod performance;
pub mod security;

#[cfg(test)]
pub(crate) mod test_support;

pub use executor::{CheckExecutor, FailureDisposition};
pub use factory::CheckFactory;
pub use fan_out::{collect_outputs, fan_out};

/// Shared dependencies handed to every check of a run.
///
/// Cloning is cheap; every field is reference counted and read-only.
#[derive(Clone)]
pub struct CheckContext {
    pub api: Arc<dyn OctopusApi>,
    pub classifier: Arc<dyn ErrorClassifier>,
    pub config: Arc<AuditConfig>,
    pub projects: Arc<ResourceFilter>,
}

impl CheckContext {
    /// Runs `err` through the classifier on behalf of the check `id`.
    pub fn handle_error(
        &self,
        id: &CheckId,
        group: CheckGroup,
        err: impl Into<CheckError>,
    ) -> Result<Option<CheckResult>, CheckError> {
        self.classifier.handle_error(id, group, err.into())
    }
}

impl std::fmt::Debug for CheckContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckContext")
            .field("config", &self.config)
            .field("projects", &self.projects)
            .finish_non_exhaustive()
    }
}
