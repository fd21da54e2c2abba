//! Run configuration consumed by the factory, the executor, and the checks.
//!
//! [`AuditConfig`] is read-only once built: it is shared between checks as an
//! `Arc<AuditConfig>` and never mutated by the executor. How it is assembled
//! (flags, environment, config file) is the composition root's concern.

use serde::{Deserialize, Serialize};

use crate::{AuditError, ResourceFilter};

/// Default global concurrency cap.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Default floor for each check's internal fan-out.
pub const DEFAULT_MIN_INTERNAL_CONCURRENCY: usize = 2;

/// Settings for one audit run.
///
/// Limits named `max_*` bound how many resources a check scans; `0` means
/// "scan all of them".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    // --- executor ---
    pub max_concurrency: usize,
    pub min_internal_concurrency: usize,

    // --- check selection (by check id) ---
    pub skip_checks: Vec<String>,
    pub only_checks: Vec<String>,

    // --- resource exclusion (by project name) ---
    pub exclude_projects: Vec<String>,
    pub exclude_projects_except: Vec<String>,
    pub exclude_projects_regex: Vec<String>,

    // --- per-check tunables ---
    pub lifecycle_name_regex: String,
    pub max_environments: usize,
    pub max_days_since_last_task: u32,
    pub max_empty_project_check_projects: usize,
    pub max_unhealthy_targets: usize,
    pub max_unused_tenants: usize,
    pub max_sha1_certificates_machines: usize,
    pub max_deployment_tasks: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            min_internal_concurrency: DEFAULT_MIN_INTERNAL_CONCURRENCY,
            skip_checks: Vec::new(),
            only_checks: Vec::new(),
            exclude_projects: Vec::new(),
            exclude_projects_except: Vec::new(),
            exclude_projects_regex: Vec::new(),
            lifecycle_name_regex: String::new(),
            max_environments: 20,
            max_days_since_last_task: 90,
            max_empty_project_check_projects: 0,
            max_unhealthy_targets: 0,
            max_unused_tenants: 0,
            max_sha1_certificates_machines: 0,
            max_deployment_tasks: 1000,
        }
    }
}

impl AuditConfig {
    /// Validates the settings the executor depends on.
    ///
    /// # Errors
    ///
    /// [`AuditError::Configuration`] when the global concurrency cap is zero
    /// or a project exclusion pattern does not compile.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.max_concurrency == 0 {
            return Err(AuditError::Configuration {
                message: "max_concurrency must be at least 1".to_string(),
            });
        }

        self.project_filter()?;
        Ok(())
    }

    /// Builds the project exclusion filter from the `exclude_projects*` settings.
    ///
    /// # Errors
    ///
    /// [`AuditError::Configuration`] naming the pattern that failed to compile.
    pub fn project_filter(&self) -> Result<ResourceFilter, AuditError> {
        ResourceFilter::new(
            &self.exclude_projects,
            &self.exclude_projects_except,
            &self.exclude_projects_regex,
        )
        .map_err(|e| AuditError::Configuration {
            message: format!("invalid project exclusion pattern: {e}"),
        })
    }
}
