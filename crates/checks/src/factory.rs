//! Builds the enabled checks for a run.
//!
//! Every rule is registered once in [`REGISTERED_CHECKS`]. The factory
//! applies the `only_checks` / `skip_checks` selections from
//! [`AuditConfig`] and hands every check the same shared [`CheckContext`].

use std::collections::BTreeSet;
use std::sync::Arc;

use audit::{AuditConfig, AuditError, Check, CheckCollection, ErrorClassifier, OctopusApi};

use crate::naming::{self, InvalidLifecycleNames};
use crate::organization::{
    self, EmptyProjects, EnvironmentCount, LifecycleRetention, UnhealthyTargets, UnusedTenants,
};
use crate::performance::{self, DeploymentQueuedTime};
use crate::security::{self, Sha1Certificates};
use crate::CheckContext;

type Constructor = fn(CheckContext) -> Arc<dyn Check>;

/// Every known check, in the order it is built.
const REGISTERED_CHECKS: &[(&str, Constructor)] = &[
    (naming::invalid_lifecycle_names::ID, |ctx| {
        Arc::new(InvalidLifecycleNames::new(ctx))
    }),
    (organization::empty_projects::ID, |ctx| {
        Arc::new(EmptyProjects::new(ctx))
    }),
    (organization::environment_count::ID, |ctx| {
        Arc::new(EnvironmentCount::new(ctx))
    }),
    (organization::lifecycle_retention::ID, |ctx| {
        Arc::new(LifecycleRetention::new(ctx))
    }),
    (organization::unhealthy_targets::ID, |ctx| {
        Arc::new(UnhealthyTargets::new(ctx))
    }),
    (organization::unused_tenants::ID, |ctx| {
        Arc::new(UnusedTenants::new(ctx))
    }),
    (security::sha1_certificates::ID, |ctx| {
        Arc::new(Sha1Certificates::new(ctx))
    }),
    (performance::deployment_queued_time::ID, |ctx| {
        Arc::new(DeploymentQueuedTime::new(ctx))
    }),
];

/// Constructs checks sharing one API client, classifier and configuration.
#[derive(Debug)]
pub struct CheckFactory {
    ctx: CheckContext,
}

impl CheckFactory {
    /// # Errors
    ///
    /// [`AuditError::Configuration`] when the project exclusion patterns do
    /// not compile.
    pub fn new(
        api: Arc<dyn OctopusApi>,
        classifier: Arc<dyn ErrorClassifier>,
        config: Arc<AuditConfig>,
    ) -> Result<Self, AuditError> {
        let projects = Arc::new(config.project_filter()?);
        Ok(Self {
            ctx: CheckContext {
                api,
                classifier,
                config,
                projects,
            },
        })
    }

    /// Ids of every registered check, whether or not it is enabled.
    pub fn all_check_ids() -> Vec<&'static str> {
        REGISTERED_CHECKS.iter().map(|(id, _)| *id).collect()
    }

    /// Builds the checks selected by the configuration.
    ///
    /// A non-empty `only_checks` list wins; otherwise every check not named
    /// in `skip_checks` is built.
    pub fn build_all_checks(&self) -> CheckCollection {
        let only = normalise(&self.ctx.config.only_checks);
        let skip = normalise(&self.ctx.config.skip_checks);

        for unknown in only
            .iter()
            .chain(skip.iter())
            .filter(|id| !REGISTERED_CHECKS.iter().any(|(known, _)| *known == id.as_str()))
        {
            tracing::warn!(check_id = %unknown, "Ignoring unknown check id");
        }

        let checks: CheckCollection = REGISTERED_CHECKS
            .iter()
            .filter(|(id, _)| {
                if only.is_empty() {
                    !skip.contains(*id)
                } else {
                    only.contains(*id)
                }
            })
            .map(|(_, build)| build(self.ctx.clone()))
            .collect();

        tracing::debug!(enabled = checks.len(), registered = REGISTERED_CHECKS.len(), "Built checks");
        checks
    }
}

fn normalise(ids: &[String]) -> BTreeSet<String> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
