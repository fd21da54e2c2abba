//! Port to the remote Octopus Deploy API.
//!
//! [`OctopusApi`] exposes the read operations checks need over the server's
//! paginated collections. The `octopus` crate implements it over HTTP; tests
//! implement it in memory. Every failure surfaces as an [`ApiError`], which is
//! the only shape the [`crate::ErrorClassifier`] depends on.
//!
//! Implementations must be safe to share between concurrently running checks
//! without external locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ApiError, DeploymentProcessId, MachineId, ProjectId, ResourceFilter, TenantId,
};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub deployment_process_id: Option<DeploymentProcessId>,
    #[serde(default)]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentStep {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentProcess {
    pub id: DeploymentProcessId,
    #[serde(default)]
    pub steps: Vec<DeploymentStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Runbook {
    pub id: String,
    pub name: String,
    pub project_id: ProjectId,
}

/// How long releases or deployed files are retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RetentionPolicy {
    pub should_keep_forever: bool,
    pub quantity_to_keep: u32,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub release_retention_policy: Option<RetentionPolicy>,
    #[serde(default)]
    pub tentacle_retention_policy: Option<RetentionPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Lifecycle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub release_retention_policy: RetentionPolicy,
    #[serde(default)]
    pub tentacle_retention_policy: RetentionPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
}

/// Connection details of a deployment target or worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Endpoint {
    pub communication_style: String,
    pub certificate_signature_algorithm: Option<String>,
}

/// A deployment target or a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    #[serde(default)]
    pub health_status: String,
    #[serde(default)]
    pub endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    #[serde(default)]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerTask {
    pub id: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub id: String,
    pub category: String,
    pub occurred: DateTime<Utc>,
    #[serde(default)]
    pub related_document_ids: Vec<String>,
    #[serde(default)]
    pub username: String,
}

/// The server-wide certificate used to talk to tentacles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerCertificate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbprint: String,
    #[serde(default)]
    pub signature_algorithm: String,
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Read access to one space of an Octopus server.
///
/// Operations taking a `limit` return at most that many items; `0` means
/// all of them.
#[async_trait]
pub trait OctopusApi: Send + Sync {
    async fn projects(&self, limit: usize) -> Result<Vec<Project>, ApiError>;

    /// Returns the project whose name matches `name` exactly, if any.
    async fn project_by_name(&self, name: &str) -> Result<Option<Project>, ApiError>;

    async fn deployment_process(
        &self,
        id: &DeploymentProcessId,
    ) -> Result<DeploymentProcess, ApiError>;

    async fn runbooks(&self) -> Result<Vec<Runbook>, ApiError>;

    async fn lifecycles(&self) -> Result<Vec<Lifecycle>, ApiError>;

    async fn environments(&self) -> Result<Vec<Environment>, ApiError>;

    /// Deployment targets.
    async fn machines(&self, limit: usize) -> Result<Vec<Machine>, ApiError>;

    async fn workers(&self, limit: usize) -> Result<Vec<Machine>, ApiError>;

    async fn tenants(&self, limit: usize) -> Result<Vec<Tenant>, ApiError>;

    /// The most recent `take` tasks run for `tenant`.
    async fn tenant_tasks(&self, tenant: &TenantId, take: usize)
        -> Result<Vec<ServerTask>, ApiError>;

    /// Events regarding the given machine.
    async fn machine_events(&self, machine: &MachineId) -> Result<Vec<Event>, ApiError>;

    /// The most recent `take` events in any of `categories`.
    async fn events_by_category(
        &self,
        categories: &[&str],
        take: usize,
    ) -> Result<Vec<Event>, ApiError>;

    async fn server_certificate(&self) -> Result<ServerCertificate, ApiError>;
}

/// Fetches the projects a check should scan.
///
/// When the filter names explicit projects, only those are looked up (by
/// exact name). Otherwise every project, or the first `limit`, is fetched and
/// run through `filter`.
pub async fn filtered_projects(
    api: &dyn OctopusApi,
    filter: &ResourceFilter,
    limit: usize,
) -> Result<Vec<Project>, ApiError> {
    if !filter.included_names().is_empty() {
        let mut projects = Vec::with_capacity(filter.included_names().len());
        for name in filter.included_names() {
            match api.project_by_name(name).await? {
                Some(project) => projects.push(project),
                None => tracing::debug!(project = %name, "Included project not found"),
            }
        }
        return Ok(projects);
    }

    let projects = api.projects(limit).await?;
    Ok(projects
        .into_iter()
        .filter(|p| !filter.is_excluded(&p.name))
        .collect())
}
