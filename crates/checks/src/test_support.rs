//! In-memory [`OctopusApi`] and fixtures for rule tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use audit::{
    ApiError, AuditConfig, DeploymentProcess, DeploymentProcessId, DeploymentStep, Endpoint,
    Environment, Event, Lifecycle, Machine, MachineId, OctopusApi, PermissiveErrorClassifier,
    Phase, Project, ProjectId, RetentionPolicy, Runbook, ServerCertificate, ServerTask, Tenant,
    TenantId,
};
use chrono::{DateTime, Utc};

use crate::CheckContext;

/// Canned Octopus data plus injectable failures.
///
/// Failures are keyed either by operation name (`"projects"`, `"lifecycles"`,
/// ...) or by the id of the resource a per-item call asks for.
#[derive(Default)]
pub struct FakeOctopusApi {
    pub projects: Vec<Project>,
    pub deployment_processes: HashMap<String, DeploymentProcess>,
    pub runbooks: Vec<Runbook>,
    pub lifecycles: Vec<Lifecycle>,
    pub environments: Vec<Environment>,
    pub machines: Vec<Machine>,
    pub workers: Vec<Machine>,
    pub tenants: Vec<Tenant>,
    pub tenant_tasks: HashMap<String, Vec<ServerTask>>,
    pub machine_events: HashMap<String, Vec<Event>>,
    pub events: Vec<Event>,
    pub server_certificate: Option<ServerCertificate>,
    pub(crate) failures: HashMap<String, ApiError>,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) peak_in_flight: AtomicUsize,
}

impl FakeOctopusApi {
    pub fn fail(mut self, key: &str, error: ApiError) -> Self {
        self.failures.insert(key.to_string(), error);
        self
    }

    /// Highest number of per-item calls observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn into_context(self, config: AuditConfig) -> CheckContext {
        let projects = config.project_filter().unwrap();
        CheckContext {
            api: Arc::new(self),
            classifier: Arc::new(PermissiveErrorClassifier),
            config: Arc::new(config),
            projects: Arc::new(projects),
        }
    }

    fn check_failure(&self, key: &str) -> Result<(), ApiError> {
        match self.failures.get(key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn per_item_call(&self, key: &str) -> Result<(), ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.check_failure(key)
    }
}

fn take<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    if limit == 0 {
        items.to_vec()
    } else {
        items.iter().take(limit).cloned().collect()
    }
}

#[async_trait]
impl OctopusApi for FakeOctopusApi {
    async fn projects(&self, limit: usize) -> Result<Vec<Project>, ApiError> {
        self.check_failure("projects")?;
        Ok(take(&self.projects, limit))
    }

    async fn project_by_name(&self, name: &str) -> Result<Option<Project>, ApiError> {
        self.check_failure("projects")?;
        Ok(self.projects.iter().find(|p| p.name == name).cloned())
    }

    async fn deployment_process(
        &self,
        id: &DeploymentProcessId,
    ) -> Result<DeploymentProcess, ApiError> {
        self.per_item_call(id.as_str()).await?;
        self.deployment_processes
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ApiError::with_status(404, "The resource you requested was not found."))
    }

    async fn runbooks(&self) -> Result<Vec<Runbook>, ApiError> {
        self.check_failure("runbooks")?;
        Ok(self.runbooks.clone())
    }

    async fn lifecycles(&self) -> Result<Vec<Lifecycle>, ApiError> {
        self.check_failure("lifecycles")?;
        Ok(self.lifecycles.clone())
    }

    async fn environments(&self) -> Result<Vec<Environment>, ApiError> {
        self.check_failure("environments")?;
        Ok(self.environments.clone())
    }

    async fn machines(&self, limit: usize) -> Result<Vec<Machine>, ApiError> {
        self.check_failure("machines")?;
        Ok(take(&self.machines, limit))
    }

    async fn workers(&self, limit: usize) -> Result<Vec<Machine>, ApiError> {
        self.check_failure("workers")?;
        Ok(take(&self.workers, limit))
    }

    async fn tenants(&self, limit: usize) -> Result<Vec<Tenant>, ApiError> {
        self.check_failure("tenants")?;
        Ok(take(&self.tenants, limit))
    }

    async fn tenant_tasks(
        &self,
        tenant: &TenantId,
        take_count: usize,
    ) -> Result<Vec<ServerTask>, ApiError> {
        self.per_item_call(tenant.as_str()).await?;
        let tasks = self.tenant_tasks.get(tenant.as_str()).cloned().unwrap_or_default();
        Ok(take(&tasks, take_count))
    }

    async fn machine_events(&self, machine: &MachineId) -> Result<Vec<Event>, ApiError> {
        self.per_item_call(machine.as_str()).await?;
        Ok(self.machine_events.get(machine.as_str()).cloned().unwrap_or_default())
    }

    async fn events_by_category(
        &self,
        categories: &[&str],
        take_count: usize,
    ) -> Result<Vec<Event>, ApiError> {
        self.check_failure("events")?;
        let matching: Vec<Event> = self
            .events
            .iter()
            .filter(|e| categories.contains(&e.category.as_str()))
            .cloned()
            .collect();
        Ok(take(&matching, take_count))
    }

    async fn server_certificate(&self) -> Result<ServerCertificate, ApiError> {
        self.check_failure("server_certificate")?;
        self.server_certificate
            .clone()
            .ok_or_else(|| ApiError::with_status(404, "certificate-global not found"))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn project(id: &str, name: &str) -> Project {
    Project {
        id: ProjectId::new(id).unwrap(),
        name: name.to_string(),
        deployment_process_id: DeploymentProcessId::new(format!("deploymentprocess-{id}")),
        is_disabled: false,
    }
}

pub fn deployment_process(project_id: &str, steps: usize) -> DeploymentProcess {
    DeploymentProcess {
        id: DeploymentProcessId::new(format!("deploymentprocess-{project_id}")).unwrap(),
        steps: (0..steps)
            .map(|i| DeploymentStep {
                id: format!("Steps-{i}"),
                name: format!("Step {i}"),
            })
            .collect(),
    }
}

pub fn runbook(id: &str, project_id: &str) -> Runbook {
    Runbook {
        id: id.to_string(),
        name: id.to_string(),
        project_id: ProjectId::new(project_id).unwrap(),
    }
}

pub fn lifecycle(name: &str, keep_forever: bool) -> Lifecycle {
    Lifecycle {
        id: format!("Lifecycles-{name}"),
        name: name.to_string(),
        phases: Vec::new(),
        release_retention_policy: RetentionPolicy {
            should_keep_forever: keep_forever,
            quantity_to_keep: if keep_forever { 0 } else { 30 },
            unit: "Days".to_string(),
        },
        tentacle_retention_policy: RetentionPolicy::default(),
    }
}

pub fn phase(name: &str, keep_files_forever: bool) -> Phase {
    Phase {
        name: name.to_string(),
        release_retention_policy: None,
        tentacle_retention_policy: Some(RetentionPolicy {
            should_keep_forever: keep_files_forever,
            ..RetentionPolicy::default()
        }),
    }
}

pub fn environment(name: &str) -> Environment {
    Environment {
        id: format!("Environments-{name}"),
        name: name.to_string(),
    }
}

pub fn machine(id: &str, name: &str, health: &str, algorithm: Option<&str>) -> Machine {
    Machine {
        id: MachineId::new(id).unwrap(),
        name: name.to_string(),
        health_status: health.to_string(),
        endpoint: Some(Endpoint {
            communication_style: "TentaclePassive".to_string(),
            certificate_signature_algorithm: algorithm.map(str::to_string),
        }),
    }
}

pub fn tenant(id: &str, name: &str, disabled: bool) -> Tenant {
    Tenant {
        id: TenantId::new(id).unwrap(),
        name: name.to_string(),
        is_disabled: disabled,
    }
}

pub fn task(started: Option<DateTime<Utc>>) -> ServerTask {
    ServerTask {
        id: "ServerTasks-1".to_string(),
        start_time: started,
    }
}

pub fn event(category: &str, occurred: DateTime<Utc>, related: &[&str]) -> Event {
    Event {
        id: format!("Events-{category}-{}", occurred.timestamp()),
        category: category.to_string(),
        occurred,
        related_document_ids: related.iter().map(|s| s.to_string()).collect(),
        username: "admin".to_string(),
    }
}
