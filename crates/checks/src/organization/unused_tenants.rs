use async_trait::async_trait;
use audit::{Check, CheckError, CheckGroup, CheckId, CheckResult, Severity, Tenant};
use chrono::{Duration, Utc};

use crate::{collect_outputs, fan_out, CheckContext};

pub const ID: &str = "OctoLintUnusedTenants";

/// Number of recent tasks inspected per tenant.
const RECENT_TASKS: usize = 100;

/// Flags enabled tenants with no task started in the last
/// `max_days_since_last_task` days.
pub struct UnusedTenants {
    id: CheckId,
    ctx: CheckContext,
}

impl UnusedTenants {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }

    async fn is_unused(&self, tenant: &Tenant) -> Result<bool, CheckError> {
        let days = i64::from(self.ctx.config.max_days_since_last_task);
        let cutoff = Utc::now() - Duration::days(days);

        let tasks = self.ctx.api.tenant_tasks(&tenant.id, RECENT_TASKS).await?;
        Ok(!tasks
            .iter()
            .any(|t| t.start_time.is_some_and(|started| started > cutoff)))
    }
}

#[async_trait]
impl Check for UnusedTenants {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Organization
    }

    async fn execute(&self, concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let tenants = match self.ctx.api.tenants(self.ctx.config.max_unused_tenants).await {
            Ok(tenants) => tenants,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let enabled: Vec<Tenant> = tenants.into_iter().filter(|t| !t.is_disabled).collect();

        let outputs = fan_out(enabled, concurrency, |_, tenant| async move {
            let unused = self.is_unused(&tenant).await?;
            Ok::<_, CheckError>(unused.then_some(tenant.name))
        })
        .await;

        let unused: Vec<String> = match collect_outputs(self.ctx.classifier.as_ref(), outputs) {
            Ok(names) => names.into_iter().flatten().collect(),
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let days = self.ctx.config.max_days_since_last_task;
        if !unused.is_empty() {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "The following tenants have not had any tasks in {days} days:\n{}",
                    unused.join("\n")
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            format!("There are no tenants that have not had any tasks in the last {days} days"),
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use audit::{ApiError, AuditConfig};

    use super::*;
    use crate::test_support::{task, tenant, FakeOctopusApi};

    fn api() -> FakeOctopusApi {
        FakeOctopusApi {
            tenants: vec![
                tenant("Tenants-1", "Active", false),
                tenant("Tenants-2", "Stale", false),
                tenant("Tenants-3", "Disabled", true),
                tenant("Tenants-4", "Never Started", false),
            ],
            tenant_tasks: HashMap::from([
                (
                    "Tenants-1".to_string(),
                    vec![task(Some(Utc::now() - Duration::days(3)))],
                ),
                (
                    "Tenants-2".to_string(),
                    vec![task(Some(Utc::now() - Duration::days(200)))],
                ),
                ("Tenants-4".to_string(), vec![task(None)]),
            ]),
            ..FakeOctopusApi::default()
        }
    }

    #[tokio::test]
    async fn reports_enabled_tenants_without_recent_tasks() {
        let ctx = api().into_context(AuditConfig::default());

        let result = UnusedTenants::new(ctx).execute(4).await.unwrap().unwrap();

        assert_eq!(result.severity(), Severity::Warning);
        assert_eq!(
            result.description(),
            "The following tenants have not had any tasks in 90 days:\nStale\nNever Started"
        );
    }

    #[tokio::test]
    async fn window_follows_configuration() {
        let config = AuditConfig {
            max_days_since_last_task: 365,
            ..AuditConfig::default()
        };
        let ctx = api()
            .fail("Tenants-4", ApiError::with_status(404, "Not found"))
            .into_context(config);

        let result = UnusedTenants::new(ctx).execute(4).await.unwrap().unwrap();

        assert_eq!(result.severity(), Severity::Ok);
    }

    #[tokio::test]
    async fn first_fatal_task_lookup_fails_the_check() {
        let ctx = api()
            .fail("Tenants-2", ApiError::with_status(500, "boom"))
            .into_context(AuditConfig::default());

        let err = UnusedTenants::new(ctx).execute(4).await.unwrap_err();

        assert_eq!(err.as_api_error().map(|e| e.message.as_str()), Some("boom"));
    }
}
