use async_trait::async_trait;
use audit::{Check, CheckError, CheckGroup, CheckId, CheckResult, Machine, Severity};
use chrono::{Duration, Utc};

use crate::{collect_outputs, fan_out, CheckContext};

pub const ID: &str = "OctoLintUnhealthyTargets";

const HEALTHY_EVENT: &str = "MachineHealthy";
const UNHEALTHY_STATUS: &str = "Unhealthy";
const HEALTH_WINDOW_DAYS: i64 = 30;

/// Flags deployment targets that have not been healthy at any point in the
/// last 30 days.
pub struct UnhealthyTargets {
    id: CheckId,
    ctx: CheckContext,
}

impl UnhealthyTargets {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }

    async fn healthy_recently(&self, machine: &Machine) -> Result<bool, CheckError> {
        if machine.health_status != UNHEALTHY_STATUS {
            return Ok(true);
        }

        let cutoff = Utc::now() - Duration::days(HEALTH_WINDOW_DAYS);
        let events = self.ctx.api.machine_events(&machine.id).await?;
        Ok(events
            .iter()
            .any(|e| e.category == HEALTHY_EVENT && e.occurred > cutoff))
    }
}

#[async_trait]
impl Check for UnhealthyTargets {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Organization
    }

    async fn execute(&self, concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let machines = match self.ctx.api.machines(self.ctx.config.max_unhealthy_targets).await {
            Ok(machines) => machines,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let outputs = fan_out(machines, concurrency, |_, machine| async move {
            let healthy = self.healthy_recently(&machine).await?;
            Ok::<_, CheckError>((!healthy).then_some(machine.name))
        })
        .await;

        let unhealthy: Vec<String> = match collect_outputs(self.ctx.classifier.as_ref(), outputs) {
            Ok(names) => names.into_iter().flatten().collect(),
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        if !unhealthy.is_empty() {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "The following targets have not been healthy in the last {HEALTH_WINDOW_DAYS} days:\n{}",
                    unhealthy.join("\n")
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            format!(
                "There are no targets that were unhealthy for all of the last {HEALTH_WINDOW_DAYS} days"
            ),
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use audit::{ApiError, AuditConfig};

    use super::*;
    use crate::test_support::{event, machine, FakeOctopusApi};

    fn api() -> FakeOctopusApi {
        FakeOctopusApi {
            machines: vec![
                machine("Machines-1", "web-01", "Healthy", None),
                machine("Machines-2", "web-02", "Unhealthy", None),
                machine("Machines-3", "web-03", "Unhealthy", None),
            ],
            machine_events: HashMap::from([
                (
                    "Machines-2".to_string(),
                    vec![event("MachineHealthy", Utc::now() - Duration::days(2), &[])],
                ),
                (
                    "Machines-3".to_string(),
                    vec![event("MachineHealthy", Utc::now() - Duration::days(45), &[])],
                ),
            ]),
            ..FakeOctopusApi::default()
        }
    }

    #[tokio::test]
    async fn reports_targets_without_recent_healthy_event() {
        let ctx = api().into_context(AuditConfig::default());

        let result = UnhealthyTargets::new(ctx).execute(2).await.unwrap().unwrap();

        assert_eq!(result.severity(), Severity::Warning);
        assert!(result.description().ends_with(":\nweb-03"));
    }

    #[tokio::test]
    async fn forbidden_event_lookup_skips_target() {
        let api = api().fail("Machines-3", ApiError::with_status(403, "Forbidden"));
        let ctx = api.into_context(AuditConfig::default());

        let result = UnhealthyTargets::new(ctx).execute(2).await.unwrap().unwrap();

        assert_eq!(result.severity(), Severity::Ok);
    }

    #[tokio::test]
    async fn forbidden_machine_listing_is_permission_result() {
        let api = api().fail("machines", ApiError::with_status(401, "Unauthorized"));
        let ctx = api.into_context(AuditConfig::default());

        let result = UnhealthyTargets::new(ctx).execute(2).await.unwrap().unwrap();

        assert_eq!(result.severity(), Severity::Permission);
    }
}
