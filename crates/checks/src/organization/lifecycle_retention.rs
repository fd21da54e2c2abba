use async_trait::async_trait;
use audit::{Check, CheckError, CheckGroup, CheckId, CheckResult, Lifecycle, Severity};

use crate::CheckContext;

pub const ID: &str = "OctoRecLifecycleRetention";

/// Flags lifecycles, or any of their phases, that keep releases or deployed
/// files forever.
pub struct LifecycleRetention {
    id: CheckId,
    ctx: CheckContext,
}

impl LifecycleRetention {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }
}

fn keeps_forever(lifecycle: &Lifecycle) -> bool {
    let phase_keeps_forever = lifecycle.phases.iter().any(|p| {
        let releases = p
            .release_retention_policy
            .as_ref()
            .is_some_and(|r| r.should_keep_forever);
        let files = p
            .tentacle_retention_policy
            .as_ref()
            .is_some_and(|r| r.should_keep_forever);
        releases || files
    });

    lifecycle.release_retention_policy.should_keep_forever
        || lifecycle.tentacle_retention_policy.should_keep_forever
        || phase_keeps_forever
}

#[async_trait]
impl Check for LifecycleRetention {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Organization
    }

    async fn execute(&self, _concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let lifecycles = match self.ctx.api.lifecycles().await {
            Ok(lifecycles) => lifecycles,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let forever: Vec<&str> = lifecycles
            .iter()
            .filter(|l| keeps_forever(l))
            .map(|l| l.name.as_str())
            .collect();

        if !forever.is_empty() {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "The following lifecycles have retention policies that keep releases or files forever:\n{}",
                    forever.join("\n")
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            "There are no lifecycles with retention policies that keep releases or files forever",
        )))
    }
}
