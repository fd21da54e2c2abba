use async_trait::async_trait;
use audit::{Check, CheckError, CheckGroup, CheckId, CheckResult, Severity};

use crate::CheckContext;

pub const ID: &str = "OctoLintTooManyEnvironments";

/// Warns when a space defines more than `max_environments` environments.
pub struct EnvironmentCount {
    id: CheckId,
    ctx: CheckContext,
}

impl EnvironmentCount {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }
}

#[async_trait]
impl Check for EnvironmentCount {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Organization
    }

    async fn execute(&self, _concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let environments = match self.ctx.api.environments().await {
            Ok(environments) => environments,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let max = self.ctx.config.max_environments;
        if environments.len() > max {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "There are {} environments, which is more than the recommended maximum of {max}. \
                     Consider using tenants or fewer, broader environments.",
                    environments.len()
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            format!("There are {} environments", environments.len()),
        )))
    }
}
