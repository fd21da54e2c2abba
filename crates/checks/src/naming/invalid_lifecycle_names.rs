use async_trait::async_trait;
use audit::{Check, CheckError, CheckGroup, CheckId, CheckResult, Severity};
use regex::Regex;

use crate::CheckContext;

pub const ID: &str = "OctoLintInvalidLifecycleNames";

/// Flags lifecycles whose names do not match `lifecycle_name_regex`.
///
/// Not applicable when no pattern is configured.
pub struct InvalidLifecycleNames {
    id: CheckId,
    ctx: CheckContext,
}

impl InvalidLifecycleNames {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }
}

#[async_trait]
impl Check for InvalidLifecycleNames {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Naming
    }

    async fn execute(&self, _concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let pattern = self.ctx.config.lifecycle_name_regex.as_str();
        if pattern.trim().is_empty() {
            return Ok(None);
        }

        let Ok(regex) = Regex::new(pattern) else {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Error,
                format!("The supplied regex {pattern} does not compile"),
            )));
        };

        let lifecycles = match self.ctx.api.lifecycles().await {
            Ok(lifecycles) => lifecycles,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let invalid: Vec<&str> = lifecycles
            .iter()
            .filter(|l| !regex.is_match(&l.name))
            .map(|l| l.name.as_str())
            .collect();

        if !invalid.is_empty() {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "The following lifecycle names do not match the regex {pattern}:\n{}",
                    invalid.join("\n")
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            format!("All lifecycles match the regex {pattern}"),
        )))
    }
}
