use async_trait::async_trait;
use audit::{
    filtered_projects, Check, CheckError, CheckGroup, CheckId, CheckResult, Project, Runbook,
    Severity,
};

use crate::{collect_outputs, fan_out, CheckContext};

pub const ID: &str = "OctoLintEmptyProject";

/// Flags projects with neither deployment steps nor runbooks.
pub struct EmptyProjects {
    id: CheckId,
    ctx: CheckContext,
}

impl EmptyProjects {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }

    async fn step_count(&self, project: &Project) -> Result<usize, CheckError> {
        let Some(process_id) = &project.deployment_process_id else {
            return Ok(0);
        };
        let process = self.ctx.api.deployment_process(process_id).await?;
        Ok(process.steps.len())
    }
}

fn runbooks_in_project(project: &Project, runbooks: &[Runbook]) -> usize {
    runbooks.iter().filter(|r| r.project_id == project.id).count()
}

#[async_trait]
impl Check for EmptyProjects {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Organization
    }

    async fn execute(&self, concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let limit = self.ctx.config.max_empty_project_check_projects;
        let projects =
            match filtered_projects(self.ctx.api.as_ref(), &self.ctx.projects, limit).await {
                Ok(projects) => projects,
                Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
            };

        let runbooks = match self.ctx.api.runbooks().await {
            Ok(runbooks) => runbooks,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let outputs = fan_out(projects, concurrency, |_, project| {
            let runbooks = &runbooks;
            async move {
                let steps = self.step_count(&project).await?;
                let empty = steps == 0 && runbooks_in_project(&project, runbooks) == 0;
                Ok::<_, CheckError>(empty.then_some(project.name))
            }
        })
        .await;

        let empty: Vec<String> = match collect_outputs(self.ctx.classifier.as_ref(), outputs) {
            Ok(names) => names.into_iter().flatten().collect(),
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        if !empty.is_empty() {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "The following projects have no runbooks and no deployment process:\n{}",
                    empty.join("\n")
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            "There are no empty projects",
        )))
    }
}
