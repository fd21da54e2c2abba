use std::collections::HashMap;

use async_trait::async_trait;
use audit::{Check, CheckError, CheckGroup, CheckId, CheckResult, Event, Severity};
use chrono::{DateTime, Duration, Utc};

use crate::CheckContext;

pub const ID: &str = "OctoLintDeploymentQueuedTime";

const QUEUED: &str = "DeploymentQueued";
const STARTED: &str = "DeploymentStarted";

/// Deployments waiting longer than this are considered queued too long.
const MAX_QUEUE_MINUTES: i64 = 1;

/// Number of long-queued deployments at which the check warns.
const MAX_QUEUED_DEPLOYMENTS: usize = 10;

/// Looks for deployments that sat in the task queue, which points at an
/// undersized task cap or a missing HA node.
///
/// Deployments are reported by id only, not as links into the Octopus web
/// portal: the API port has no deployment lookup to build the project part
/// of the URL from.
pub struct DeploymentQueuedTime {
    id: CheckId,
    ctx: CheckContext,
}

#[derive(Debug, PartialEq)]
struct QueuedDeployment {
    deployment_id: String,
    queued_for: Duration,
}

impl QueuedDeployment {
    fn describe(&self) -> String {
        let minutes = self.queued_for.num_milliseconds() as f64 / 60_000.0;
        format!("{} ({minutes:.1}m)", self.deployment_id)
    }
}

impl DeploymentQueuedTime {
    pub fn new(ctx: CheckContext) -> Self {
        Self {
            id: CheckId::from_static(ID),
            ctx,
        }
    }
}

fn deployment_of(event: &Event) -> Option<&str> {
    event
        .related_document_ids
        .iter()
        .find(|d| d.starts_with("Deployments-"))
        .map(String::as_str)
}

/// Pairs queued and started events by deployment and keeps those that waited
/// longer than [`MAX_QUEUE_MINUTES`]. Output follows the order of the queued
/// events.
///
/// Each deployment is paired with a single started event: when several are
/// recorded (a retried deployment), the last one in `events` wins. Octopus
/// lists events newest first, so that is the earliest start.
fn long_queued(events: &[Event]) -> Vec<QueuedDeployment> {
    let mut started: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for event in events.iter().filter(|e| e.category == STARTED) {
        if let Some(deployment) = deployment_of(event) {
            started.insert(deployment, event.occurred);
        }
    }

    let threshold = Duration::minutes(MAX_QUEUE_MINUTES);
    events
        .iter()
        .filter(|e| e.category == QUEUED)
        .filter_map(|queued| {
            let deployment = deployment_of(queued)?;
            let queued_for = *started.get(deployment)? - queued.occurred;
            (queued_for > threshold).then(|| QueuedDeployment {
                deployment_id: deployment.to_string(),
                queued_for,
            })
        })
        .collect()
}

#[async_trait]
impl Check for DeploymentQueuedTime {
    fn id(&self) -> &CheckId {
        &self.id
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Performance
    }

    async fn execute(&self, _concurrency: usize) -> Result<Option<CheckResult>, CheckError> {
        let events = match self
            .ctx
            .api
            .events_by_category(&[QUEUED, STARTED], self.ctx.config.max_deployment_tasks)
            .await
        {
            Ok(events) => events,
            Err(err) => return self.ctx.handle_error(&self.id, self.group(), err),
        };

        let deployments = long_queued(&events);
        tracing::debug!(scanned = events.len(), queued = deployments.len(), "Paired deployment events");

        let lines: Vec<String> = deployments.iter().map(QueuedDeployment::describe).collect();

        if deployments.len() >= MAX_QUEUED_DEPLOYMENTS {
            return Ok(Some(CheckResult::new(
                self.id.clone(),
                self.group(),
                Severity::Warning,
                format!(
                    "Found {} deployments that were queued for longer than {MAX_QUEUE_MINUTES} minutes. \
                     Consider increasing the task cap or adding a HA node to reduce task queue times:\n{}",
                    deployments.len(),
                    lines.join("\n")
                ),
            )));
        }

        Ok(Some(CheckResult::new(
            self.id.clone(),
            self.group(),
            Severity::Ok,
            format!(
                "Found {} deployment tasks that were queued for longer than {MAX_QUEUE_MINUTES} minutes:\n{}",
                deployments.len(),
                lines.join(", ")
            ),
        )))
    }
}
