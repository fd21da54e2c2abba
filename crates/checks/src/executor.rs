//! Concurrent check execution.
//!
//! [`CheckExecutor`] runs a whole [`CheckCollection`] under the two-level
//! budget from [`ConcurrencyPlan`]: a semaphore admits at most `top_level`
//! checks at once, and every admitted check receives `internal_per_check` as
//! the budget for its own fan-out.
//!
//! # Failure isolation
//!
//! - A check returning an error is handed to the caller's failure handler
//!   once. Sibling checks are never cancelled, blocked, or affected.
//! - A check that panics is treated the same way, with a
//!   [`CheckError::Internal`] describing the panic.
//! - A check returning `Ok(None)` contributes nothing to the results.
//! - Only scheduling problems (no admission slots, closed semaphore, a task
//!   that could not be joined) fail the run as a whole.
//!
//! Results are returned in completion order.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use audit::{
    AuditConfig, AuditError, AuditRunId, Check, CheckCollection, CheckError, CheckResult,
    ConcurrencyPlan,
};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// What the failure handler did with a failed check.
///
/// Informational only: the executor logs it and carries on either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// The failure was surfaced to the user.
    Reported,
    /// The failure was deliberately not surfaced.
    Suppressed,
}

/// Runs check collections under a bounded two-level concurrency budget.
#[derive(Debug, Clone, Copy)]
pub struct CheckExecutor {
    max_concurrency: usize,
    min_internal_concurrency: usize,
}

impl CheckExecutor {
    pub fn new(max_concurrency: usize, min_internal_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            min_internal_concurrency,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.max_concurrency, config.min_internal_concurrency)
    }

    /// Executes every check to completion and returns the results they produced.
    ///
    /// `on_failure` is called exactly once for each check whose `execute`
    /// returned an error (or panicked). It must not panic itself.
    ///
    /// Dropping the returned future aborts all check tasks still running.
    ///
    /// # Errors
    ///
    /// [`AuditError::Scheduling`] when checks cannot be scheduled at all.
    pub async fn execute_checks<H>(
        &self,
        checks: CheckCollection,
        on_failure: H,
    ) -> Result<Vec<CheckResult>, AuditError>
    where
        H: Fn(&dyn Check, &CheckError) -> FailureDisposition + Send + Sync + 'static,
    {
        let run_id = AuditRunId::new_random();
        let span = tracing::info_span!("audit_run", %run_id);

        self.run(checks, Arc::new(on_failure)).instrument(span).await
    }

    async fn run<H>(
        &self,
        checks: CheckCollection,
        on_failure: Arc<H>,
    ) -> Result<Vec<CheckResult>, AuditError>
    where
        H: Fn(&dyn Check, &CheckError) -> FailureDisposition + Send + Sync + 'static,
    {
        let plan = ConcurrencyPlan::new(
            self.max_concurrency,
            self.min_internal_concurrency,
            checks.len(),
        );

        if checks.is_empty() {
            tracing::info!("No checks enabled");
            return Ok(Vec::new());
        }

        if plan.top_level == 0 {
            return Err(AuditError::Scheduling {
                message: format!(
                    "no concurrency slots available for {} checks (max_concurrency is 0)",
                    checks.len()
                ),
            });
        }

        tracing::info!(
            checks = checks.len(),
            top_level = plan.top_level,
            internal_per_check = plan.internal_per_check,
            "Starting checks"
        );

        let semaphore = Arc::new(Semaphore::new(plan.top_level));
        let results: Arc<Mutex<Vec<CheckResult>>> =
            Arc::new(Mutex::new(Vec::with_capacity(checks.len())));
        let mut join_set: JoinSet<()> = JoinSet::new();

        for check in checks {
            let permit = semaphore.clone().acquire_owned().await.map_err(|e| {
                AuditError::Scheduling {
                    message: format!("check semaphore closed: {e}"),
                }
            })?;

            let check_span = tracing::debug_span!(
                "check",
                check_id = %check.id(),
                group = %check.group()
            );
            let results = results.clone();
            let on_failure = on_failure.clone();
            let internal = plan.internal_per_check;

            join_set.spawn(
                async move {
                    let _permit = permit;
                    run_check(check.as_ref(), internal, &results, on_failure.as_ref()).await;
                }
                .instrument(check_span),
            );
        }

        while let Some(joined) = join_set.join_next().await {
            if let Err(join_err) = joined {
                join_set.abort_all();
                return Err(AuditError::Scheduling {
                    message: format!("check task could not be joined: {join_err}"),
                });
            }
        }

        let collected = std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));
        tracing::info!(results = collected.len(), "Checks finished");
        Ok(collected)
    }
}

async fn run_check<H>(
    check: &dyn Check,
    concurrency: usize,
    results: &Mutex<Vec<CheckResult>>,
    on_failure: &H,
) where
    H: Fn(&dyn Check, &CheckError) -> FailureDisposition,
{
    tracing::debug!("Starting check");

    let outcome = match AssertUnwindSafe(check.execute(concurrency)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(CheckError::Internal {
            message: format!("check panicked: {}", panic_message(panic.as_ref())),
        }),
    };

    match outcome {
        Ok(Some(result)) => {
            tracing::debug!(severity = %result.severity(), "Check produced a result");
            results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(result);
        }
        Ok(None) => tracing::debug!("Check not applicable"),
        Err(err) => {
            tracing::debug!(error = %err, "Check failed");
            let disposition = on_failure(check, &err);
            tracing::debug!(?disposition, "Failure handled");
        }
    }

    tracing::debug!("Ended check");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
