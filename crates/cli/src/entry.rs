//! Wiring for a single audit run: client, factory, executor, then reporting.

use std::sync::Arc;

use anyhow::Context;
use audit::{
    filter_by_severity, sort_results, Check, CheckError, CheckResult, PermissiveErrorClassifier,
};
use checks::{CheckExecutor, CheckFactory, FailureDisposition};
use octopus::OctopusClient;

use crate::settings::Settings;

/// Runs every enabled check and returns the results worth reporting,
/// filtered by the minimum severity and sorted for display.
///
/// # Errors
///
/// Fails when settings are incomplete, the server or space cannot be
/// reached, or the executor cannot schedule the checks. Individual check
/// failures are logged and leave the run intact.
pub async fn run(settings: &Settings) -> anyhow::Result<Vec<CheckResult>> {
    let (Some(url), Some(credentials), Some(space)) =
        (&settings.url, &settings.credentials, &settings.space)
    else {
        anyhow::bail!("the server URL, credentials and space must all be set");
    };

    let client = OctopusClient::connect(url, credentials, space)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    tracing::info!(server = %url, space = %client.space(), "Connected to Octopus");

    let config = Arc::new(settings.audit.clone());
    let factory = CheckFactory::new(
        Arc::new(client),
        Arc::new(PermissiveErrorClassifier),
        config.clone(),
    )
    .context("failed to build checks")?;

    let results = CheckExecutor::from_config(&config)
        .execute_checks(
            factory.build_all_checks(),
            failure_handler(settings.verbose_errors),
        )
        .await
        .context("failed to run checks")?;

    let mut results = filter_by_severity(results, settings.min_severity);
    sort_results(&mut results);
    Ok(results)
}

/// Logs a check that ended without a result. The full error is only shown
/// at warn level when `verbose_errors` is set.
pub fn failure_handler(
    verbose_errors: bool,
) -> impl Fn(&dyn Check, &CheckError) -> FailureDisposition + Send + Sync + 'static {
    move |check: &dyn Check, err: &CheckError| {
        tracing::warn!(check_id = %check.id(), "Failed to execute check {}", check.id());
        if verbose_errors {
            tracing::warn!(check_id = %check.id(), error = ?err, "Check failure detail");
        } else {
            tracing::debug!(check_id = %check.id(), error = ?err, "Check failure detail");
        }
        FailureDisposition::Reported
    }
}

/// Serialises the report written to stdout.
pub fn render_report(results: &[CheckResult]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(results).context("failed to serialise results")
}
