//! Settings merge for the `octolint` binary.
//!
//! Precedence, highest first: command-line flags and `OCTOLINT_*` variables
//! (clap resolves both), the JSON config file, the `OCTOPUS_CLI_*` fallbacks
//! for the server and API key, then the defaults.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use audit::{AuditConfig, Severity};
use octopus::{parse_server_url, Credentials};
use serde::Deserialize;

use crate::args::{Cli, LogFormat};

/// Server URL fallback shared with the Octopus CLI.
pub const SERVER_FALLBACK_VAR: &str = "OCTOPUS_CLI_SERVER";
/// API key fallback shared with the Octopus CLI.
pub const API_KEY_FALLBACK_VAR: &str = "OCTOPUS_CLI_API_KEY";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Optional values read from `<config-path>/<config-file>.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSettings {
    pub url: Option<String>,
    pub space: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub skip_tests: Option<String>,
    pub only_tests: Option<String>,
    pub max_concurrency: Option<usize>,
    pub min_internal_concurrency: Option<usize>,
    pub min_severity: Option<String>,
    pub verbose: Option<bool>,
    pub verbose_errors: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub exclude_projects: Option<Vec<String>>,
    pub exclude_projects_except: Option<Vec<String>>,
    pub exclude_projects_regex: Option<Vec<String>>,
    pub lifecycle_name_regex: Option<String>,
    pub max_environments: Option<usize>,
    pub max_days_since_last_task: Option<u32>,
    pub max_empty_project_check_projects: Option<usize>,
    pub max_unhealthy_targets: Option<usize>,
    pub max_unused_tenants: Option<usize>,
    pub max_sha1_certificates_machines: Option<usize>,
    pub max_deployment_tasks: Option<usize>,
}

impl FileSettings {
    /// Reads the config file if it exists.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file {}", path.display()))
            }
        };

        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Fully merged settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: Option<String>,
    pub space: Option<String>,
    pub credentials: Option<Credentials>,
    pub min_severity: Severity,
    pub verbose: bool,
    pub verbose_errors: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    pub audit: AuditConfig,
}

impl Settings {
    /// Merges the parsed arguments with the config file they point at.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed config file, or an unknown
    /// severity name.
    pub fn load(cli: Cli) -> anyhow::Result<Self> {
        let file = FileSettings::load(&config_file_path(&cli))?;
        Self::merge(cli, file, |name| std::env::var(name).ok())
    }

    /// Merges explicit sources. `env` looks up the `OCTOPUS_CLI_*` fallbacks.
    pub fn merge(
        cli: Cli,
        file: FileSettings,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let url = non_blank(cli.url)
            .or_else(|| non_blank(file.url))
            .or_else(|| non_blank(env(SERVER_FALLBACK_VAR)));
        let api_key = non_blank(cli.api_key)
            .or_else(|| non_blank(file.api_key))
            .or_else(|| non_blank(env(API_KEY_FALLBACK_VAR)));
        let access_token = non_blank(cli.access_token).or_else(|| non_blank(file.access_token));
        let credentials = match (api_key, access_token) {
            (Some(key), _) => Some(Credentials::ApiKey(key)),
            (None, Some(token)) => Some(Credentials::AccessToken(token)),
            (None, None) => None,
        };

        let min_severity = match cli.min_severity.or(file.min_severity) {
            Some(name) => match Severity::parse(&name) {
                Some(severity) => severity,
                None => bail!(
                    "The severity \"{name}\" is not valid. Use ok, permission, warning or error"
                ),
            },
            None => Severity::Warning,
        };

        let verbose = cli.verbose || file.verbose.unwrap_or(false);
        let log_level = match cli.log_level.or(file.log_level) {
            Some(level) => level,
            None if verbose => "debug".to_string(),
            None => DEFAULT_LOG_LEVEL.to_string(),
        };

        let defaults = AuditConfig::default();
        let audit = AuditConfig {
            max_concurrency: cli
                .max_concurrency
                .or(file.max_concurrency)
                .unwrap_or(defaults.max_concurrency),
            min_internal_concurrency: cli
                .min_internal_concurrency
                .or(file.min_internal_concurrency)
                .unwrap_or(defaults.min_internal_concurrency),
            skip_checks: split_ids(cli.skip_tests.or(file.skip_tests)),
            only_checks: split_ids(cli.only_tests.or(file.only_tests)),
            exclude_projects: list_or(cli.exclude_projects, file.exclude_projects),
            exclude_projects_except: list_or(
                cli.exclude_projects_except,
                file.exclude_projects_except,
            ),
            exclude_projects_regex: list_or(cli.exclude_projects_regex, file.exclude_projects_regex),
            lifecycle_name_regex: cli
                .lifecycle_name_regex
                .or(file.lifecycle_name_regex)
                .unwrap_or(defaults.lifecycle_name_regex),
            max_environments: cli
                .max_environments
                .or(file.max_environments)
                .unwrap_or(defaults.max_environments),
            max_days_since_last_task: cli
                .max_days_since_last_task
                .or(file.max_days_since_last_task)
                .unwrap_or(defaults.max_days_since_last_task),
            max_empty_project_check_projects: cli
                .max_empty_project_check_projects
                .or(file.max_empty_project_check_projects)
                .unwrap_or(defaults.max_empty_project_check_projects),
            max_unhealthy_targets: cli
                .max_unhealthy_targets
                .or(file.max_unhealthy_targets)
                .unwrap_or(defaults.max_unhealthy_targets),
            max_unused_tenants: cli
                .max_unused_tenants
                .or(file.max_unused_tenants)
                .unwrap_or(defaults.max_unused_tenants),
            max_sha1_certificates_machines: cli
                .max_sha1_certificates_machines
                .or(file.max_sha1_certificates_machines)
                .unwrap_or(defaults.max_sha1_certificates_machines),
            max_deployment_tasks: cli
                .max_deployment_tasks
                .or(file.max_deployment_tasks)
                .unwrap_or(defaults.max_deployment_tasks),
        };

        Ok(Self {
            url,
            space: non_blank(cli.space).or_else(|| non_blank(file.space)),
            credentials,
            min_severity,
            verbose,
            verbose_errors: cli.verbose_errors || file.verbose_errors.unwrap_or(false),
            log_level,
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
            audit,
        })
    }

    /// Checks everything a run needs before any request is made.
    ///
    /// # Errors
    ///
    /// Names the first missing or malformed setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        let Some(url) = &self.url else {
            bail!("You must specify the URL with the --url argument");
        };
        if let Err(err) = parse_server_url(url) {
            bail!("The URL \"{url}\" is not valid: {err}");
        }
        if self.credentials.is_none() {
            bail!("You must specify the API key with the --api-key argument");
        }
        if self.space.is_none() {
            bail!("You must specify the space key with the --space argument");
        }

        self.audit.validate().context("invalid audit settings")?;
        Ok(())
    }
}

fn config_file_path(cli: &Cli) -> PathBuf {
    cli.config_path.join(format!("{}.json", cli.config_file))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn split_ids(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn list_or(flag: Vec<String>, file: Option<Vec<String>>) -> Vec<String> {
    if flag.is_empty() {
        file.unwrap_or_default()
    } else {
        flag
    }
}
