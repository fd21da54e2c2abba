use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Every setting is optional here so flags and `OCTOLINT_*` variables can
/// be told apart from values that should come from the config file.
#[derive(Debug, Parser)]
#[command(
    name = "octolint",
    version,
    about = "Audits an Octopus Deploy space for common configuration problems"
)]
pub struct Cli {
    /// The Octopus URL e.g. https://myinstance.octopus.app
    #[arg(long, env = "OCTOLINT_URL")]
    pub url: Option<String>,

    /// The Octopus space name or ID
    #[arg(long, env = "OCTOLINT_SPACE")]
    pub space: Option<String>,

    /// The Octopus API key
    #[arg(long, env = "OCTOLINT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// An access token, used when no API key is supplied
    #[arg(long, env = "OCTOLINT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// A comma separated list of checks to skip
    #[arg(long, env = "OCTOLINT_SKIP_TESTS")]
    pub skip_tests: Option<String>,

    /// A comma separated list of checks to run. Overrides --skip-tests
    #[arg(long, env = "OCTOLINT_ONLY_TESTS")]
    pub only_tests: Option<String>,

    /// Name of the configuration file, without the .json extension
    #[arg(long, env = "OCTOLINT_CONFIG_FILE", default_value = "octolint")]
    pub config_file: String,

    /// Directory holding the configuration file
    #[arg(long, env = "OCTOLINT_CONFIG_PATH", default_value = ".")]
    pub config_path: PathBuf,

    /// Maximum number of checks running at once
    #[arg(long, env = "OCTOLINT_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Lower bound on each check's own concurrent requests
    #[arg(long, env = "OCTOLINT_MIN_INTERNAL_CONCURRENCY")]
    pub min_internal_concurrency: Option<usize>,

    /// Lowest severity to report (ok, permission, warning, error)
    #[arg(long, env = "OCTOLINT_MIN_SEVERITY")]
    pub min_severity: Option<String>,

    /// Print debug logs
    #[arg(long, env = "OCTOLINT_VERBOSE")]
    pub verbose: bool,

    /// Log the details of failed checks at warn level
    #[arg(long, env = "OCTOLINT_VERBOSE_ERRORS")]
    pub verbose_errors: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "OCTOLINT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, env = "OCTOLINT_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Print the id of every available check and exit
    #[arg(long)]
    pub list_checks: bool,

    /// Exclude a project from being scanned. May be repeated
    #[arg(long, env = "OCTOLINT_EXCLUDE_PROJECTS", value_delimiter = ',')]
    pub exclude_projects: Vec<String>,

    /// Scan only these projects. May be repeated
    #[arg(long, env = "OCTOLINT_EXCLUDE_PROJECTS_EXCEPT", value_delimiter = ',')]
    pub exclude_projects_except: Vec<String>,

    /// Exclude projects whose names match this regular expression. May be repeated
    #[arg(long, env = "OCTOLINT_EXCLUDE_PROJECTS_REGEX")]
    pub exclude_projects_regex: Vec<String>,

    /// Regular expression lifecycle names must match
    #[arg(long, env = "OCTOLINT_LIFECYCLE_NAME_REGEX")]
    pub lifecycle_name_regex: Option<String>,

    /// Maximum number of environments before a warning is raised
    #[arg(long, env = "OCTOLINT_MAX_ENVIRONMENTS")]
    pub max_environments: Option<usize>,

    /// Days without a task before a tenant counts as unused
    #[arg(long, env = "OCTOLINT_MAX_DAYS_SINCE_LAST_TASK")]
    pub max_days_since_last_task: Option<u32>,

    /// Maximum projects scanned for missing steps. 0 scans all
    #[arg(long, env = "OCTOLINT_MAX_EMPTY_PROJECT_CHECK_PROJECTS")]
    pub max_empty_project_check_projects: Option<usize>,

    /// Maximum targets scanned for health. 0 scans all
    #[arg(long, env = "OCTOLINT_MAX_UNHEALTHY_TARGETS")]
    pub max_unhealthy_targets: Option<usize>,

    /// Maximum tenants scanned for recent tasks. 0 scans all
    #[arg(long, env = "OCTOLINT_MAX_UNUSED_TENANTS")]
    pub max_unused_tenants: Option<usize>,

    /// Maximum targets and workers scanned for SHA1 certificates. 0 scans all
    #[arg(long, env = "OCTOLINT_MAX_SHA1_CERTIFICATES_MACHINES")]
    pub max_sha1_certificates_machines: Option<usize>,

    /// Maximum deployment events scanned for queue times. 0 scans all
    #[arg(long, env = "OCTOLINT_MAX_DEPLOYMENT_TASKS")]
    pub max_deployment_tasks: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_flags() {
        let cli = Cli::try_parse_from([
            "octolint",
            "--url",
            "https://octopus.example.com",
            "--space",
            "Default",
            "--api-key",
            "API-XXXX",
            "--max-concurrency",
            "4",
            "--exclude-projects",
            "A,B",
            "--exclude-projects",
            "C",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("https://octopus.example.com"));
        assert_eq!(cli.max_concurrency, Some(4));
        assert_eq!(cli.exclude_projects, vec!["A", "B", "C"]);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.config_file, "octolint");
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
