//! Audit domain for octolint.
//!
//! This crate contains every domain concept shared across the workspace: the
//! [`Check`] contract, the immutable [`CheckResult`]/[`Severity`] model, the
//! error taxonomy, the [`ErrorClassifier`] policy, the two-level
//! [`ConcurrencyPlan`], and the [`OctopusApi`] port. Orchestration and
//! infrastructure crates implement or drive these; they never add domain
//! rules of their own.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** No runtime or I/O dependencies.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CheckId`, `ProjectId`, `AuditRunId`, etc.) |
//! | [`types`] | `Severity`, `CheckGroup`, `CheckResult` and result filtering |
//! | [`errors`] | `ApiError`, `CheckError`, `AuditError` |
//! | [`classifier`] | Soft/fatal classification of remote failures |
//! | [`concurrency`] | Top-level and per-check concurrency budgets |
//! | [`check`] | The `Check` trait |
//! | [`config`] | `AuditConfig` |
//! | [`exclusion`] | Resource name filters |
//! | [`octopus`] | The `OctopusApi` port and its resource types |

pub mod check;
pub mod classifier;
pub mod concurrency;
pub mod config;
pub mod errors;
pub mod exclusion;
pub mod identifiers;
pub mod octopus;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use check::{Check, CheckCollection};
pub use classifier::{ErrorClassification, ErrorClassifier, PermissiveErrorClassifier};
pub use concurrency::{internal_concurrency, top_level_concurrency, ConcurrencyPlan};
pub use config::AuditConfig;
pub use errors::{ApiError, AuditError, CheckError};
pub use exclusion::ResourceFilter;
pub use identifiers::{
    AuditRunId, CheckId, DeploymentProcessId, MachineId, ProjectId, SpaceId, TenantId,
};
pub use octopus::{
    filtered_projects, DeploymentProcess, DeploymentStep, Endpoint, Environment, Event, Lifecycle,
    Machine, OctopusApi, Phase, Project, RetentionPolicy, Runbook, ServerCertificate, ServerTask,
    Tenant,
};
pub use types::{filter_by_severity, sort_results, CheckGroup, CheckResult, Severity};
