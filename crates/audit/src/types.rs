//! Result and severity model.
//!
//! A [`CheckResult`] is produced at most once per check execution and is
//! immutable afterwards: all fields are private and only readable through
//! accessors. [`Severity`] is totally ordered so reporters can keep results at
//! or above a threshold with a plain comparison.

use serde::{Deserialize, Serialize};

use crate::CheckId;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordered classification of a [`CheckResult`].
///
/// The declaration order is the comparison order:
/// `Ok < Permission < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The rule was evaluated and nothing was found.
    Ok,
    /// The rule could not be evaluated because of an access limitation.
    Permission,
    /// The rule found something that should be addressed.
    Warning,
    /// The rule itself is misconfigured or found a serious problem.
    Error,
}

impl Severity {
    /// Parses a severity name, ignoring case.
    ///
    /// Returns `None` for unknown names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ok" => Some(Self::Ok),
            "permission" => Some(Self::Permission),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Permission => "permission",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Check group
// ---------------------------------------------------------------------------

/// Category tag a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckGroup {
    Naming,
    Organization,
    Security,
    Performance,
}

impl std::fmt::Display for CheckGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Naming => "Naming",
            Self::Organization => "Organization",
            Self::Security => "Security",
            Self::Performance => "Performance",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Check result
// ---------------------------------------------------------------------------

/// The immutable outcome of one successful check execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    id: CheckId,
    group: CheckGroup,
    severity: Severity,
    description: String,
}

impl CheckResult {
    /// Creates a result for the check `id`.
    pub fn new(
        id: CheckId,
        group: CheckGroup,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            group,
            severity,
            description: description.into(),
        }
    }

    pub fn id(&self) -> &CheckId {
        &self.id
    }

    pub fn group(&self) -> CheckGroup {
        self.group
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable description of what the check found.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Keeps only the results whose severity is at or above `threshold`.
pub fn filter_by_severity(results: Vec<CheckResult>, threshold: Severity) -> Vec<CheckResult> {
    results
        .into_iter()
        .filter(|r| r.severity() >= threshold)
        .collect()
}

/// Sorts results by group, then id.
///
/// The executor returns results in completion order; callers that diff or
/// snapshot output sort first.
pub fn sort_results(results: &mut [CheckResult]) {
    results.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.id.cmp(&b.id)));
}
