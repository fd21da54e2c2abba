//! Newtype domain identifiers.
//!
//! Check ids and Octopus resource ids are all strings on the wire. Wrapping
//! them in distinct newtypes prevents accidentally passing, for example, a
//! [`ProjectId`] where a [`CheckId`] is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is blank.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: checks
// ---------------------------------------------------------------------------

string_id! {
    /// Stable identity of a check (e.g. `"OctoLintEmptyProject"`).
    ///
    /// Used by the skip/only filters and carried on every result the check
    /// produces.
    CheckId
}

impl CheckId {
    /// Creates a [`CheckId`] from a compile-time constant.
    ///
    /// Registered check ids are non-empty literals, so this never needs the
    /// `Option` returned by [`CheckId::new`].
    pub fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Identifiers: Octopus resources
// ---------------------------------------------------------------------------

string_id! {
    /// An Octopus space id (e.g. `"Spaces-1"`).
    SpaceId
}

string_id! {
    /// An Octopus project id (e.g. `"Projects-42"`).
    ProjectId
}

string_id! {
    /// An Octopus deployment process id (e.g. `"deploymentprocess-Projects-42"`).
    DeploymentProcessId
}

string_id! {
    /// A deployment target or worker id (e.g. `"Machines-7"`, `"Workers-3"`).
    MachineId
}

string_id! {
    /// An Octopus tenant id (e.g. `"Tenants-12"`).
    TenantId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single audit run (one invocation of the executor).
///
/// Generated fresh for every run and attached to the run's tracing span so
/// all log events from one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditRunId(Uuid);

impl AuditRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for AuditRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(CheckId::new("").is_none());
        assert!(CheckId::new("   ").is_none());
        assert_eq!(
            ProjectId::new("Projects-1").map(|p| p.to_string()),
            Some("Projects-1".to_string())
        );
    }

    #[test]
    fn identifiers_serialise_as_plain_strings() {
        let id = CheckId::from_static("OctoLintEmptyProject");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"OctoLintEmptyProject\"");
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(AuditRunId::new_random(), AuditRunId::new_random());
    }
}
