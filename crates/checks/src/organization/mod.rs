//! Rules about how a space is organised: unused, empty, or sprawling
//! resources.

pub mod empty_projects;
pub mod environment_count;
pub mod lifecycle_retention;
pub mod unhealthy_targets;
pub mod unused_tenants;

pub use empty_projects::EmptyProjects;
pub use environment_count::EnvironmentCount;
pub use lifecycle_retention::LifecycleRetention;
pub use unhealthy_targets::UnhealthyTargets;
pub use unused_tenants::UnusedTenants;
