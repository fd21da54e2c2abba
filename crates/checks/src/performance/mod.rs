//! Rules about server throughput.

pub mod deployment_queued_time;

pub use deployment_queued_time::DeploymentQueuedTime;
