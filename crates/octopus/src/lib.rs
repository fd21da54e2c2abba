//! octolint Octopus Deploy infrastructure adapter.
//!
//! Implements the [`audit::OctopusApi`] port over the Octopus REST API with
//! `reqwest`. Every request failure is mapped onto [`audit::ApiError`] so the
//! error classifier never sees transport types.
//!
//! ## Architectural Layer
//!
//! **Infrastructure layer.** No audit rules live here.

pub mod client;
pub mod errors;

#[cfg(test)]
mod test_server;

pub use client::{parse_server_url, Credentials, OctopusClient};
pub use errors::ClientError;
