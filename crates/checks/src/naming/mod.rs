//! Rules about how resources are named.

pub mod invalid_lifecycle_names;

pub use invalid_lifecycle_names::InvalidLifecycleNames;
