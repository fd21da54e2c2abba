//! Rules about insecure configuration.

pub mod sha1_certificates;

pub use sha1_certificates::Sha1Certificates;
