//! Outbound HTTP: transport seam and the shared remote verifier.

pub mod http;
pub mod verifier;
