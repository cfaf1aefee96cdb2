//! Store-backed licensing.

pub mod client;
pub mod record;

pub use client::{Deactivation, LicenseClient, RemoteAck};
pub use record::{LicenseRecord, LicenseStatus};
