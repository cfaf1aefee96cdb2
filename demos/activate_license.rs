//! License activation example.
//!
//! Activates a key against the store, prints the stored record and checks
//! for an update.
//!
//! # Running
//!
//! ```bash
//! export LOGINFORGE_STORE_KEY="ck_..."
//! export LOGINFORGE_STORE_SECRET="cs_..."
//! export LICENSE_KEY="your-license-key"
//! cargo run --example activate_license -- https://store.example.com
//! ```
//!
//! Store credentials come from the environment so they never ship inside a
//! build; point them at a server-side proxy in production.

use loginforge::{FileStore, ProAddon, StoreConfig, StoreCredentials, Viewer};
use std::sync::Arc;

fn main() {
    let store_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://store.example.com".to_string());
    let license_key = std::env::var("LICENSE_KEY").expect("Set LICENSE_KEY environment variable");

    let credentials = match StoreCredentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let store = match FileStore::new("loginforge-demo") {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Storage error: {}", e);
            std::process::exit(1);
        }
    };

    let addon = match ProAddon::new(StoreConfig::new(store_url, credentials), store) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let result = addon.activate_license(Viewer::admin(), &license_key);
    if !result.success {
        eprintln!(
            "Activation failed [{}]: {}",
            result.error_code().unwrap_or_default(),
            result.message
        );
        std::process::exit(1);
    }
    println!("{}", result.message);

    if let Ok(Some(record)) = addon.license().record() {
        match record.expires_at() {
            Some(expiry) => println!("License valid until {}", expiry.format("%Y-%m-%d")),
            None => println!("License has no expiry"),
        }
    }

    if let Some(updater) = addon.updater() {
        match updater.check_update() {
            Some(info) => println!("Update available: {} ({})", info.new_version, info.package),
            None => println!("Up to date"),
        }
    }
}
