//! Shared test helpers for license tests.

#![allow(dead_code)]

use billsnap_license::{
    checksum, LicenseConfig, LicenseManager, LicenseState, LicenseType, MemoryStore,
};
use chrono::{DateTime, Utc};

/// The worked example: checksum of `AB12CD34EF56` is `0DXY`.
pub const EXAMPLE_KEY: &str = "BILLSNAP-AB12-CD34-EF56-0DXY";

/// Builds a valid key from three 4-character segments.
pub fn make_key(a: &str, b: &str, c: &str) -> String {
    let check = checksum(&format!("{a}{b}{c}"));
    format!("BILLSNAP-{a}-{b}-{c}-{check}")
}

/// A manager over a fresh in-memory store with default config.
pub fn fresh_manager() -> LicenseManager<MemoryStore> {
    LicenseManager::new(LicenseConfig::default(), MemoryStore::new()).unwrap()
}

/// A manager over a store pre-seeded with `state`.
pub fn manager_with_state(state: &LicenseState) -> LicenseManager<MemoryStore> {
    let json = serde_json::to_string(state).unwrap();
    LicenseManager::new(LicenseConfig::default(), MemoryStore::with_record(json)).unwrap()
}

/// A licensed record with the given expiry.
pub fn licensed_state(valid_until: Option<DateTime<Utc>>) -> LicenseState {
    LicenseState {
        license_type: LicenseType::Licensed,
        key: Some(EXAMPLE_KEY.to_string()),
        activated_at: Some(Utc::now()),
        valid_until,
        ..LicenseState::initial(10)
    }
}
