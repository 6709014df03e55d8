//! Licensing configuration.

use serde::{Deserialize, Serialize};

/// Invoices allowed before a license is required.
pub const TRIAL_LIMIT: u32 = 10;

/// Literal that every offline key starts with.
pub const KEY_PREFIX: &str = "BILLSNAP";

/// Name of the persisted license record.
pub const STORAGE_KEY: &str = "billsnap_license";

/// Lemon Squeezy license validation endpoint.
pub const DEFAULT_VALIDATION_URL: &str = "https://api.lemonsqueezy.com/v1/licenses/validate";

/// Request timeout for remote validation, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for a [`crate::LicenseManager`].
///
/// A trial limit of zero disables the trial: fresh state starts
/// `unlicensed` and the gate stays closed until activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Invoices allowed before a license is required.
    pub trial_limit: u32,
    /// Prefix segment for offline keys.
    pub key_prefix: String,
    /// Name of the persisted record.
    pub storage_key: String,
    /// Remote validation endpoint.
    pub validation_url: String,
    /// Instance label sent with remote validation. Defaults to the hostname.
    pub instance_name: Option<String>,
    /// Request timeout for remote validation, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            trial_limit: TRIAL_LIMIT,
            key_prefix: KEY_PREFIX.to_string(),
            storage_key: STORAGE_KEY.to_string(),
            validation_url: DEFAULT_VALIDATION_URL.to_string(),
            instance_name: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl LicenseConfig {
    /// Returns the configured instance name, falling back to the hostname.
    #[must_use]
    pub fn instance_name(&self) -> String {
        self.instance_name.clone().unwrap_or_else(get_hostname)
    }
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
