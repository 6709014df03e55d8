//! License gating and trial tracking for BillSnap.
//!
//! This crate handles:
//! - Offline license key validation (prefix, segment shape, checksum)
//! - A trial counter that gates invoice creation until a key is activated
//! - Persisting license state through a small storage port
//! - Optional online activation against a remote validation endpoint
//!
//! # Design Principles
//!
//! - **Explicit instance**: one [`LicenseManager`] is built at startup and
//!   handed to the UI layer by reference
//! - **Storage behind a port**: the gating logic only sees [`LicenseStore`]
//! - **Non-fatal failures**: every activation failure leaves state untouched
//!   and may be retried
//!
//! # License Key Format
//!
//! Keys are formatted as: `BILLSNAP-XXXX-XXXX-XXXX-CCCC`
//! where `CCCC` is a checksum over the three middle segments. The checksum
//! is a format check, not a signature: anyone holding this crate can forge
//! a key.

mod config;
mod error;
mod key;
mod manager;
mod state;
mod store;

#[cfg(feature = "online")]
mod remote;

pub use config::{
    LicenseConfig, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_VALIDATION_URL, KEY_PREFIX, STORAGE_KEY,
    TRIAL_LIMIT,
};
pub use error::{LicenseError, LicenseResult};
pub use key::{checksum, generate_sample_key, validate_key, LicenseKey};
pub use manager::{ActivationResult, LicenseManager};
pub use state::{LicenseInfo, LicenseState, LicenseStatus, LicenseType};
pub use store::{FileStore, LicenseStore, MemoryStore};

#[cfg(feature = "online")]
pub use remote::{RemoteValidation, RemoteValidator};
