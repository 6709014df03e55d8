//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Key does not match the local format (prefix, segments or checksum).
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Remote validation endpoint rejected the key.
    #[error("license key rejected by validation server")]
    InvalidKey,

    /// Transport or response parsing failure during remote validation.
    #[error("network error: {0}")]
    Network(String),

    /// Trial limit reached while unlicensed.
    #[error("trial limit of {limit} invoices reached")]
    TrialExhausted {
        /// The configured trial limit.
        limit: u32,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns a message suitable for showing to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidKeyFormat(_) => "Invalid license key format".to_string(),
            Self::InvalidKey => "Invalid license key".to_string(),
            Self::Network(_) => {
                "Could not reach the license server. Check your connection and try again."
                    .to_string()
            }
            Self::TrialExhausted { limit } => format!(
                "Your free trial of {limit} invoices has ended. Enter a license key to continue."
            ),
            Self::Storage(_) | Self::Serialization(_) => {
                "Could not save license data. Please try again.".to_string()
            }
        }
    }

    /// Returns true for failures caused by connectivity rather than the key.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
