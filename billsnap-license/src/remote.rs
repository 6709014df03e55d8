//! Online key validation against a remote licensing endpoint.
//!
//! The endpoint follows the Lemon Squeezy license API:
//! `POST {license_key, instance_name}` answered with
//! `{valid, meta: {...}, license_key: {expires_at}}`.

use crate::config::LicenseConfig;
use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Request body for key validation.
#[derive(Serialize, Debug)]
pub(crate) struct ValidateRequest<'a> {
    pub license_key: &'a str,
    pub instance_name: &'a str,
}

/// Customer metadata attached to a validation response.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ValidateMeta {
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
}

/// Key details attached to a validation response.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ValidateKeyData {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response from the validation endpoint.
#[derive(Deserialize, Debug)]
pub(crate) struct ValidateResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub meta: Option<ValidateMeta>,
    #[serde(default)]
    pub license_key: Option<ValidateKeyData>,
}

/// A key the remote endpoint accepted, with what it reported about it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteValidation {
    /// Customer email, if reported.
    pub customer_email: Option<String>,
    /// Customer name, if reported.
    pub customer_name: Option<String>,
    /// Product name, if reported.
    pub product_name: Option<String>,
    /// `None` means the license does not expire.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ValidateResponse> for RemoteValidation {
    fn from(response: ValidateResponse) -> Self {
        let meta = response.meta.unwrap_or_default();
        Self {
            customer_email: meta.customer_email,
            customer_name: meta.customer_name,
            product_name: meta.product_name,
            expires_at: response.license_key.and_then(|k| k.expires_at),
        }
    }
}

/// HTTP client for the remote validation endpoint.
#[derive(Debug, Clone)]
pub struct RemoteValidator {
    client: reqwest::Client,
    url: String,
    instance_name: String,
}

impl RemoteValidator {
    /// Builds a validator from the endpoint, instance name and timeout in
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &LicenseConfig) -> LicenseResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LicenseError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.validation_url.clone(),
            instance_name: config.instance_name(),
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the instance name sent with each request.
    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Asks the endpoint whether `key` is valid.
    ///
    /// The body is parsed regardless of HTTP status, since the endpoint
    /// answers rejected keys with a JSON error body.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidKey`] if the endpoint answers `valid: false`
    /// - [`LicenseError::Network`] if the request fails or the body is not
    ///   a validation response
    pub async fn validate(&self, key: &str) -> LicenseResult<RemoteValidation> {
        let request = ValidateRequest {
            license_key: key,
            instance_name: &self.instance_name,
        };

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        let status = response.status();
        let result: ValidateResponse = response
            .json()
            .await
            .map_err(|e| LicenseError::Network(format!("failed to parse response: {e}")))?;

        debug!(status = %status, valid = result.valid, "Validation response received");

        if !result.valid {
            if let Some(ref error) = result.error {
                warn!(status = %status, "Key rejected by validation server: {}", error);
            }
            return Err(LicenseError::InvalidKey);
        }

        Ok(result.into())
    }
}
