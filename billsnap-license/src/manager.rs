//! The license manager: activation, trial gating and status queries.

use crate::config::LicenseConfig;
use crate::error::{LicenseError, LicenseResult};
use crate::key::{self, LicenseKey};
use crate::state::{LicenseInfo, LicenseState, LicenseStatus, LicenseType};
use crate::store::LicenseStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[cfg(feature = "online")]
use crate::remote::RemoteValidator;

/// Message reported after a successful activation.
const ACTIVATED_MESSAGE: &str = "License activated successfully!";

/// Outcome of an activation attempt, shaped for the UI layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActivationResult {
    /// Whether the key was activated.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Machine-readable failure code, `None` on success.
    pub error_code: Option<String>,
}

impl ActivationResult {
    fn activated() -> Self {
        Self {
            success: true,
            message: ACTIVATED_MESSAGE.to_string(),
            error_code: None,
        }
    }

    fn failed(error: &LicenseError) -> Self {
        let code = match error {
            LicenseError::InvalidKeyFormat(_) => "INVALID_FORMAT",
            LicenseError::InvalidKey => "INVALID_KEY",
            LicenseError::Network(_) => "NETWORK_ERROR",
            LicenseError::TrialExhausted { .. } => "TRIAL_EXHAUSTED",
            LicenseError::Storage(_) | LicenseError::Serialization(_) => "STORAGE_ERROR",
        };
        Self {
            success: false,
            message: error.user_message(),
            error_code: Some(code.to_string()),
        }
    }
}

impl From<LicenseResult<()>> for ActivationResult {
    fn from(result: LicenseResult<()>) -> Self {
        match result {
            Ok(()) => Self::activated(),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Owns the license record and gates invoice creation.
///
/// Build one at startup and pass it by reference to whatever renders the
/// gate. Every mutation is written through `store` before it becomes visible;
/// a failed write leaves the in-memory state as it was.
#[derive(Debug)]
pub struct LicenseManager<S> {
    config: LicenseConfig,
    store: S,
    state: LicenseState,
}

impl<S: LicenseStore> LicenseManager<S> {
    /// Loads the record from `store`, creating and saving the first-run
    /// state if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be read or parsed, or the
    /// first-run state cannot be saved.
    pub fn new(config: LicenseConfig, store: S) -> LicenseResult<Self> {
        let state = match store.load()? {
            Some(state) => state,
            None => {
                let state = LicenseState::initial(config.trial_limit);
                store.save(&state)?;
                info!(license_type = ?state.license_type, "License state initialized");
                state
            }
        };

        Ok(Self {
            config,
            store,
            state,
        })
    }

    /// The configuration this manager was built with.
    #[must_use]
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// The current license record.
    #[must_use]
    pub fn state(&self) -> &LicenseState {
        &self.state
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Offline format check against the configured prefix.
    #[must_use]
    pub fn validate_key(&self, key: &str) -> bool {
        LicenseKey::parse(key, &self.config.key_prefix).is_ok()
    }

    /// Generates a valid key with the configured prefix.
    #[must_use]
    pub fn generate_sample_key(&self) -> String {
        key::generate_sample_key(&self.config.key_prefix)
    }

    /// Activates an offline-format key.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidKeyFormat`] if the key fails validation
    /// - a storage error if the licensed state cannot be saved
    pub fn activate(&mut self, key: &str) -> LicenseResult<()> {
        let key = match LicenseKey::parse(key.trim(), &self.config.key_prefix) {
            Ok(key) => key,
            Err(e) => {
                warn!("License activation rejected: {}", e);
                return Err(e);
            }
        };

        let next = LicenseState {
            license_type: LicenseType::Licensed,
            invoices_created: self.state.invoices_created,
            key: Some(key.into_string()),
            activated_at: Some(Utc::now()),
            customer_email: None,
            customer_name: None,
            product_name: None,
            valid_until: None,
        };
        self.commit(next)?;

        info!("License activated");
        Ok(())
    }

    /// Activates an offline-format key and reports the outcome for display.
    pub fn activate_license(&mut self, key: &str) -> ActivationResult {
        self.activate(key).into()
    }

    /// Activates a key by asking the remote validation endpoint.
    ///
    /// No local format check is applied; the endpoint owns the key format.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidKeyFormat`] if the key is blank
    /// - [`LicenseError::InvalidKey`] if the endpoint rejects the key
    /// - [`LicenseError::Network`] if the endpoint cannot be reached or
    ///   answers with something unparseable
    /// - a storage error if the licensed state cannot be saved
    #[cfg(feature = "online")]
    pub async fn activate_online(
        &mut self,
        validator: &RemoteValidator,
        key: &str,
    ) -> LicenseResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LicenseError::InvalidKeyFormat(
                "license key is empty".to_string(),
            ));
        }

        let validation = match validator.validate(key).await {
            Ok(validation) => validation,
            Err(e) => {
                warn!(url = %validator.url(), "Online activation failed: {}", e);
                return Err(e);
            }
        };

        let next = LicenseState {
            license_type: LicenseType::Licensed,
            invoices_created: self.state.invoices_created,
            key: Some(key.to_string()),
            activated_at: Some(Utc::now()),
            customer_email: validation.customer_email,
            customer_name: validation.customer_name,
            product_name: validation.product_name,
            valid_until: validation.expires_at,
        };
        self.commit(next)?;

        info!(valid_until = ?self.state.valid_until, "License activated online");
        Ok(())
    }

    /// Online activation, reporting the outcome for display.
    #[cfg(feature = "online")]
    pub async fn activate_license_online(
        &mut self,
        validator: &RemoteValidator,
        key: &str,
    ) -> ActivationResult {
        self.activate_online(validator, key).await.into()
    }

    /// Returns true if a key is active and unexpired.
    #[must_use]
    pub fn is_licensed(&self) -> bool {
        self.is_licensed_at(Utc::now())
    }

    /// Like [`Self::is_licensed`], evaluated at `now`.
    #[must_use]
    pub fn is_licensed_at(&self, now: DateTime<Utc>) -> bool {
        self.state.is_licensed_at(now)
    }

    /// Returns true if another invoice may be created.
    #[must_use]
    pub fn can_create_invoice(&self) -> bool {
        self.is_licensed() || self.state.invoices_created < self.config.trial_limit
    }

    /// Counts one invoice against the trial. No-op once licensed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the new count cannot be saved.
    pub fn increment_invoice_count(&mut self) -> LicenseResult<()> {
        if self.is_licensed() {
            return Ok(());
        }

        let next = LicenseState {
            invoices_created: self.state.invoices_created.saturating_add(1),
            ..self.state.clone()
        };
        self.commit(next)?;

        debug!(
            invoices_created = self.state.invoices_created,
            trial_limit = self.config.trial_limit,
            "Trial invoice counted"
        );
        Ok(())
    }

    /// Checks the gate and counts one invoice if it is open.
    ///
    /// Returns the invoices left afterwards (`None` when licensed).
    ///
    /// # Errors
    ///
    /// - [`LicenseError::TrialExhausted`] if the gate is closed
    /// - a storage error if the new count cannot be saved
    pub fn record_invoice(&mut self) -> LicenseResult<Option<u32>> {
        if !self.can_create_invoice() {
            return Err(LicenseError::TrialExhausted {
                limit: self.config.trial_limit,
            });
        }
        self.increment_invoice_count()?;
        Ok(self.remaining_trial_invoices())
    }

    /// Invoices left in the trial, or `None` when licensed (unlimited).
    #[must_use]
    pub fn remaining_trial_invoices(&self) -> Option<u32> {
        self.state
            .remaining_trial_invoices_at(self.config.trial_limit, Utc::now())
    }

    /// Summary of the gate.
    #[must_use]
    pub fn status(&self) -> LicenseStatus {
        LicenseStatus {
            license_type: self.state.license_type,
            is_licensed: self.is_licensed(),
            can_create: self.can_create_invoice(),
            remaining: self.remaining_trial_invoices(),
            invoices_created: self.state.invoices_created,
            trial_limit: self.config.trial_limit,
        }
    }

    /// Details of the activated license.
    #[must_use]
    pub fn license_info(&self) -> LicenseInfo {
        LicenseInfo::from_state_at(&self.state, Utc::now())
    }

    /// Drops the activated key and returns to the first-run license type.
    ///
    /// The invoice counter is kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the new state cannot be saved.
    pub fn deactivate(&mut self) -> LicenseResult<()> {
        let next = LicenseState {
            invoices_created: self.state.invoices_created,
            ..LicenseState::initial(self.config.trial_limit)
        };
        self.commit(next)?;

        info!("License deactivated");
        Ok(())
    }

    fn commit(&mut self, next: LicenseState) -> LicenseResult<()> {
        self.store.save(&next)?;
        self.state = next;
        Ok(())
    }
}
