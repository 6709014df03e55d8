//! Persisted license state and its read-only projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The license type stored in the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Counting trial invoices toward the limit.
    Trial,
    /// A key has been activated.
    Licensed,
    /// No trial and no key; the gate is closed.
    Unlicensed,
}

impl LicenseType {
    /// The type a fresh record starts with for the given trial limit.
    #[must_use]
    pub fn initial(trial_limit: u32) -> Self {
        if trial_limit > 0 {
            Self::Trial
        } else {
            Self::Unlicensed
        }
    }
}

/// The license record, persisted as a single JSON object.
///
/// Field names match the stored JSON (`type`, `invoicesCreated`,
/// `activatedAt`, ...). Customer metadata and `validUntil` are only set by
/// online activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseState {
    /// Current license type.
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    /// Invoices created while unlicensed.
    #[serde(default)]
    pub invoices_created: u32,
    /// The activated key.
    #[serde(default)]
    pub key: Option<String>,
    /// When the key was activated.
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
    /// Customer email reported by the validation server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Customer name reported by the validation server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Product name reported by the validation server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// License expiry reported by the validation server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

impl LicenseState {
    /// Returns the first-run state for the given trial limit.
    #[must_use]
    pub fn initial(trial_limit: u32) -> Self {
        Self {
            license_type: LicenseType::initial(trial_limit),
            invoices_created: 0,
            key: None,
            activated_at: None,
            customer_email: None,
            customer_name: None,
            product_name: None,
            valid_until: None,
        }
    }

    /// Returns true if the record is licensed and unexpired at `now`.
    ///
    /// Expiry is evaluated here on every call; an expired record keeps its
    /// persisted `licensed` type.
    #[must_use]
    pub fn is_licensed_at(&self, now: DateTime<Utc>) -> bool {
        self.license_type == LicenseType::Licensed
            && self.key.as_deref().is_some_and(|k| !k.is_empty())
            && self.valid_until.is_none_or(|until| now < until)
    }

    /// Returns true if the stored expiry has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now >= until)
    }

    /// Invoices left in the trial, or `None` when licensed (unlimited).
    #[must_use]
    pub fn remaining_trial_invoices_at(&self, trial_limit: u32, now: DateTime<Utc>) -> Option<u32> {
        if self.is_licensed_at(now) {
            None
        } else {
            Some(trial_limit.saturating_sub(self.invoices_created))
        }
    }
}

/// Summary of the gate for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatus {
    /// Persisted license type.
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    /// Whether the license is currently in effect.
    pub is_licensed: bool,
    /// Whether another invoice may be created.
    pub can_create: bool,
    /// Invoices left in the trial; `None` means unlimited.
    pub remaining: Option<u32>,
    /// Invoices created while unlicensed.
    pub invoices_created: u32,
    /// Configured trial limit.
    pub trial_limit: u32,
}

/// Details of the activated license for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    /// Persisted license type.
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    /// Whether the license is currently in effect.
    pub is_licensed: bool,
    /// The activated key.
    pub key: Option<String>,
    /// When the key was activated.
    pub activated_at: Option<DateTime<Utc>>,
    /// Customer email reported by the validation server.
    pub customer_email: Option<String>,
    /// Customer name reported by the validation server.
    pub customer_name: Option<String>,
    /// Product name reported by the validation server.
    pub product_name: Option<String>,
    /// License expiry reported by the validation server.
    pub valid_until: Option<DateTime<Utc>>,
}

impl LicenseInfo {
    /// Projects `state` as seen at `now`.
    #[must_use]
    pub fn from_state_at(state: &LicenseState, now: DateTime<Utc>) -> Self {
        Self {
            license_type: state.license_type,
            is_licensed: state.is_licensed_at(now),
            key: state.key.clone(),
            activated_at: state.activated_at,
            customer_email: state.customer_email.clone(),
            customer_name: state.customer_name.clone(),
            product_name: state.product_name.clone(),
            valid_until: state.valid_until,
        }
    }
}
