//! License key parsing and checksum validation.
//!
//! License keys use the format: `PREFIX-AAAA-BBBB-CCCC-SSSS`
//!
//! - `PREFIX` is a fixed literal (`BILLSNAP` unless configured otherwise)
//! - `AAAA`, `BBBB`, `CCCC` are four ASCII alphanumerics each
//! - `SSSS` is [`checksum`] over `AAAABBBBCCCC`
//!
//! Matching is case-insensitive; parsed keys are normalized to uppercase.

use crate::error::{LicenseError, LicenseResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of dash-separated segments in a key.
const SEGMENT_COUNT: usize = 5;

/// Length of every segment after the prefix.
const SEGMENT_LEN: usize = 4;

/// Odd multiplier applied to the code-unit sum.
const CHECKSUM_MULTIPLIER: u64 = 7919;

const CHECKSUM_MODULUS: u64 = 65536;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Computes the 4-character checksum segment for `body`.
///
/// Sums the UTF-16 code units of `body`, multiplies by 7919, reduces modulo
/// 65536 and renders the result in uppercase base 36, left-padded with `'0'`
/// and truncated to four characters.
#[must_use]
pub fn checksum(body: &str) -> String {
    let sum: u64 = body.encode_utf16().map(u64::from).sum();
    let value = (sum.wrapping_mul(CHECKSUM_MULTIPLIER)) % CHECKSUM_MODULUS;

    let mut rendered = format!("{:0>width$}", to_base36(value), width = SEGMENT_LEN);
    rendered.truncate(SEGMENT_LEN);
    rendered
}

fn to_base36(mut value: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    // Only ASCII digits were pushed.
    String::from_utf8(digits).unwrap_or_default()
}

/// Returns true if `key` is a well-formed key with the default prefix.
#[must_use]
pub fn validate_key(key: &str) -> bool {
    LicenseKey::parse(key, crate::config::KEY_PREFIX).is_ok()
}

/// Generates a random key with the given prefix that passes validation.
#[must_use]
pub fn generate_sample_key(prefix: &str) -> String {
    LicenseKey::generate(prefix).to_string()
}

/// A license key that passed offline format validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LicenseKey {
    /// The normalized (uppercase) key string.
    raw: String,
}

impl LicenseKey {
    /// Parses and validates a key string against `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKeyFormat`] naming the first rule the
    /// key breaks.
    pub fn parse(key: &str, prefix: &str) -> LicenseResult<Self> {
        if key.is_empty() {
            return Err(LicenseError::InvalidKeyFormat(
                "license key is empty".to_string(),
            ));
        }

        let normalized = key.to_ascii_uppercase();
        let parts: Vec<&str> = normalized.split('-').collect();
        if parts.len() != SEGMENT_COUNT {
            return Err(LicenseError::InvalidKeyFormat(format!(
                "expected {SEGMENT_COUNT} dash-separated segments, found {}",
                parts.len()
            )));
        }

        if parts[0] != prefix.to_ascii_uppercase() {
            return Err(LicenseError::InvalidKeyFormat(format!(
                "key must start with {prefix}"
            )));
        }

        for (index, part) in parts.iter().enumerate().skip(1) {
            if !is_segment(part) {
                return Err(LicenseError::InvalidKeyFormat(format!(
                    "segment {index} must be {SEGMENT_LEN} alphanumeric characters"
                )));
            }
        }

        let expected = checksum(&parts[1..4].concat());
        if parts[4] != expected {
            return Err(LicenseError::InvalidKeyFormat(
                "checksum mismatch".to_string(),
            ));
        }

        Ok(Self { raw: normalized })
    }

    /// Generates a random, valid key with the given prefix.
    #[must_use]
    pub fn generate(prefix: &str) -> Self {
        let mut rng = rand::thread_rng();
        let mut segment = || -> String {
            (0..SEGMENT_LEN)
                .map(|_| BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())] as char)
                .collect()
        };

        let body = [segment(), segment(), segment()];
        let check = checksum(&body.concat());

        Self {
            raw: format!(
                "{}-{}-{}-{}-{}",
                prefix.to_ascii_uppercase(),
                body[0],
                body[1],
                body[2],
                check
            ),
        }
    }

    /// Returns the normalized key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Consumes the key, returning the normalized string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.raw
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_segment(part: &str) -> bool {
    part.len() == SEGMENT_LEN && part.bytes().all(|b| b.is_ascii_alphanumeric())
}
