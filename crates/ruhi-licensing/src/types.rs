//! License types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed license record as distributed (inside base64).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// License key (the issuing application id).
    pub key: String,
    /// Issue time, epoch milliseconds.
    pub issued: i64,
    /// Expiry time, epoch milliseconds.
    pub expires: i64,
    /// Rolling hash of `key + issued + expires + app_id`.
    pub signature: String,
}

impl LicenseRecord {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.issued)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires)
    }

    /// Whether the record has expired at `now_millis`.
    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.expires < now_millis
    }
}

/// Outcome of inspecting the configured license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseVerdict {
    /// License checking is turned off.
    Disabled,
    /// No license configured; the embedded signature constant was checked.
    Embedded { valid: bool },
    Valid(LicenseRecord),
    Expired(LicenseRecord),
    SignatureMismatch(LicenseRecord),
}

impl LicenseVerdict {
    pub fn is_valid(&self) -> bool {
        match self {
            LicenseVerdict::Disabled | LicenseVerdict::Valid(_) => true,
            LicenseVerdict::Embedded { valid } => *valid,
            LicenseVerdict::Expired(_) | LicenseVerdict::SignatureMismatch(_) => false,
        }
    }

    /// The decoded record, when one was configured.
    pub fn record(&self) -> Option<&LicenseRecord> {
        match self {
            LicenseVerdict::Valid(r)
            | LicenseVerdict::Expired(r)
            | LicenseVerdict::SignatureMismatch(r) => Some(r),
            LicenseVerdict::Disabled | LicenseVerdict::Embedded { .. } => None,
        }
    }
}

impl std::fmt::Display for LicenseVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseVerdict::Disabled => write!(f, "license check disabled"),
            LicenseVerdict::Embedded { valid: true } => write!(f, "embedded license accepted"),
            LicenseVerdict::Embedded { valid: false } => write!(f, "embedded license rejected"),
            LicenseVerdict::Valid(r) => match r.expires_at() {
                Some(at) => write!(f, "valid until {}", at.to_rfc3339()),
                None => write!(f, "valid"),
            },
            LicenseVerdict::Expired(_) => write!(f, "expired"),
            LicenseVerdict::SignatureMismatch(_) => write!(f, "invalid signature"),
        }
    }
}
