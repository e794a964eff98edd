//! License issuing.
//!
//! Operator-side only; the served application never issues licenses.

use crate::codec::{encode_license, license_signature};
use crate::types::LicenseRecord;
use chrono::{DateTime, Duration, Utc};
use ruhi_core::Result;
use ruhi_core::ports::Clock;
use std::sync::Arc;
use tracing::info;

/// Default validity when no expiration is given.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// Issues licenses bound to one application id.
pub struct LicenseIssuer {
    app_id: String,
    clock: Arc<dyn Clock>,
}

impl LicenseIssuer {
    pub fn new(app_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            app_id: app_id.into(),
            clock,
        }
    }

    /// Build and sign a record. `expiration` defaults to one year from now.
    pub fn issue(&self, expiration: Option<DateTime<Utc>>) -> LicenseRecord {
        let now = self.clock.now();
        let expires = expiration
            .unwrap_or_else(|| now + Duration::days(DEFAULT_VALIDITY_DAYS))
            .timestamp_millis();
        let issued = now.timestamp_millis();

        LicenseRecord {
            key: self.app_id.clone(),
            issued,
            expires,
            signature: license_signature(&self.app_id, issued, expires, &self.app_id),
        }
    }

    /// Issue a record and encode it for distribution.
    pub fn generate_license_key(&self, expiration: Option<DateTime<Utc>>) -> Result<String> {
        let record = self.issue(expiration);
        info!(
            key = %record.key,
            expires = record.expires,
            "Generated license key"
        );
        encode_license(&record)
    }
}

/// Issue an encoded license for `app_id` using the system clock.
pub fn generate_license_key(app_id: &str, expiration: Option<DateTime<Utc>>) -> Result<String> {
    LicenseIssuer::new(app_id, Arc::new(ruhi_core::SystemClock)).generate_license_key(expiration)
}
