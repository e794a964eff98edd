//! License validation against the configured application id.

use crate::codec::{decode_license, license_signature};
use crate::types::{LicenseRecord, LicenseVerdict};
use async_trait::async_trait;
use ruhi_core::ports::{Clock, Validator};
use ruhi_core::{ProtectionConfig, RUNTIME_CONSTANTS, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix the embedded signature must contain when no license is configured.
const EMBEDDED_EXPECTED: &str = "RuhiAipplc";

/// Validates the configured license.
pub struct LicenseValidator {
    config: Arc<ProtectionConfig>,
    clock: Arc<dyn Clock>,
}

impl LicenseValidator {
    pub fn new(config: Arc<ProtectionConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Inspect the configured license.
    ///
    /// Returns [`ruhi_core::Error::InvalidLicenseFormat`] when the configured
    /// string cannot be decoded.
    pub fn inspect(&self) -> Result<LicenseVerdict> {
        if !self.config.enable_license_check {
            return Ok(LicenseVerdict::Disabled);
        }

        if self.config.license_key.is_empty() {
            let valid = embedded_license_valid();
            debug!(valid, "No license configured, checked embedded signature");
            return Ok(LicenseVerdict::Embedded { valid });
        }

        let record = decode_license(&self.config.license_key)?;
        Ok(self.verify(record))
    }

    /// Check expiry and signature of a decoded record.
    pub fn verify(&self, record: LicenseRecord) -> LicenseVerdict {
        let now = self.clock.now_millis();
        if record.is_expired(now) {
            warn!(expires = record.expires, now, "License expired");
            return LicenseVerdict::Expired(record);
        }

        let expected = license_signature(
            &record.key,
            record.issued,
            record.expires,
            &self.config.app_id,
        );
        if record.signature != expected {
            warn!(key = %record.key, "Invalid license signature");
            return LicenseVerdict::SignatureMismatch(record);
        }

        info!(key = %record.key, expires = record.expires, "License validated");
        LicenseVerdict::Valid(record)
    }
}

#[async_trait]
impl Validator for LicenseValidator {
    fn name(&self) -> &'static str {
        "license"
    }

    async fn validate(&self) -> bool {
        match self.inspect() {
            Ok(verdict) => verdict.is_valid(),
            Err(e) => {
                warn!(error = %e, "License validation failed");
                false
            }
        }
    }
}

/// Fallback used when no license string is configured.
fn embedded_license_valid() -> bool {
    let Ok(bytes) = hex::decode(RUNTIME_CONSTANTS.app_signature) else {
        return false;
    };
    let embedded = String::from_utf8_lossy(&bytes);
    embedded.contains(&EMBEDDED_EXPECTED[..4])
}
