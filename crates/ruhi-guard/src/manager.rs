//! Protection manager.
//!
//! Runs the environment, fingerprint and license validators in that order
//! and caches the combined result until [`ProtectionManager::reset`].

use crate::environment::EnvironmentValidator;
use crate::fingerprint::FingerprintValidator;
use ruhi_core::ports::{Clock, HostEnvironment, KeyValueStore, Validator};
use ruhi_core::{ProtectionConfig, obfuscate, rolling_hash};
use ruhi_licensing::LicenseValidator;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Aggregates the validators and memoizes their combined outcome.
pub struct ProtectionManager {
    validators: [Arc<dyn Validator>; 3],
    checksum: String,
    validated: AtomicBool,
    result: Mutex<Option<bool>>,
}

impl ProtectionManager {
    /// Build a manager from already-constructed validators.
    pub fn new(
        config: &ProtectionConfig,
        environment: Arc<dyn Validator>,
        fingerprint: Arc<dyn Validator>,
        license: Arc<dyn Validator>,
    ) -> Self {
        Self {
            validators: [environment, fingerprint, license],
            checksum: obfuscate(&rolling_hash(&config.app_id)),
            validated: AtomicBool::new(false),
            result: Mutex::new(None),
        }
    }

    /// Build a manager with the standard validators over one host.
    pub fn from_host(
        config: Arc<ProtectionConfig>,
        host: Arc<dyn HostEnvironment>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let environment = EnvironmentValidator::new(Arc::clone(&config), Arc::clone(&host));
        let fingerprint = FingerprintValidator::new(Arc::clone(&config), host, store);
        let license = LicenseValidator::new(Arc::clone(&config), clock);

        Self::new(
            &config,
            Arc::new(environment),
            Arc::new(fingerprint),
            Arc::new(license),
        )
    }

    /// Run every validator once and cache the conjunction.
    ///
    /// Every validator runs even after one fails. Concurrent first callers
    /// wait for the same computation.
    pub async fn validate(&self) -> bool {
        let mut cached = self.result.lock().await;
        if let Some(result) = *cached {
            debug!(result, "Returning cached validation result");
            return result;
        }

        let mut result = true;
        for validator in &self.validators {
            let passed = validator.validate().await;
            debug!(validator = validator.name(), passed, "Validator finished");
            result &= passed;
        }

        if result {
            info!("Application validated");
        } else {
            warn!("Application validation incomplete");
        }

        self.validated.store(result, Ordering::SeqCst);
        *cached = Some(result);
        result
    }

    /// Whether a cached validation succeeded.
    pub fn is_validated(&self) -> bool {
        self.validated.load(Ordering::SeqCst)
    }

    /// Obfuscated rolling hash of the application id.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Forget the cached result so the next [`validate`](Self::validate)
    /// runs the validators again.
    pub async fn reset(&self) {
        let mut cached = self.result.lock().await;
        *cached = None;
        self.validated.store(false, Ordering::SeqCst);
        debug!("Validation state reset");
    }
}
