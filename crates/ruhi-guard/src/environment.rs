//! Environment validation: allowed hostnames and required configuration.

use async_trait::async_trait;
use ruhi_core::ports::{DisplaySurface, HostEnvironment, Validator, WindowMetrics};
use ruhi_core::{ProtectionConfig, Result, environment_hash};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outer/inner window delta above which dev tools are assumed docked.
pub const DEVTOOLS_THRESHOLD_PX: u32 = 160;

/// Outcome of an environment inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentVerdict {
    /// No display surface; server execution always passes.
    Headless,
    Passed { devtools_suspected: bool },
    DomainRejected { hostname: String },
    MissingConfig { key: String },
    /// A capability failed while checking.
    Error(String),
}

impl EnvironmentVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            EnvironmentVerdict::Headless | EnvironmentVerdict::Passed { .. }
        )
    }
}

/// Checks the hostname allow-list, required configuration values and the
/// dev-tools window heuristic.
pub struct EnvironmentValidator {
    config: Arc<ProtectionConfig>,
    host: Arc<dyn HostEnvironment>,
}

impl EnvironmentValidator {
    pub fn new(config: Arc<ProtectionConfig>, host: Arc<dyn HostEnvironment>) -> Self {
        Self { config, host }
    }

    /// Run all environment checks. Capability errors fail the check.
    pub fn inspect(&self) -> EnvironmentVerdict {
        match self.try_inspect() {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(error = %e, "Environment validation error");
                EnvironmentVerdict::Error(e.to_string())
            }
        }
    }

    /// Hash of hostname, execution mode and application id.
    pub fn environment_hash(&self) -> String {
        let hostname = self.host.display().and_then(|d| d.hostname().ok());
        environment_hash(
            hostname.as_deref(),
            self.config.mode.as_str(),
            &self.config.app_id,
        )
    }

    fn try_inspect(&self) -> Result<EnvironmentVerdict> {
        let Some(display) = self.host.display() else {
            return Ok(EnvironmentVerdict::Headless);
        };

        if self.config.enable_domain_check {
            let hostname = display.hostname()?;
            let allowed = self
                .config
                .allowed_domains()
                .iter()
                .any(|domain| hostname.contains(domain));

            if !allowed {
                if self.config.mode.is_production() {
                    warn!(hostname = %hostname, "Domain validation failed");
                    return Ok(EnvironmentVerdict::DomainRejected { hostname });
                }
                debug!(hostname = %hostname, "Hostname not in allow-list (development)");
            }
        }

        if self.config.enable_env_check {
            for key in &self.config.required_env_vars {
                if !is_present(self.host.config_value(key).as_deref()) {
                    warn!(key = %key, "Missing required environment variable");
                    return Ok(EnvironmentVerdict::MissingConfig { key: key.clone() });
                }
            }
        }

        let devtools_suspected = self.config.anti_debug() && self.devtools_open(display)?;
        if devtools_suspected {
            warn!("Developer tools detected");
        }

        Ok(EnvironmentVerdict::Passed { devtools_suspected })
    }

    fn devtools_open(&self, display: &dyn DisplaySurface) -> Result<bool> {
        Ok(devtools_heuristic(display.window_metrics()?))
    }
}

#[async_trait]
impl Validator for EnvironmentValidator {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn validate(&self) -> bool {
        self.inspect().is_valid()
    }
}

/// Values the host reports as the string `undefined` count as missing.
fn is_present(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "undefined")
}

/// Docked dev tools shrink the inner window relative to the outer one.
pub fn devtools_heuristic(metrics: WindowMetrics) -> bool {
    let width_delta = metrics.outer_width.saturating_sub(metrics.inner_width);
    let height_delta = metrics.outer_height.saturating_sub(metrics.inner_height);
    width_delta > DEVTOOLS_THRESHOLD_PX || height_delta > DEVTOOLS_THRESHOLD_PX
}
