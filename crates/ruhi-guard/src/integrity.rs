//! Runtime integrity checks.
//!
//! Four independent checks, each fail-open: a check whose host capability
//! is unavailable counts as passed and records nothing. The timestamp check
//! always records; an unreadable build timestamp fails it.

use ruhi_core::ports::{Clock, HostEnvironment};
use ruhi_core::{ProtectionConfig, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

pub const CODE_INTEGRITY: &str = "code_integrity";
pub const CONSOLE_INTEGRITY: &str = "console_integrity";
pub const GLOBAL_SCOPE: &str = "global_scope";
pub const TIMESTAMP_VALID: &str = "timestamp_valid";

/// Globals injected by browser developer extensions.
pub const SUSPICIOUS_GLOBALS: [&str; 2] = [
    "__REACT_DEVTOOLS_GLOBAL_HOOK__",
    "__REDUX_DEVTOOLS_EXTENSION__",
];

const NATIVE_MARKER: &str = "[native code]";

/// Runs the integrity checks and keeps the results of the latest pass.
pub struct IntegrityChecker {
    config: Arc<ProtectionConfig>,
    host: Arc<dyn HostEnvironment>,
    clock: Arc<dyn Clock>,
    checks: Mutex<Vec<(&'static str, bool)>>,
}

impl IntegrityChecker {
    pub fn new(
        config: Arc<ProtectionConfig>,
        host: Arc<dyn HostEnvironment>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            host,
            clock,
            checks: Mutex::new(Vec::new()),
        }
    }

    /// Run every check; `true` when all pass.
    pub async fn perform_checks(&self) -> bool {
        self.lock().clear();

        let results = [
            self.run(CODE_INTEGRITY, self.check_code_integrity()),
            self.run(CONSOLE_INTEGRITY, self.check_console_integrity()),
            self.run(GLOBAL_SCOPE, self.check_global_scope()),
            self.run(TIMESTAMP_VALID, self.check_timestamp_validity()),
        ];

        let passed = results.iter().all(|r| *r);
        if !passed {
            warn!(report = %self.generate_integrity_report(), "Integrity checks failed");
        }
        passed
    }

    /// Results of the latest pass, in check order.
    pub fn check_results(&self) -> Vec<(&'static str, bool)> {
        self.lock().clone()
    }

    /// One `name: ✓` or `name: ✗` line per recorded check.
    pub fn generate_integrity_report(&self) -> String {
        self.lock()
            .iter()
            .map(|(name, passed)| format!("{}: {}", name, if *passed { "✓" } else { "✗" }))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Record an outcome. `Ok(None)` means the check did not apply.
    fn run(&self, name: &'static str, outcome: Result<Option<bool>>) -> bool {
        match outcome {
            Ok(Some(passed)) => {
                self.lock().push((name, passed));
                passed
            }
            Ok(None) => true,
            Err(e) => {
                debug!(check = name, error = %e, "Integrity check skipped");
                true
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(&'static str, bool)>> {
        self.checks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_code_integrity(&self) -> Result<Option<bool>> {
        let source = self.host.function_source("fetch")?;
        Ok(Some(source.contains(NATIVE_MARKER)))
    }

    fn check_console_integrity(&self) -> Result<Option<bool>> {
        if self.host.display().is_none() {
            return Ok(None);
        }
        let source = self.host.function_source("console.log")?;
        let modified = !source.contains(NATIVE_MARKER) && !source.contains("function log()");
        Ok(Some(!modified))
    }

    fn check_global_scope(&self) -> Result<Option<bool>> {
        let Some(display) = self.host.display() else {
            return Ok(None);
        };

        let mut suspicious = false;
        if self.config.mode.is_production() {
            for name in SUSPICIOUS_GLOBALS {
                if display.has_global(name)? {
                    warn!(global = name, "Suspicious global detected");
                    suspicious = true;
                }
            }
        }
        Ok(Some(!suspicious))
    }

    fn check_timestamp_validity(&self) -> Result<Option<bool>> {
        // no build timestamp means the build is happening now
        if !self.config.has_build_timestamp() {
            debug!("Build timestamp missing, using current time");
            return Ok(Some(true));
        }
        match self.config.build_timestamp_millis() {
            Some(build_timestamp) => Ok(Some(build_timestamp <= self.clock.now_millis())),
            None => {
                warn!(
                    build_timestamp = self.config.build_timestamp.as_deref().unwrap_or_default(),
                    "Build timestamp is not numeric"
                );
                Ok(Some(false))
            }
        }
    }
}
