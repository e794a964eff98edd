//! Installation checks for a protected project.
//!
//! Verification never fails: every finding lands in the report as a check,
//! a warning or an error.

use crate::setup::{APP_ID_KEY, ENV_LOCAL_FILE};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Protection sources the application must ship.
pub const REQUIRED_FILES: [&str; 9] = [
    "protection/index.ts",
    "protection/config.ts",
    "protection/provider.tsx",
    "protection/validators/environment.ts",
    "protection/validators/license.ts",
    "protection/validators/fingerprint.ts",
    "protection/utils/obfuscator.ts",
    "protection/utils/integrity.ts",
    "protection/utils/anti-tampering.ts",
];

/// Keys `.env.local` should define.
pub const REQUIRED_ENV_KEYS: [&str; 3] = [
    APP_ID_KEY,
    "NEXT_PUBLIC_FIREBASE_API_KEY",
    "NEXT_PUBLIC_FIREBASE_PROJECT_ID",
];

/// Command the `prebuild` script must run.
pub const PREBUILD_COMMAND: &str = "ruhi protect";

const PROVIDER_COMPONENT: &str = "ProtectionProvider";
const LAYOUT_FILE: &str = "src/app/layout.tsx";
const MIDDLEWARE_FILE: &str = "src/middleware.ts";
const NEXT_CONFIG_FILE: &str = "next.config.ts";

/// Findings of one verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    fn check(&mut self, message: impl Into<String>) {
        self.checks.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

pub struct ProtectionVerifier {
    root: PathBuf,
}

impl ProtectionVerifier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn verify(&self) -> VerificationReport {
        let mut report = VerificationReport::default();

        self.check_files(&mut report);
        self.check_environment(&mut report);
        self.check_package_scripts(&mut report);
        self.check_integration(&mut report);
        self.check_build_config(&mut report);

        debug!(
            checks = report.checks.len(),
            warnings = report.warnings.len(),
            errors = report.errors.len(),
            "Verification finished"
        );
        report
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn check_files(&self, report: &mut VerificationReport) {
        for file in REQUIRED_FILES {
            if self.path(file).is_file() {
                report.check(file);
            } else {
                report.error(format!("Missing: {}", file));
            }
        }
    }

    fn check_environment(&self, report: &mut VerificationReport) {
        let Some(content) = read(&self.path(ENV_LOCAL_FILE)) else {
            report.error(format!("{} not found", ENV_LOCAL_FILE));
            return;
        };

        for key in REQUIRED_ENV_KEYS {
            if content.contains(key) {
                report.check(format!("{} configured", key));
            } else {
                report.warn(format!("{} not configured", key));
            }
        }
    }

    fn check_package_scripts(&self, report: &mut VerificationReport) {
        let Some(content) = read(&self.path("package.json")) else {
            return;
        };

        let prebuild = serde_json::from_str::<serde_json::Value>(&content)
            .ok()
            .and_then(|package| {
                package
                    .get("scripts")?
                    .get("prebuild")?
                    .as_str()
                    .map(String::from)
            });

        match prebuild {
            Some(script) if script.contains(PREBUILD_COMMAND) => {
                report.check("prebuild script configured")
            }
            _ => report.warn("prebuild script not configured"),
        }
    }

    fn check_integration(&self, report: &mut VerificationReport) {
        if let Some(layout) = read(&self.path(LAYOUT_FILE)) {
            if layout.contains(PROVIDER_COMPONENT) {
                report.check(format!("{} integrated in layout", PROVIDER_COMPONENT));
            } else {
                report.error(format!("{} not found in layout", PROVIDER_COMPONENT));
            }
        }

        if self.path(MIDDLEWARE_FILE).is_file() {
            report.check("Protection middleware exists");
        } else {
            report.warn("Protection middleware not found");
        }
    }

    fn check_build_config(&self, report: &mut VerificationReport) {
        let Some(config) = read(&self.path(NEXT_CONFIG_FILE)) else {
            return;
        };
        if config.contains("webpack") {
            report.check("Webpack configuration includes protection");
        } else {
            report.warn("Webpack protection not configured");
        }
    }
}

fn read(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let report = ProtectionVerifier::new(dir.path()).verify();

        // every required file plus the missing .env.local
        assert_eq!(report.errors.len(), REQUIRED_FILES.len() + 1);
        assert_eq!(report.warnings, vec!["Protection middleware not found"]);
        assert!(report.checks.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_prebuild_without_protector_warns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"scripts":{"prebuild":"next lint"}}"#,
        )
        .unwrap();

        let report = ProtectionVerifier::new(dir.path()).verify();
        assert!(report.warnings.contains(&"prebuild script not configured".to_string()));
    }
}
