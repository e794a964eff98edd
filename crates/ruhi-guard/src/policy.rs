//! Render decisions.
//!
//! Validators only detect. A [`Policy`] looks at what they found and decides
//! whether the application renders.

use serde::Serialize;
use std::fmt;

/// Everything detection produced during one mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MountReport {
    pub validated: bool,
    pub integrity: bool,
    pub virtual_environment: bool,
    pub debugger_suspicions: u64,
}

impl MountReport {
    pub fn is_clean(&self) -> bool {
        self.validated && self.integrity && !self.virtual_environment && self.debugger_suspicions == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    /// Render, but something was off.
    Warn,
    Deny,
}

impl Decision {
    pub fn should_render(&self) -> bool {
        !matches!(self, Decision::Deny)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Warn => write!(f, "warn"),
            Decision::Deny => write!(f, "deny"),
        }
    }
}

pub trait Policy: Send + Sync {
    fn decide(&self, report: &MountReport) -> Decision;
}

/// Always renders; failures downgrade to [`Decision::Warn`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvisoryPolicy;

impl Policy for AdvisoryPolicy {
    fn decide(&self, report: &MountReport) -> Decision {
        if report.is_clean() {
            Decision::Allow
        } else {
            Decision::Warn
        }
    }
}

/// Denies when validation or integrity fails. Virtual environments and
/// debugger suspicions only warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

impl Policy for StrictPolicy {
    fn decide(&self, report: &MountReport) -> Decision {
        if !report.validated || !report.integrity {
            Decision::Deny
        } else if report.is_clean() {
            Decision::Allow
        } else {
            Decision::Warn
        }
    }
}
