//! Runtime protection for Ruhi.
//!
//! Validators observe the host through the ports in [`ruhi_core::ports`] and
//! report verdicts; every failure is soft. The [`ProtectionManager`]
//! combines them, the [`IntegrityChecker`] looks for tampered runtime
//! functions and the [`Guard`] ties everything to a render decision.

pub mod anti_tamper;
pub mod environment;
pub mod fingerprint;
pub mod guard;
pub mod host;
pub mod integrity;
pub mod manager;
pub mod policy;

pub use anti_tamper::AntiTamper;
pub use environment::{EnvironmentValidator, EnvironmentVerdict};
pub use fingerprint::{FingerprintComponents, FingerprintValidator, FingerprintVerdict, similarity};
pub use guard::{Guard, GuardBuilder, MountOutcome};
pub use host::{BrowserSnapshot, NativeHost, NoopHooks};
pub use integrity::IntegrityChecker;
pub use manager::ProtectionManager;
pub use policy::{AdvisoryPolicy, Decision, MountReport, Policy, StrictPolicy};
