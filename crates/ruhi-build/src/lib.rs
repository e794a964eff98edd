//! Operator tooling for Ruhi.
//!
//! - [`BuildProtector`]: integrity hash and generated build constants
//! - [`ProtectionSetup`]: first-time provisioning of `.env.local`, the
//!   license and `.gitignore`
//! - [`ProtectionVerifier`]: installation checks

pub mod protector;
pub mod setup;
pub mod verify;

pub use protector::{BuildConstants, BuildProtector, CRITICAL_FILES};
pub use setup::{ProtectionSetup, SetupReport};
pub use verify::{ProtectionVerifier, VerificationReport};
