//! Self-issued license keys for Ruhi.
//!
//! A license is a JSON record, signed with the rolling hash over its fields
//! and the application id, and distributed as base64. The signature secret is
//! the application id, which ships with the client: this deters casual
//! copying and nothing more.

pub mod codec;
pub mod keygen;
pub mod types;
pub mod validator;

pub use codec::{decode_license, encode_license, license_signature};
pub use keygen::{LicenseIssuer, generate_license_key};
pub use types::{LicenseRecord, LicenseVerdict};
pub use validator::LicenseValidator;
