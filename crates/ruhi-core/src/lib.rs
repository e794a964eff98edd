//! Ruhi Core
//!
//! Shared vocabulary for the Ruhi protection layer: error handling,
//! configuration, string hashing, the display obfuscator and the capability
//! ports through which validators observe their host.
//! This crate has minimal dependencies and is used by all other crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod hash;
pub mod obfuscate;
pub mod ports;
pub mod store;

pub use clock::{FixedClock, SystemClock};
pub use config::{ExecutionMode, ProtectionConfig, RuntimeConstants, RUNTIME_CONSTANTS};
pub use error::{Error, Result};
pub use hash::{environment_hash, rolling_hash, sha256_hex};
pub use obfuscate::{deobfuscate, obfuscate};
pub use store::{FileStore, MemoryStore};
