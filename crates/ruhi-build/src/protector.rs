//! Build-time integrity hashing.
//!
//! Hashes the critical source files, then writes `.env.protection` and the
//! generated build-constants module the application imports at runtime.

use ruhi_core::hash::sha256_bytes_hex;
use ruhi_core::ports::Clock;
use ruhi_core::{Result, SystemClock};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Files whose content feeds the integrity hash, in hashing order.
pub const CRITICAL_FILES: [&str; 4] = [
    "src/app/layout.tsx",
    "src/app/page.tsx",
    "protection/index.ts",
    "protection/config.ts",
];

pub const PROTECTION_ENV_FILE: &str = ".env.protection";
pub const BUILD_CONSTANTS_FILE: &str = "protection/build-constants.ts";

/// Values produced by one protection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BuildConstants {
    pub timestamp: i64,
    pub hash: String,
    pub version: String,
    pub node_env: String,
}

impl BuildConstants {
    /// Short build identifier: the first eight hex characters of the hash.
    pub fn build_id(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }

    pub fn app_id(&self) -> String {
        format!("ruhi-{}", self.build_id())
    }

    pub fn env_file(&self) -> String {
        format!(
            "# Auto-generated protection environment variables\n\
             # DO NOT MODIFY - Generated at build time\n\
             BUILD_TIMESTAMP={}\n\
             INTEGRITY_HASH={}\n\
             RUHI_APP_ID={}",
            self.timestamp,
            self.hash,
            self.app_id()
        )
    }

    pub fn module(&self) -> String {
        render_constants_module(self.timestamp, &self.hash, &self.version, &self.node_env)
    }
}

/// TypeScript module exporting a frozen `BUILD_CONSTANTS` object.
pub(crate) fn render_constants_module(timestamp: i64, hash: &str, version: &str, node_env: &str) -> String {
    format!(
        "/**\n * Build Constants\n * Auto-generated at build time - DO NOT MODIFY\n */\n\n\
         export const BUILD_CONSTANTS = Object.freeze({{\n  \
         TIMESTAMP: {},\n  HASH: '{}',\n  VERSION: '{}',\n  NODE_ENV: '{}',\n}});",
        timestamp, hash, version, node_env
    )
}

/// Applies build protection to a project tree.
pub struct BuildProtector {
    root: PathBuf,
    critical_files: Vec<String>,
    constants_path: PathBuf,
    node_env: String,
    clock: Arc<dyn Clock>,
}

impl BuildProtector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            critical_files: CRITICAL_FILES.iter().map(|f| f.to_string()).collect(),
            constants_path: PathBuf::from(BUILD_CONSTANTS_FILE),
            node_env: std::env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_critical_files(mut self, files: Vec<String>) -> Self {
        self.critical_files = files;
        self
    }

    /// Output path of the constants module, relative to the root.
    pub fn with_constants_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.constants_path = path.into();
        self
    }

    pub fn with_node_env(mut self, node_env: impl Into<String>) -> Self {
        self.node_env = node_env.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hash the critical files and write both generated outputs.
    pub fn protect(&self) -> Result<BuildConstants> {
        info!(root = %self.root.display(), "Applying build protection");

        let constants = BuildConstants {
            timestamp: self.clock.now_millis(),
            hash: self.integrity_hash()?,
            version: self.package_version(),
            node_env: self.node_env.clone(),
        };

        let env_path = self.root.join(PROTECTION_ENV_FILE);
        fs::write(&env_path, constants.env_file())?;
        debug!(path = %env_path.display(), "Wrote protection env file");

        let module_path = self.root.join(&self.constants_path);
        if let Some(parent) = module_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&module_path, constants.module())?;
        debug!(path = %module_path.display(), "Wrote build constants");

        info!(build_id = %constants.build_id(), "Build protection applied");
        Ok(constants)
    }

    /// SHA-256 over the concatenated hex digests of the critical files.
    ///
    /// Missing files are skipped; with none present this is the digest of
    /// the empty string.
    pub fn integrity_hash(&self) -> Result<String> {
        let mut hasher = Sha256::new();

        for file in &self.critical_files {
            let path = self.root.join(file);
            if !path.is_file() {
                debug!(file = %file, "Critical file missing, skipped");
                continue;
            }
            let content = fs::read(&path)?;
            hasher.update(sha256_bytes_hex(&content).as_bytes());
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// `version` from the project's `package.json`, or this crate's version.
    fn package_version(&self) -> String {
        let path = self.root.join("package.json");
        fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
            .and_then(|package| package.get("version")?.as_str().map(String::from))
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }
}
