//! Protection configuration.
//!
//! Values are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional `ruhi.{toml,yaml,json}` file in the project root
//! 3. `RUHI_*` environment variables (list values comma-separated)
//! 4. the generated `BUILD_TIMESTAMP` / `INTEGRITY_HASH` variables
//!
//! `.env.local` and then `.env.protection` are loaded into the process
//! environment first; variables already set are never overridden, so an
//! operator-provisioned `RUHI_APP_ID` wins over the build-derived one.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Environment variable prefix for protection settings.
pub const ENV_PREFIX: &str = "RUHI";

/// Files loaded into the process environment by [`ProtectionConfig::load_from`].
pub const DOTENV_FILES: [&str; 2] = [".env.local", ".env.protection"];

/// Constants compiled into the application.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConstants {
    /// Hex-encoded embedded signature used by the license fallback path.
    pub app_signature: &'static str,
    pub version_check: &'static str,
    pub protocol_version: u32,
}

pub const RUNTIME_CONSTANTS: RuntimeConstants = RuntimeConstants {
    app_signature: "52756869416970706c6963",
    version_check: "v1.0.0",
    protocol_version: 2026,
};

/// Execution mode of the host application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Development,
    Production,
}

impl ExecutionMode {
    pub fn is_production(self) -> bool {
        self == ExecutionMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Development => "development",
            ExecutionMode::Production => "production",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// Application identifier (unique per deployment).
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Configuration keys the host must provide.
    #[serde(default = "default_required_env_vars")]
    pub required_env_vars: Vec<String>,
    /// Hostnames allowed in production (substring match).
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,
    /// Production domain, appended to the allow-list when set.
    #[serde(default)]
    pub domain: Option<String>,
    /// Storage key for the persisted fingerprint.
    #[serde(default = "default_fingerprint_key")]
    pub fingerprint_key: String,
    /// Encoded license; empty means the embedded fallback is used.
    #[serde(default)]
    pub license_key: String,
    /// Build timestamp in epoch milliseconds, as written by the build protector.
    #[serde(default)]
    pub build_timestamp: Option<String>,
    /// Combined integrity digest written by the build protector.
    #[serde(default)]
    pub integrity_hash: String,
    #[serde(default = "default_true")]
    pub enable_env_check: bool,
    #[serde(default = "default_true")]
    pub enable_fingerprint_check: bool,
    #[serde(default = "default_true")]
    pub enable_license_check: bool,
    #[serde(default = "default_true")]
    pub enable_domain_check: bool,
    /// Fail fingerprint validation on mismatch instead of only logging.
    #[serde(default)]
    pub enforce_fingerprint: bool,
    #[serde(default = "default_obfuscation_level")]
    pub obfuscation_level: u8,
    /// Debugger and dev-tools probes; defaults to on in production.
    #[serde(default)]
    pub anti_debug: Option<bool>,
    #[serde(default)]
    pub mode: ExecutionMode,
}

fn default_app_id() -> String {
    "ruhi-8f3a2c1d".to_string()
}

fn default_required_env_vars() -> Vec<String> {
    vec![
        "NEXT_PUBLIC_FIREBASE_API_KEY".to_string(),
        "NEXT_PUBLIC_FIREBASE_AUTH_DOMAIN".to_string(),
        "NEXT_PUBLIC_FIREBASE_PROJECT_ID".to_string(),
    ]
}

fn default_allowed_domains() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

fn default_fingerprint_key() -> String {
    "ruhi_app_fp_v1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_obfuscation_level() -> u8 {
    3
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            required_env_vars: default_required_env_vars(),
            allowed_domains: default_allowed_domains(),
            domain: None,
            fingerprint_key: default_fingerprint_key(),
            license_key: String::new(),
            build_timestamp: None,
            integrity_hash: String::new(),
            enable_env_check: true,
            enable_fingerprint_check: true,
            enable_license_check: true,
            enable_domain_check: true,
            enforce_fingerprint: false,
            obfuscation_level: default_obfuscation_level(),
            anti_debug: None,
            mode: ExecutionMode::Development,
        }
    }
}

impl ProtectionConfig {
    /// Load configuration for the project in the current directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load dotenv files from `root`, then build from the process environment.
    pub fn load_from(root: &Path) -> Result<Self> {
        for name in DOTENV_FILES {
            let path = root.join(name);
            if path.exists() {
                dotenvy::from_path(&path)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
                debug!(path = %path.display(), "Loaded dotenv file");
            }
        }

        Self::from_sources(Some(root), std::env::vars().collect())
    }

    /// Build configuration from an optional project root and an explicit
    /// variable map.
    pub fn from_sources(root: Option<&Path>, vars: HashMap<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(root) = root {
            let base = root.join("ruhi");
            builder = builder
                .add_source(config::File::with_name(&base.to_string_lossy()).required(false));
        }

        let build_timestamp = vars.get("BUILD_TIMESTAMP").cloned();
        let integrity_hash = vars.get("INTEGRITY_HASH").cloned();

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("required_env_vars")
                    .with_list_parse_key("allowed_domains")
                    .source(Some(vars.into_iter().collect())),
            )
            .set_override_option("build_timestamp", build_timestamp)?
            .set_override_option("integrity_hash", integrity_hash)?;

        let config: ProtectionConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Allow-list including the configured production domain.
    pub fn allowed_domains(&self) -> Vec<&str> {
        self.allowed_domains
            .iter()
            .map(String::as_str)
            .chain(self.domain.as_deref())
            .filter(|d| !d.is_empty())
            .collect()
    }

    /// Whether the debugger and dev-tools probes run.
    pub fn anti_debug(&self) -> bool {
        self.anti_debug.unwrap_or(self.mode.is_production())
    }

    /// Whether a non-blank build timestamp is configured.
    pub fn has_build_timestamp(&self) -> bool {
        self.build_timestamp
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Build timestamp as epoch milliseconds.
    ///
    /// Reads the leading integer and ignores trailing text, so
    /// `"1700000000000x"` gives `1700000000000`. `None` when absent or when
    /// there are no leading digits.
    pub fn build_timestamp_millis(&self) -> Option<i64> {
        self.build_timestamp.as_deref().and_then(leading_integer)
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_license_key(mut self, license_key: impl Into<String>) -> Self {
        self.license_key = license_key.into();
        self
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    pub fn with_required_env_vars(mut self, vars: Vec<String>) -> Self {
        self.required_env_vars = vars;
        self
    }

    pub fn with_build_timestamp(mut self, millis: i64) -> Self {
        self.build_timestamp = Some(millis.to_string());
        self
    }

    pub fn with_enforce_fingerprint(mut self, enforce: bool) -> Self {
        self.enforce_fingerprint = enforce;
        self
    }

    pub fn with_anti_debug(mut self, enabled: bool) -> Self {
        self.anti_debug = Some(enabled);
        self
    }

    /// Copy safe to print: the license key is reduced to a prefix.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.license_key.is_empty() {
            let prefix: String = copy.license_key.chars().take(8).collect();
            copy.license_key = format!("{}…", prefix);
        }
        copy
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ProtectionConfig::from_sources(None, HashMap::new()).unwrap();
        assert_eq!(config.app_id, "ruhi-8f3a2c1d");
        assert_eq!(config.fingerprint_key, "ruhi_app_fp_v1");
        assert_eq!(config.obfuscation_level, 3);
        assert_eq!(config.mode, ExecutionMode::Development);
        assert!(!config.anti_debug());
        assert_eq!(config.allowed_domains(), vec!["localhost", "127.0.0.1"]);
        assert_eq!(config.required_env_vars.len(), 3);
    }

    #[test]
    fn test_env_overrides() {
        let config = ProtectionConfig::from_sources(
            None,
            vars(&[
                ("RUHI_APP_ID", "ruhi-deadbeef"),
                ("RUHI_MODE", "production"),
                ("RUHI_DOMAIN", "ruhi.app"),
                ("RUHI_ALLOWED_DOMAINS", "localhost,staging.ruhi.app"),
                ("RUHI_ENABLE_LICENSE_CHECK", "false"),
                ("BUILD_TIMESTAMP", "1700000000000"),
                ("INTEGRITY_HASH", "abc123"),
            ]),
        )
        .unwrap();

        assert_eq!(config.app_id, "ruhi-deadbeef");
        assert!(config.mode.is_production());
        assert!(config.anti_debug());
        assert!(!config.enable_license_check);
        assert_eq!(
            config.allowed_domains(),
            vec!["localhost", "staging.ruhi.app", "ruhi.app"]
        );
        assert_eq!(config.build_timestamp_millis(), Some(1_700_000_000_000));
        assert_eq!(config.integrity_hash, "abc123");
    }

    #[test]
    fn test_unparseable_build_timestamp() {
        let config = ProtectionConfig::default();
        assert_eq!(config.build_timestamp_millis(), None);

        let config = ProtectionConfig {
            build_timestamp: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(config.has_build_timestamp());
        assert_eq!(config.build_timestamp_millis(), None);
    }

    #[test]
    fn test_build_timestamp_reads_leading_digits() {
        let parse = |raw: &str| {
            ProtectionConfig {
                build_timestamp: Some(raw.to_string()),
                ..Default::default()
            }
            .build_timestamp_millis()
        };

        assert_eq!(parse("1700000000000x"), Some(1_700_000_000_000));
        assert_eq!(parse("  42ms"), Some(42));
        assert_eq!(parse("-5"), Some(-5));
        assert_eq!(parse("x1700000000000"), None);
        assert_eq!(parse("-"), None);
    }

    #[test]
    fn test_blank_build_timestamp_is_absent() {
        let config = ProtectionConfig {
            build_timestamp: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!config.has_build_timestamp());
        assert!(!ProtectionConfig::default().has_build_timestamp());
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ruhi.toml"),
            "app_id = \"ruhi-from-file\"\nenforce_fingerprint = true\n",
        )
        .unwrap();

        let config = ProtectionConfig::from_sources(
            Some(dir.path()),
            vars(&[("RUHI_OBFUSCATION_LEVEL", "1")]),
        )
        .unwrap();

        assert_eq!(config.app_id, "ruhi-from-file");
        assert!(config.enforce_fingerprint);
        assert_eq!(config.obfuscation_level, 1);
    }

    #[test]
    fn test_redacted_hides_license() {
        let config = ProtectionConfig::default().with_license_key("eyJrZXkiOiJydWhpIn0=");
        assert_eq!(config.redacted().license_key, "eyJrZXki…");
        assert_eq!(ProtectionConfig::default().redacted().license_key, "");
    }
}
