//! Setup, protect and verify against a scratch project tree.

use pretty_assertions::assert_eq;
use ruhi_build::{BuildProtector, ProtectionSetup, ProtectionVerifier};
use ruhi_core::ports::Validator;
use ruhi_core::{FixedClock, ProtectionConfig, sha256_hex};
use ruhi_licensing::LicenseValidator;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const NOW: i64 = 1_767_225_600_000;

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::from_millis(NOW))
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn dotenv(path: &Path) -> HashMap<String, String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_setup_provisions_fresh_project() {
    let dir = tempfile::tempdir().unwrap();
    let report = ProtectionSetup::new(dir.path()).with_clock(clock()).run().unwrap();

    assert!(report.env_created);
    assert!(report.license_written);
    assert!(report.gitignore_updated);
    assert!(report.template_created);

    let parts: Vec<&str> = report.app_id.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "ruhi");
    assert_eq!(parts[2].len(), 8);

    let env = dotenv(&dir.path().join(".env.local"));
    assert_eq!(env.get("RUHI_APP_ID"), Some(&report.app_id));
    assert_eq!(env.get("RUHI_LICENSE_KEY"), Some(&report.license_key));

    let constants = fs::read_to_string(dir.path().join("protection/build-constants.ts")).unwrap();
    assert!(constants.contains("TIMESTAMP: 0,"));
}

#[tokio::test]
async fn test_setup_license_validates_for_its_app_id() {
    let dir = tempfile::tempdir().unwrap();
    let report = ProtectionSetup::new(dir.path()).with_clock(clock()).run().unwrap();

    let config = ProtectionConfig::default()
        .with_app_id(report.app_id.clone())
        .with_license_key(report.license_key.clone());
    let validator = LicenseValidator::new(Arc::new(config), clock());

    assert!(validator.validate().await);
}

#[test]
fn test_setup_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".gitignore", "node_modules\n");

    let first = ProtectionSetup::new(dir.path()).with_clock(clock()).run().unwrap();
    let env_after_first = fs::read_to_string(dir.path().join(".env.local")).unwrap();
    let ignore_after_first = fs::read_to_string(dir.path().join(".gitignore")).unwrap();

    let second = ProtectionSetup::new(dir.path()).with_clock(clock()).run().unwrap();

    assert_eq!(second.app_id, first.app_id);
    assert_eq!(second.license_key, first.license_key);
    assert!(!second.env_created);
    assert!(!second.license_written);
    assert!(!second.gitignore_updated);
    assert!(!second.template_created);
    assert_eq!(
        fs::read_to_string(dir.path().join(".env.local")).unwrap(),
        env_after_first
    );
    assert_eq!(
        fs::read_to_string(dir.path().join(".gitignore")).unwrap(),
        ignore_after_first
    );
    assert!(ignore_after_first.starts_with("node_modules\n\n# Protection System\n"));
}

#[test]
fn test_setup_appends_to_existing_env_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".env.local", "NEXT_PUBLIC_FIREBASE_API_KEY=abc");

    let report = ProtectionSetup::new(dir.path()).with_clock(clock()).run().unwrap();

    assert!(!report.env_created);
    let env = dotenv(&dir.path().join(".env.local"));
    assert_eq!(env.get("NEXT_PUBLIC_FIREBASE_API_KEY").map(String::as_str), Some("abc"));
    assert_eq!(env.get("RUHI_APP_ID"), Some(&report.app_id));
    assert!(env.contains_key("RUHI_LICENSE_KEY"));
}

#[test]
fn test_protect_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/app/layout.tsx", "export default function Layout() {}");
    write(dir.path(), "protection/config.ts", "export const config = {};");
    write(dir.path(), "package.json", r#"{"name":"ruhi","version":"2.3.1"}"#);

    let constants = BuildProtector::new(dir.path())
        .with_clock(clock())
        .with_node_env("production")
        .protect()
        .unwrap();

    let expected = sha256_hex(&format!(
        "{}{}",
        sha256_hex("export default function Layout() {}"),
        sha256_hex("export const config = {};")
    ));
    assert_eq!(constants.hash, expected);
    assert_eq!(constants.version, "2.3.1");
    assert_eq!(constants.timestamp, NOW);

    let env = dotenv(&dir.path().join(".env.protection"));
    assert_eq!(env.get("BUILD_TIMESTAMP").map(String::as_str), Some("1767225600000"));
    assert_eq!(env.get("INTEGRITY_HASH"), Some(&expected));
    assert_eq!(env.get("RUHI_APP_ID"), Some(&format!("ruhi-{}", &expected[..8])));

    let module = fs::read_to_string(dir.path().join("protection/build-constants.ts")).unwrap();
    assert!(module.contains("export const BUILD_CONSTANTS = Object.freeze({"));
    assert!(module.contains(&format!("HASH: '{}',", expected)));
    assert!(module.contains("VERSION: '2.3.1',"));
    assert!(module.contains("NODE_ENV: 'production',"));
}

#[test]
fn test_protection_env_feeds_configuration() {
    let dir = tempfile::tempdir().unwrap();
    BuildProtector::new(dir.path()).with_clock(clock()).protect().unwrap();

    let vars = dotenv(&dir.path().join(".env.protection"));
    let config = ProtectionConfig::from_sources(None, vars).unwrap();

    assert_eq!(config.build_timestamp_millis(), Some(NOW));
    assert_eq!(config.integrity_hash.len(), 64);
    assert!(config.app_id.starts_with("ruhi-"));
}

#[test]
fn test_verify_after_setup() {
    let dir = tempfile::tempdir().unwrap();
    ProtectionSetup::new(dir.path()).with_clock(clock()).run().unwrap();
    write(
        dir.path(),
        "package.json",
        r#"{"scripts":{"prebuild":"ruhi protect --root ."}}"#,
    );
    write(dir.path(), "src/app/layout.tsx", "<ProtectionProvider>{children}</ProtectionProvider>");
    write(dir.path(), "src/middleware.ts", "export function middleware() {}");
    write(dir.path(), "next.config.ts", "export default { webpack: (c) => c };");
    for file in ruhi_build::verify::REQUIRED_FILES {
        write(dir.path(), file, "");
    }

    let report = ProtectionVerifier::new(dir.path()).verify();

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(report.is_clean());
    assert!(report.checks.contains(&"prebuild script configured".to_string()));
}
