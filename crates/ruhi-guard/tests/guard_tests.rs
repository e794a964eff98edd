//! Guard, manager and validator scenarios against recorded browser hosts.

use pretty_assertions::assert_eq;
use ruhi_core::ports::{HostEnvironment, KeyValueStore, Validator};
use ruhi_core::{ExecutionMode, FixedClock, MemoryStore, ProtectionConfig};
use ruhi_guard::{
    BrowserSnapshot, Decision, EnvironmentValidator, EnvironmentVerdict, FingerprintValidator,
    FingerprintVerdict, Guard, NativeHost, ProtectionManager, StrictPolicy,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const NOW: i64 = 1_800_000_000_000;

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,ruhi_guard=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A browser with every required configuration value present.
fn configured_browser() -> BrowserSnapshot {
    BrowserSnapshot::default()
        .with_config("NEXT_PUBLIC_FIREBASE_API_KEY", "AIzaSyD-test")
        .with_config("NEXT_PUBLIC_FIREBASE_AUTH_DOMAIN", "ruhi-test.firebaseapp.com")
        .with_config("NEXT_PUBLIC_FIREBASE_PROJECT_ID", "ruhi-test")
}

fn production() -> ProtectionConfig {
    ProtectionConfig::default().with_mode(ExecutionMode::Production)
}

fn environment(config: ProtectionConfig, host: impl HostEnvironment + 'static) -> EnvironmentValidator {
    EnvironmentValidator::new(Arc::new(config), Arc::new(host))
}

fn manager(
    config: ProtectionConfig,
    host: impl HostEnvironment + 'static,
    store: Arc<dyn KeyValueStore>,
) -> ProtectionManager {
    ProtectionManager::from_host(
        Arc::new(config),
        Arc::new(host),
        store,
        Arc::new(FixedClock::from_millis(NOW)),
    )
}

#[tokio::test]
async fn test_localhost_with_port_passes_in_production() {
    init_test_logging();
    let host = configured_browser().with_hostname("localhost:3000");
    let validator = environment(production(), host);

    assert_eq!(
        validator.inspect(),
        EnvironmentVerdict::Passed {
            devtools_suspected: false
        }
    );
    assert!(validator.validate().await);
}

#[tokio::test]
async fn test_unknown_domain_rejected_only_in_production() {
    let host = || configured_browser().with_hostname("mirror.example.net");

    assert!(!environment(production(), host()).validate().await);
    assert!(environment(ProtectionConfig::default(), host()).validate().await);
}

#[tokio::test]
async fn test_configured_domain_extends_allow_list() {
    let config = ProtectionConfig {
        domain: Some("ruhi.app".to_string()),
        ..production()
    };
    let host = configured_browser().with_hostname("www.ruhi.app");
    assert!(environment(config, host).validate().await);
}

#[tokio::test]
async fn test_undefined_config_value_is_missing() {
    let host = configured_browser().with_config("NEXT_PUBLIC_FIREBASE_PROJECT_ID", "undefined");
    let validator = environment(ProtectionConfig::default(), host);

    assert_eq!(
        validator.inspect(),
        EnvironmentVerdict::MissingConfig {
            key: "NEXT_PUBLIC_FIREBASE_PROJECT_ID".to_string()
        }
    );
    assert!(!validator.validate().await);
}

#[tokio::test]
async fn test_docked_devtools_only_flagged_with_anti_debug() {
    let mut host = configured_browser();
    host.window.inner_width = 700;

    let dev = environment(ProtectionConfig::default(), host.clone());
    assert_eq!(
        dev.inspect(),
        EnvironmentVerdict::Passed {
            devtools_suspected: false
        }
    );

    let prod = environment(production(), host);
    assert_eq!(
        prod.inspect(),
        EnvironmentVerdict::Passed {
            devtools_suspected: true
        }
    );
}

#[tokio::test]
async fn test_environment_hash_tracks_hostname_and_mode() {
    let a = environment(ProtectionConfig::default(), configured_browser()).environment_hash();
    let b = environment(production(), configured_browser()).environment_hash();
    let c = environment(
        ProtectionConfig::default(),
        configured_browser().with_hostname("127.0.0.1"),
    )
    .environment_hash();
    let server = environment(ProtectionConfig::default(), NativeHost).environment_hash();

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(
        server,
        ruhi_core::environment_hash(None, "development", "ruhi-8f3a2c1d")
    );
}

#[tokio::test]
async fn test_server_execution_validates() {
    init_test_logging();
    let manager = manager(production(), NativeHost, Arc::new(MemoryStore::new()));

    assert!(manager.validate().await);
    assert!(manager.is_validated());
}

#[tokio::test]
async fn test_fingerprint_stored_then_matched() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let validator = FingerprintValidator::new(
        Arc::new(ProtectionConfig::default()),
        Arc::new(configured_browser()),
        Arc::clone(&store),
    );

    let fingerprint = match validator.inspect().await {
        FingerprintVerdict::FirstRun { fingerprint } => fingerprint,
        other => panic!("expected first run, got {:?}", other),
    };
    assert_eq!(store.get("ruhi_app_fp_v1").unwrap(), Some(fingerprint.clone()));

    match validator.inspect().await {
        FingerprintVerdict::Match {
            fingerprint: current,
            similarity,
            ..
        } => {
            assert_eq!(current, fingerprint);
            assert_eq!(similarity, 1.0);
        }
        other => panic!("expected match, got {:?}", other),
    }
    assert!(validator.validate().await);
}

#[tokio::test]
async fn test_fingerprint_mismatch_enforcement() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set("ruhi_app_fp_v1", "zzzzzzz").unwrap();

    let soft = FingerprintValidator::new(
        Arc::new(ProtectionConfig::default()),
        Arc::new(configured_browser()),
        Arc::clone(&store),
    );
    assert!(matches!(
        soft.inspect().await,
        FingerprintVerdict::Mismatch { .. }
    ));
    assert!(soft.validate().await);

    let enforced = FingerprintValidator::new(
        Arc::new(ProtectionConfig::default().with_enforce_fingerprint(true)),
        Arc::new(configured_browser()),
        Arc::clone(&store),
    );
    assert!(!enforced.validate().await);

    // a mismatch never overwrites the stored value
    assert_eq!(store.get("ruhi_app_fp_v1").unwrap().as_deref(), Some("zzzzzzz"));
}

#[tokio::test]
async fn test_fingerprint_skipped_without_display() {
    let validator = FingerprintValidator::new(
        Arc::new(ProtectionConfig::default()),
        Arc::new(NativeHost),
        Arc::new(MemoryStore::new()),
    );
    assert_eq!(validator.generate().await, None);
    assert_eq!(validator.inspect().await, FingerprintVerdict::Skipped);
}

#[tokio::test]
async fn test_degraded_capabilities_still_fingerprint() {
    let host = configured_browser().blocking("canvas").blocking("webgl");
    let validator = FingerprintValidator::new(
        Arc::new(ProtectionConfig::default()),
        Arc::new(host),
        Arc::new(MemoryStore::new()),
    );
    assert!(validator.generate().await.is_some());
    assert!(validator.validate().await);
}

#[tokio::test]
async fn test_manager_failure_is_memoized_until_reset() {
    let manager = manager(
        production(),
        configured_browser().with_hostname("mirror.example.net"),
        Arc::new(MemoryStore::new()),
    );

    assert!(!manager.validate().await);
    assert!(!manager.validate().await);
    assert!(!manager.is_validated());

    manager.reset().await;
    assert!(!manager.validate().await);
}

#[tokio::test]
async fn test_mount_clean_browser() {
    init_test_logging();
    let guard = Guard::builder(
        ProtectionConfig::default().with_build_timestamp(NOW - 60_000),
        Arc::new(configured_browser()),
    )
    .clock(Arc::new(FixedClock::from_millis(NOW)))
    .probe_interval(Duration::from_millis(10))
    .build();

    let outcome = guard.mount().await;

    assert!(outcome.validated);
    assert!(outcome.integrity);
    assert!(!outcome.virtual_environment);
    assert_eq!(outcome.decision, Decision::Allow);
    assert!(outcome.should_render());
    assert!(guard.manager().is_validated());

    guard.anti_tamper().abort_probe();
}

#[tokio::test]
async fn test_mount_advisory_renders_despite_failures() {
    let host = BrowserSnapshot {
        user_agent: "Mozilla/5.0 HeadlessChrome/131.0.0.0".to_string(),
        ..configured_browser()
    }
    .with_function("fetch", "function fetch() { return intercepted(); }");
    let guard = Guard::builder(production(), Arc::new(host)).build();

    let outcome = guard.mount().await;

    assert!(outcome.validated);
    assert!(!outcome.integrity);
    assert!(outcome.virtual_environment);
    assert_eq!(outcome.decision, Decision::Warn);
    assert!(outcome.should_render());

    guard.anti_tamper().abort_probe();
}

#[tokio::test]
async fn test_mount_strict_denies_tampered_runtime() {
    let host = configured_browser().with_function("fetch", "function fetch() { return intercepted(); }");
    let guard = Guard::builder(ProtectionConfig::default(), Arc::new(host))
        .policy(StrictPolicy)
        .build();

    let outcome = guard.mount().await;

    assert_eq!(outcome.decision, Decision::Deny);
    assert!(!outcome.should_render());
    assert_eq!(
        guard.integrity().generate_integrity_report(),
        "code_integrity: ✗\nconsole_integrity: ✓\nglobal_scope: ✓\ntimestamp_valid: ✓"
    );

    guard.anti_tamper().abort_probe();
}

#[tokio::test]
async fn test_hooks_install_once() {
    let guard = Guard::builder(ProtectionConfig::default(), Arc::new(configured_browser())).build();

    assert!(guard.anti_tamper().install());
    assert!(!guard.anti_tamper().install());

    guard.anti_tamper().abort_probe();
}
