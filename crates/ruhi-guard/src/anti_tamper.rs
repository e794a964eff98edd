//! Anti-tampering hooks.
//!
//! Installs best-effort deterrents through [`RuntimeHooks`]: context-menu
//! and dev-tools shortcut suppression, a recurring debugger timing probe and
//! prototype freezing. Nothing here enforces anything; the probe only
//! counts and logs suspicions.

use ruhi_core::ports::{HostEnvironment, RuntimeHooks, Shortcut};
use ruhi_core::ProtectionConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// F12 and Ctrl+Shift+I/J/C/U.
pub const DEVTOOLS_SHORTCUTS: [Shortcut; 5] = [
    Shortcut::key(123),
    Shortcut::ctrl_shift(73),
    Shortcut::ctrl_shift(74),
    Shortcut::ctrl_shift(67),
    Shortcut::ctrl_shift(85),
];

pub const FROZEN_OBJECTS: [&str; 3] = ["Object.prototype", "Array.prototype", "Function.prototype"];

/// A breakpoint that takes longer than this is assumed to have paused.
pub const DEBUGGER_THRESHOLD: Duration = Duration::from_millis(100);

pub const PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Frame text substituted into stack traces in production.
pub const ANONYMOUS_FRAME: &str = "at <anonymous>";

const HEADLESS_MARKER: &str = "HeadlessChrome";
const AUTOMATION_GLOBALS: [&str; 2] = ["__nightmare", "callPhantom"];

/// Installs and owns the anti-tampering hooks.
pub struct AntiTamper {
    config: Arc<ProtectionConfig>,
    host: Arc<dyn HostEnvironment>,
    hooks: Arc<dyn RuntimeHooks>,
    probe_interval: Duration,
    installed: AtomicBool,
    suspicions: Arc<AtomicU64>,
    probe: Mutex<Option<JoinHandle<()>>>,
}

impl AntiTamper {
    pub fn new(
        config: Arc<ProtectionConfig>,
        host: Arc<dyn HostEnvironment>,
        hooks: Arc<dyn RuntimeHooks>,
    ) -> Self {
        Self {
            config,
            host,
            hooks,
            probe_interval: PROBE_INTERVAL,
            installed: AtomicBool::new(false),
            suspicions: Arc::new(AtomicU64::new(0)),
            probe: Mutex::new(None),
        }
    }

    /// Override the debugger probe period.
    pub fn with_probe_interval(mut self, period: Duration) -> Self {
        self.probe_interval = period;
        self
    }

    /// Install all hooks once. Returns `false` when nothing was installed
    /// (already installed, or no display surface).
    pub fn install(&self) -> bool {
        if self.host.display().is_none() {
            return false;
        }
        if self.installed.swap(true, Ordering::SeqCst) {
            debug!("Anti-tampering hooks already installed");
            return false;
        }

        if self.config.mode.is_production() {
            if let Err(e) = self.hooks.suppress_context_menu() {
                debug!(error = %e, "Could not suppress context menu");
            }
            if let Err(e) = self.hooks.suppress_shortcuts(&DEVTOOLS_SHORTCUTS) {
                debug!(error = %e, "Could not suppress shortcuts");
            }
        }

        self.spawn_probe();
        self.freeze_critical_objects();

        info!(mode = %self.config.mode, "Anti-tampering hooks installed");
        true
    }

    /// Number of debugger pauses observed by the probe so far.
    pub fn debugger_suspicions(&self) -> u64 {
        self.suspicions.load(Ordering::Relaxed)
    }

    /// Stop the probe task. The layer itself never calls this.
    pub fn abort_probe(&self) {
        if let Some(handle) = self.probe_slot().take() {
            handle.abort();
        }
    }

    /// Heuristic check for headless or automated browsers.
    pub fn detect_virtual_environment(&self) -> bool {
        let Some(display) = self.host.display() else {
            return false;
        };

        let headless = display
            .user_agent()
            .map(|ua| ua.contains(HEADLESS_MARKER))
            .unwrap_or(false);
        let webdriver = display.webdriver().unwrap_or(false);
        let automation = AUTOMATION_GLOBALS
            .iter()
            .any(|name| display.has_global(name).unwrap_or(false));

        headless || webdriver || automation
    }

    /// Replace stack frames with an anonymous marker in production.
    pub fn obfuscate_stack_traces(&self) {
        if !self.config.mode.is_production() {
            return;
        }
        if let Err(e) = self.hooks.replace_stack_traces(ANONYMOUS_FRAME) {
            debug!(error = %e, "Could not replace stack traces");
        }
    }

    fn spawn_probe(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, debugger probe not started");
            return;
        };

        let hooks = Arc::clone(&self.hooks);
        let suspicions = Arc::clone(&self.suspicions);
        let enabled = self.config.anti_debug();
        let period = self.probe_interval;

        let handle = runtime.spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                if enabled {
                    probe_debugger(hooks.as_ref(), &suspicions);
                }
            }
        });

        *self.probe_slot() = Some(handle);
    }

    fn freeze_critical_objects(&self) {
        for object in FROZEN_OBJECTS {
            if let Err(e) = self.hooks.freeze(object) {
                debug!(object, error = %e, "Could not freeze object");
            }
        }
    }

    fn probe_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.probe.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn probe_debugger(hooks: &dyn RuntimeHooks, suspicions: &AtomicU64) {
    let start = Instant::now();
    hooks.debugger_pause();
    let elapsed = start.elapsed();

    if elapsed > DEBUGGER_THRESHOLD {
        suspicions.fetch_add(1, Ordering::Relaxed);
        warn!(elapsed_ms = elapsed.as_millis() as u64, "Debugger detected");
    }
}
