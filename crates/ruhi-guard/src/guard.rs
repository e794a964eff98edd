//! The host-facing guard.
//!
//! A [`Guard`] wires the manager, integrity checker and anti-tampering hooks
//! together. Hosts call [`Guard::mount`] once when the application mounts
//! and render according to the returned [`MountOutcome`].

use crate::anti_tamper::AntiTamper;
use crate::host::NoopHooks;
use crate::integrity::IntegrityChecker;
use crate::manager::ProtectionManager;
use crate::policy::{AdvisoryPolicy, Decision, MountReport, Policy};
use ruhi_core::ports::{Clock, HostEnvironment, KeyValueStore, RuntimeHooks};
use ruhi_core::{MemoryStore, ProtectionConfig, SystemClock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What a mount found and what the policy decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MountOutcome {
    pub validated: bool,
    pub integrity: bool,
    pub virtual_environment: bool,
    pub decision: Decision,
}

impl MountOutcome {
    pub fn should_render(&self) -> bool {
        self.decision.should_render()
    }
}

pub struct Guard {
    config: Arc<ProtectionConfig>,
    manager: Arc<ProtectionManager>,
    integrity: IntegrityChecker,
    anti_tamper: AntiTamper,
    policy: Box<dyn Policy>,
}

impl Guard {
    pub fn builder(config: ProtectionConfig, host: Arc<dyn HostEnvironment>) -> GuardBuilder {
        GuardBuilder::new(config, host)
    }

    /// Install the hooks, run every check and apply the policy.
    pub async fn mount(&self) -> MountOutcome {
        self.anti_tamper.install();
        self.anti_tamper.obfuscate_stack_traces();

        let virtual_environment = self.anti_tamper.detect_virtual_environment();
        if virtual_environment && self.config.mode.is_production() {
            warn!("Virtual environment detected");
        }

        let validated = self.manager.validate().await;
        let integrity = self.integrity.perform_checks().await;

        let report = MountReport {
            validated,
            integrity,
            virtual_environment,
            debugger_suspicions: self.anti_tamper.debugger_suspicions(),
        };
        let decision = self.policy.decide(&report);
        info!(
            validated,
            integrity,
            virtual_environment,
            decision = %decision,
            "Protection guard mounted"
        );

        MountOutcome {
            validated,
            integrity,
            virtual_environment,
            decision,
        }
    }

    pub fn manager(&self) -> &Arc<ProtectionManager> {
        &self.manager
    }

    pub fn integrity(&self) -> &IntegrityChecker {
        &self.integrity
    }

    pub fn anti_tamper(&self) -> &AntiTamper {
        &self.anti_tamper
    }
}

/// Builder for [`Guard`]. Unset parts default to an in-memory store, the
/// system clock, no-op hooks and the advisory policy.
pub struct GuardBuilder {
    config: ProtectionConfig,
    host: Arc<dyn HostEnvironment>,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    hooks: Option<Arc<dyn RuntimeHooks>>,
    policy: Option<Box<dyn Policy>>,
    probe_interval: Option<Duration>,
}

impl GuardBuilder {
    pub fn new(config: ProtectionConfig, host: Arc<dyn HostEnvironment>) -> Self {
        Self {
            config,
            host,
            store: None,
            clock: None,
            hooks: None,
            policy: None,
            probe_interval: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn RuntimeHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    pub fn probe_interval(mut self, period: Duration) -> Self {
        self.probe_interval = Some(period);
        self
    }

    pub fn build(self) -> Guard {
        let config = Arc::new(self.config);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let hooks = self
            .hooks
            .unwrap_or_else(|| Arc::new(NoopHooks) as Arc<dyn RuntimeHooks>);

        let manager = ProtectionManager::from_host(
            Arc::clone(&config),
            Arc::clone(&self.host),
            store,
            Arc::clone(&clock),
        );
        let integrity = IntegrityChecker::new(Arc::clone(&config), Arc::clone(&self.host), clock);
        let mut anti_tamper = AntiTamper::new(Arc::clone(&config), self.host, hooks);
        if let Some(period) = self.probe_interval {
            anti_tamper = anti_tamper.with_probe_interval(period);
        }

        Guard {
            config,
            manager: Arc::new(manager),
            integrity,
            anti_tamper,
            policy: self.policy.unwrap_or_else(|| Box::new(AdvisoryPolicy)),
        }
    }
}
