//! Capability ports.
//!
//! These traits are the only way the protection layer observes or touches
//! its host. Browser builds implement them over the DOM; server execution
//! and tests use plain adapters.

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as epoch milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// A soft validation step. Implementations log their own failures and never
/// panic; the returned flag is advisory.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Stable name used in logs and reports.
    fn name(&self) -> &'static str;

    async fn validate(&self) -> bool;
}

/// The environment the application is running in.
pub trait HostEnvironment: Send + Sync {
    /// The interactive display surface, or `None` for pure server execution.
    fn display(&self) -> Option<&dyn DisplaySurface>;

    /// Resolve a configuration value by name (e.g. an injected env var).
    fn config_value(&self, name: &str) -> Option<String>;

    /// Source text of a well-known runtime function, as the runtime prints it.
    fn function_source(&self, name: &str) -> Result<String>;
}

/// Outer and inner window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub outer_width: u32,
    pub outer_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
}

/// Physical screen geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
}

/// What the WebGL debug extension reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "renderer")]
pub enum WebGlRenderer {
    /// No WebGL context could be created.
    Unavailable,
    /// Context exists but the renderer debug extension is missing.
    NoDebugInfo,
    /// Unmasked renderer string.
    Renderer(String),
}

/// Browser-side signals.
pub trait DisplaySurface: Send + Sync {
    fn hostname(&self) -> Result<String>;

    fn window_metrics(&self) -> Result<WindowMetrics>;

    fn user_agent(&self) -> Result<String>;

    /// `navigator.webdriver`.
    fn webdriver(&self) -> Result<bool>;

    /// Whether an identifier is defined on the global object.
    fn has_global(&self, name: &str) -> Result<bool>;

    /// Data URL of the fingerprint canvas render, `None` without a 2D context.
    fn canvas_data_url(&self) -> Result<Option<String>>;

    fn webgl_renderer(&self) -> Result<WebGlRenderer>;

    fn screen(&self) -> Result<ScreenInfo>;

    /// Resolved IANA timezone name.
    fn timezone(&self) -> Result<String>;

    /// Language preference list, most preferred first.
    fn languages(&self) -> Result<Vec<String>>;

    /// Logical core count, if the runtime exposes it.
    fn hardware_concurrency(&self) -> Option<u32>;

    fn platform(&self) -> Result<String>;
}

/// A keyboard shortcut by legacy key code and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub key_code: u32,
    pub ctrl: bool,
    pub shift: bool,
}

impl Shortcut {
    pub const fn key(key_code: u32) -> Self {
        Self {
            key_code,
            ctrl: false,
            shift: false,
        }
    }

    pub const fn ctrl_shift(key_code: u32) -> Self {
        Self {
            key_code,
            ctrl: true,
            shift: true,
        }
    }
}

/// Environment-wide mutations used by the anti-tampering installer.
pub trait RuntimeHooks: Send + Sync {
    /// Swallow context-menu events.
    fn suppress_context_menu(&self) -> Result<()>;

    /// Swallow the given keyboard shortcuts.
    fn suppress_shortcuts(&self, shortcuts: &[Shortcut]) -> Result<()>;

    /// Execute a debugger breakpoint statement. Returns immediately when no
    /// debugger is attached.
    fn debugger_pause(&self);

    /// Freeze a global object by path (e.g. `Object.prototype`).
    fn freeze(&self, object: &str) -> Result<()>;

    /// Replace every rendered stack frame with `frame`.
    fn replace_stack_traces(&self, frame: &str) -> Result<()>;
}

/// Durable per-origin key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}
