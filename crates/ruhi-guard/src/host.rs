//! Host adapters.
//!
//! [`NativeHost`] is pure server execution: no display surface, configuration
//! from the process environment. [`BrowserSnapshot`] is a serde-loadable
//! recording of browser signals; a browser bridge fills one in, and the CLI
//! and tests load them from JSON.

use ruhi_core::ports::{
    DisplaySurface, HostEnvironment, RuntimeHooks, ScreenInfo, Shortcut, WebGlRenderer,
    WindowMetrics,
};
use ruhi_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Renders the way an untouched built-in prints itself.
fn native_source(name: &str) -> String {
    let short = name.rsplit('.').next().unwrap_or(name);
    format!("function {}() {{ [native code] }}", short)
}

/// Server-side host without a display surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeHost;

impl HostEnvironment for NativeHost {
    fn display(&self) -> Option<&dyn DisplaySurface> {
        None
    }

    fn config_value(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn function_source(&self, name: &str) -> Result<String> {
        Ok(native_source(name))
    }
}

/// Recorded browser signals.
///
/// Capabilities listed in `blocked` fail when queried, as a browser with the
/// corresponding API disabled or throwing would.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSnapshot {
    pub hostname: String,
    pub window: WindowMetrics,
    pub user_agent: String,
    pub webdriver: bool,
    /// Identifiers defined on the global object.
    pub globals: Vec<String>,
    /// Data URL of the fingerprint canvas; `None` when there is no 2D context.
    pub canvas_data_url: Option<String>,
    pub webgl: WebGlRenderer,
    pub screen: ScreenInfo,
    pub timezone: String,
    pub languages: Vec<String>,
    pub hardware_concurrency: Option<u32>,
    pub platform: String,
    /// Configuration values visible to the application.
    pub config: HashMap<String, String>,
    /// Source text overrides for runtime functions; others print as native.
    pub functions: HashMap<String, String>,
    /// Capability names that fail when queried.
    pub blocked: Vec<String>,
}

impl Default for BrowserSnapshot {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            window: WindowMetrics {
                outer_width: 1280,
                outer_height: 800,
                inner_width: 1280,
                inner_height: 720,
            },
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            webdriver: false,
            globals: vec![],
            canvas_data_url: Some(
                "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAMgAAAAyCAYAAAAZUZThAAAAAXNSR0IArs4c6QAAB".to_string(),
            ),
            webgl: WebGlRenderer::Renderer("ANGLE (Intel, Mesa Intel(R) UHD Graphics 620)".to_string()),
            screen: ScreenInfo {
                width: 1920,
                height: 1080,
                color_depth: 24,
            },
            timezone: "Asia/Kolkata".to_string(),
            languages: vec!["en-IN".to_string(), "en".to_string(), "hi".to_string()],
            hardware_concurrency: Some(8),
            platform: "Linux x86_64".to_string(),
            config: HashMap::new(),
            functions: HashMap::new(),
            blocked: vec![],
        }
    }
}

impl BrowserSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_config(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(name.into(), value.into());
        self
    }

    pub fn with_global(mut self, name: impl Into<String>) -> Self {
        self.globals.push(name.into());
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.functions.insert(name.into(), source.into());
        self
    }

    /// Make a capability fail when queried.
    pub fn blocking(mut self, capability: impl Into<String>) -> Self {
        self.blocked.push(capability.into());
        self
    }

    fn check(&self, capability: &'static str) -> Result<()> {
        if self.blocked.iter().any(|b| b == capability) {
            return Err(Error::capability(capability, "blocked by host"));
        }
        Ok(())
    }
}

impl HostEnvironment for BrowserSnapshot {
    fn display(&self) -> Option<&dyn DisplaySurface> {
        Some(self)
    }

    fn config_value(&self, name: &str) -> Option<String> {
        self.config.get(name).cloned()
    }

    fn function_source(&self, name: &str) -> Result<String> {
        self.check("functions")?;
        Ok(self
            .functions
            .get(name)
            .cloned()
            .unwrap_or_else(|| native_source(name)))
    }
}

impl DisplaySurface for BrowserSnapshot {
    fn hostname(&self) -> Result<String> {
        self.check("location")?;
        Ok(self.hostname.clone())
    }

    fn window_metrics(&self) -> Result<WindowMetrics> {
        self.check("window")?;
        Ok(self.window)
    }

    fn user_agent(&self) -> Result<String> {
        self.check("navigator")?;
        Ok(self.user_agent.clone())
    }

    fn webdriver(&self) -> Result<bool> {
        self.check("navigator")?;
        Ok(self.webdriver)
    }

    fn has_global(&self, name: &str) -> Result<bool> {
        self.check("globals")?;
        Ok(self.globals.iter().any(|g| g == name))
    }

    fn canvas_data_url(&self) -> Result<Option<String>> {
        self.check("canvas")?;
        Ok(self.canvas_data_url.clone())
    }

    fn webgl_renderer(&self) -> Result<WebGlRenderer> {
        self.check("webgl")?;
        Ok(self.webgl.clone())
    }

    fn screen(&self) -> Result<ScreenInfo> {
        self.check("screen")?;
        Ok(self.screen)
    }

    fn timezone(&self) -> Result<String> {
        self.check("intl")?;
        Ok(self.timezone.clone())
    }

    fn languages(&self) -> Result<Vec<String>> {
        self.check("navigator")?;
        Ok(self.languages.clone())
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        self.hardware_concurrency
    }

    fn platform(&self) -> Result<String> {
        self.check("navigator")?;
        Ok(self.platform.clone())
    }
}

/// Hooks that do nothing, for hosts where environment-wide mutation is
/// unavailable or unwanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl RuntimeHooks for NoopHooks {
    fn suppress_context_menu(&self) -> Result<()> {
        Ok(())
    }

    fn suppress_shortcuts(&self, _shortcuts: &[Shortcut]) -> Result<()> {
        Ok(())
    }

    fn debugger_pause(&self) {}

    fn freeze(&self, _object: &str) -> Result<()> {
        Ok(())
    }

    fn replace_stack_traces(&self, _frame: &str) -> Result<()> {
        Ok(())
    }
}
