//! Browser fingerprinting.
//!
//! The fingerprint is the rolling hash of seven `|`-joined components.
//! It is stored on first run and later compared by normalized edit
//! distance, never by equality.

use async_trait::async_trait;
use ruhi_core::ports::{DisplaySurface, HostEnvironment, KeyValueStore, Validator, WebGlRenderer};
use ruhi_core::{ProtectionConfig, rolling_hash};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Similarity above which two fingerprints are considered the same device.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Trailing characters of the canvas data URL used as its signature.
const CANVAS_SIGNATURE_LEN: usize = 50;

/// Signals that make up a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintComponents {
    pub canvas: String,
    pub webgl: String,
    pub screen: String,
    pub timezone: String,
    pub languages: String,
    pub cores: String,
    pub platform: String,
}

impl FingerprintComponents {
    /// Collect every component, degrading failed capabilities to sentinels.
    pub fn collect(display: &dyn DisplaySurface) -> Self {
        Self {
            canvas: canvas_signature(display),
            webgl: webgl_signature(display),
            screen: display
                .screen()
                .map(|s| format!("{}x{}x{}", s.width, s.height, s.color_depth))
                .unwrap_or_else(|_| "screen-error".to_string()),
            timezone: display
                .timezone()
                .unwrap_or_else(|_| "timezone-error".to_string()),
            languages: display
                .languages()
                .map(|l| l.join(","))
                .unwrap_or_else(|_| "languages-error".to_string()),
            cores: display
                .hardware_concurrency()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            platform: display
                .platform()
                .unwrap_or_else(|_| "platform-error".to_string()),
        }
    }

    pub fn composite(&self) -> String {
        [
            self.canvas.as_str(),
            self.webgl.as_str(),
            self.screen.as_str(),
            self.timezone.as_str(),
            self.languages.as_str(),
            self.cores.as_str(),
            self.platform.as_str(),
        ]
        .join("|")
    }

    pub fn fingerprint(&self) -> String {
        rolling_hash(&self.composite())
    }
}

fn canvas_signature(display: &dyn DisplaySurface) -> String {
    match display.canvas_data_url() {
        Ok(Some(url)) => {
            let skip = url.chars().count().saturating_sub(CANVAS_SIGNATURE_LEN);
            url.chars().skip(skip).collect()
        }
        Ok(None) => "no-canvas".to_string(),
        Err(e) => {
            debug!(error = %e, "Canvas fingerprint unavailable");
            "canvas-error".to_string()
        }
    }
}

fn webgl_signature(display: &dyn DisplaySurface) -> String {
    match display.webgl_renderer() {
        Ok(WebGlRenderer::Renderer(renderer)) => rolling_hash(&renderer),
        Ok(WebGlRenderer::NoDebugInfo) => "no-debug-info".to_string(),
        Ok(WebGlRenderer::Unavailable) => "no-webgl".to_string(),
        Err(e) => {
            debug!(error = %e, "WebGL fingerprint unavailable");
            "webgl-error".to_string()
        }
    }
}

/// Normalized edit-distance similarity in `[0, 1]`.
///
/// `(len(longer) - lev(longer, shorter)) / len(longer)`, and `1.0` when both
/// strings are empty. Lengths count characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    (longest - distance) as f64 / longest as f64
}

/// Outcome of a fingerprint inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintVerdict {
    /// Check disabled or no display surface.
    Skipped,
    /// Nothing stored yet; the current fingerprint was stored.
    FirstRun { fingerprint: String },
    Match {
        fingerprint: String,
        stored: String,
        similarity: f64,
    },
    Mismatch {
        fingerprint: String,
        stored: String,
        similarity: f64,
    },
}

/// Generates, persists and compares fingerprints.
pub struct FingerprintValidator {
    config: Arc<ProtectionConfig>,
    host: Arc<dyn HostEnvironment>,
    store: Arc<dyn KeyValueStore>,
}

impl FingerprintValidator {
    pub fn new(
        config: Arc<ProtectionConfig>,
        host: Arc<dyn HostEnvironment>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            config,
            host,
            store,
        }
    }

    /// Current fingerprint, or `None` without a display surface.
    pub async fn generate(&self) -> Option<String> {
        let display = self.host.display()?;
        Some(FingerprintComponents::collect(display).fingerprint())
    }

    pub async fn inspect(&self) -> FingerprintVerdict {
        if !self.config.enable_fingerprint_check {
            return FingerprintVerdict::Skipped;
        }
        let Some(fingerprint) = self.generate().await else {
            return FingerprintVerdict::Skipped;
        };

        let Some(stored) = self.stored_fingerprint() else {
            self.store_fingerprint(&fingerprint);
            info!(fingerprint = %fingerprint, "Stored initial fingerprint");
            return FingerprintVerdict::FirstRun { fingerprint };
        };

        let similarity = similarity(&fingerprint, &stored);
        if similarity > SIMILARITY_THRESHOLD {
            debug!(similarity, "Fingerprint matches stored value");
            FingerprintVerdict::Match {
                fingerprint,
                stored,
                similarity,
            }
        } else {
            warn!(
                similarity,
                current = %fingerprint,
                stored = %stored,
                "Fingerprint mismatch detected"
            );
            FingerprintVerdict::Mismatch {
                fingerprint,
                stored,
                similarity,
            }
        }
    }

    fn stored_fingerprint(&self) -> Option<String> {
        match self.store.get(&self.config.fingerprint_key) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Could not read stored fingerprint");
                None
            }
        }
    }

    fn store_fingerprint(&self, fingerprint: &str) {
        if let Err(e) = self.store.set(&self.config.fingerprint_key, fingerprint) {
            warn!(error = %e, "Could not store fingerprint");
        }
    }
}

#[async_trait]
impl Validator for FingerprintValidator {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    async fn validate(&self) -> bool {
        match self.inspect().await {
            FingerprintVerdict::Mismatch { .. } => !self.config.enforce_fingerprint,
            _ => true,
        }
    }
}
