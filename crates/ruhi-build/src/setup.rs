//! First-time provisioning of a project.
//!
//! Every step is safe to repeat: existing keys, ignore blocks and templates
//! are left alone.

use crate::protector::{BUILD_CONSTANTS_FILE, render_constants_module};
use chrono::Duration;
use rand::RngCore;
use ruhi_core::hash::to_base36;
use ruhi_core::ports::Clock;
use ruhi_core::{Result, SystemClock};
use ruhi_licensing::LicenseIssuer;
use ruhi_licensing::keygen::DEFAULT_VALIDITY_DAYS;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub const ENV_LOCAL_FILE: &str = ".env.local";
pub const GITIGNORE_FILE: &str = ".gitignore";

pub const APP_ID_KEY: &str = "RUHI_APP_ID";
pub const LICENSE_KEY: &str = "RUHI_LICENSE_KEY";

/// Marker line of the ignore block; its presence means the block exists.
pub const GITIGNORE_MARKER: &str = "# Protection System";

const GITIGNORE_BLOCK: &str = "\n# Protection System\n\
.env.protection\n\
protection/.env.local\n\
protection/build-constants.ts\n\
protection/*.log\n";

const APP_ID_PLACEHOLDER: &str = "ruhi-your-unique-id";

const ENV_TEMPLATE: &str = "# Ruhi configuration\n\
# Firebase\n\
NEXT_PUBLIC_FIREBASE_API_KEY=\n\
NEXT_PUBLIC_FIREBASE_AUTH_DOMAIN=\n\
NEXT_PUBLIC_FIREBASE_PROJECT_ID=\n\
\n\
# Protection System\n\
RUHI_APP_ID=ruhi-your-unique-id\n\
RUHI_DOMAIN=\n\
RUHI_MODE=development\n";

/// What a setup run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub app_id: String,
    /// `.env.local` did not exist and was created from the template.
    pub env_created: bool,
    pub license_key: String,
    /// A license was written to `.env.local` (none was present).
    pub license_written: bool,
    pub gitignore_updated: bool,
    pub template_created: bool,
}

/// Provisions the protection files for a project root.
pub struct ProtectionSetup {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl ProtectionSetup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn run(&self) -> Result<SetupReport> {
        info!(root = %self.root.display(), "Setting up protection system");

        let generated = self.generate_app_id();
        let (app_id, env_created) = self.setup_env_file(&generated)?;
        debug!(app_id = %app_id, env_created, "Environment file configured");

        let (license_key, license_written) = self.generate_initial_license(&app_id)?;
        let gitignore_updated = self.update_gitignore()?;
        let template_created = self.create_constants_template()?;

        info!(app_id = %app_id, "Protection setup complete");
        Ok(SetupReport {
            app_id,
            env_created,
            license_key,
            license_written,
            gitignore_updated,
            template_created,
        })
    }

    /// `ruhi-<base36 epoch ms>-<8 random hex>`.
    pub fn generate_app_id(&self) -> String {
        let mut random = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut random);
        let millis = u64::try_from(self.clock.now_millis()).unwrap_or_default();
        format!("ruhi-{}-{}", to_base36(millis), hex::encode(random))
    }

    /// Create `.env.local` or add the app id to it. Returns the app id in
    /// effect and whether the file was created.
    fn setup_env_file(&self, app_id: &str) -> Result<(String, bool)> {
        let path = self.root.join(ENV_LOCAL_FILE);

        if !path.exists() {
            fs::write(&path, ENV_TEMPLATE.replace(APP_ID_PLACEHOLDER, app_id))?;
            return Ok((app_id.to_string(), true));
        }

        let mut content = fs::read_to_string(&path)?;
        if let Some(existing) = env_value(&content, APP_ID_KEY) {
            debug!(app_id = %existing, "Keeping existing application id");
            return Ok((existing.to_string(), false));
        }

        append_line(&mut content, &format!("\n# Protection System\n{}={}", APP_ID_KEY, app_id));
        fs::write(&path, content)?;
        Ok((app_id.to_string(), false))
    }

    /// Issue a one-year license for `app_id` unless one is already present.
    fn generate_initial_license(&self, app_id: &str) -> Result<(String, bool)> {
        let path = self.root.join(ENV_LOCAL_FILE);
        let mut content = fs::read_to_string(&path)?;

        if let Some(existing) = env_value(&content, LICENSE_KEY) {
            return Ok((existing.to_string(), false));
        }

        let expiration = self.clock.now() + Duration::days(DEFAULT_VALIDITY_DAYS);
        let license = LicenseIssuer::new(app_id, Arc::clone(&self.clock))
            .generate_license_key(Some(expiration))?;

        append_line(&mut content, &format!("{}={}", LICENSE_KEY, license));
        fs::write(&path, content)?;
        Ok((license, true))
    }

    fn update_gitignore(&self) -> Result<bool> {
        let path = self.root.join(GITIGNORE_FILE);

        let mut content = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        if content.contains(GITIGNORE_MARKER) {
            return Ok(false);
        }

        content.push_str(GITIGNORE_BLOCK);
        fs::write(&path, content)?;
        Ok(true)
    }

    fn create_constants_template(&self) -> Result<bool> {
        let path = self.root.join(BUILD_CONSTANTS_FILE);
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, render_constants_module(0, "", "0.1.0", "development"))?;
        Ok(true)
    }
}

/// Value of `key` in dotenv-formatted `content`, ignoring comments.
fn env_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(name, _)| name.trim() == key)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn append_line(content: &mut String, line: &str) {
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(line);
    content.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value() {
        let content = "# RUHI_APP_ID=commented\nRUHI_APP_ID = ruhi-abc\nRUHI_LICENSE_KEY=\n";
        assert_eq!(env_value(content, APP_ID_KEY), Some("ruhi-abc"));
        assert_eq!(env_value(content, LICENSE_KEY), None);
        assert_eq!(env_value(content, "MISSING"), None);
    }

    #[test]
    fn test_append_line_adds_separator() {
        let mut content = "A=1".to_string();
        append_line(&mut content, "B=2");
        assert_eq!(content, "A=1\nB=2\n");

        let mut empty = String::new();
        append_line(&mut empty, "B=2");
        assert_eq!(empty, "B=2\n");
    }
}
