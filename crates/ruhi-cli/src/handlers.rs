//! Command handlers.

use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use console::style;
use ruhi_build::{BuildProtector, ProtectionSetup, ProtectionVerifier, VerificationReport};
use ruhi_core::ports::HostEnvironment;
use ruhi_core::{FileStore, ProtectionConfig, SystemClock};
use ruhi_guard::{BrowserSnapshot, Guard, NativeHost, StrictPolicy};
use ruhi_licensing::{LicenseValidator, generate_license_key};
use std::path::Path;
use std::sync::Arc;

/// Where `ruhi check` keeps the fingerprint between runs.
const CHECK_STORE: &str = ".ruhi/store.json";

/// Generate a license key.
pub fn generate_license(days: i64, app_id: Option<String>) -> anyhow::Result<()> {
    if days <= 0 {
        bail!("License validity must be a positive number of days, got {}", days);
    }

    let app_id = match app_id {
        Some(id) => id,
        None => ProtectionConfig::load()?.app_id,
    };
    let expiration = Duration::try_days(days)
        .and_then(|validity| Utc::now().checked_add_signed(validity))
        .with_context(|| format!("License validity of {} days is out of range", days))?;

    println!("{} Generating license key", style("🔑").cyan());
    println!("  Application: {}", style(&app_id).bold());
    println!("  Valid for:   {} days", days);
    println!("  Expires:     {}", expiration.to_rfc3339());
    println!();

    let key = generate_license_key(&app_id, Some(expiration))?;

    println!("License key:");
    println!("{}", key);
    println!();
    println!("Add this to your .env.local file:");
    println!("RUHI_LICENSE_KEY={}", key);
    Ok(())
}

/// Apply build protection.
pub fn protect(root: &Path) -> anyhow::Result<()> {
    println!("{} Applying build protection...", style("🔒").cyan());

    let constants = BuildProtector::new(root)
        .protect()
        .with_context(|| format!("Build protection failed in {}", root.display()))?;

    println!("{} Created .env.protection", style("✓").green());
    println!("{} Created build constants", style("✓").green());
    println!("{} Build protection applied", style("✓").green());
    println!("  Build ID: {}", style(constants.build_id()).bold());
    Ok(())
}

/// Provision protection for a project.
pub fn setup(root: &Path) -> anyhow::Result<()> {
    println!("{}\n", style("Ruhi Protection System Setup").bold());

    let report = ProtectionSetup::new(root)
        .run()
        .context("Setup failed")?;

    println!("{} App ID: {}", style("✓").green(), style(&report.app_id).bold());
    if report.env_created {
        println!("{} Created .env.local", style("✓").green());
    } else {
        println!("{} .env.local already exists, updated", style("!").yellow());
    }
    if report.license_written {
        println!("{} License key generated (valid for 1 year)", style("✓").green());
    } else {
        println!("{} License key already configured", style("i").blue());
    }
    if report.gitignore_updated {
        println!("{} .gitignore updated", style("✓").green());
    }
    if report.template_created {
        println!("{} Build constants template created", style("✓").green());
    }

    println!("\n{} Protection system setup complete!\n", style("✓").green());
    println!("Next steps:");
    println!("  1. Review .env.local and add your Firebase credentials");
    println!("  2. Set RUHI_DOMAIN to your production domain");
    println!("  3. Run \"ruhi protect\" to test the protection system");
    println!("  4. Add \"ruhi protect\" to the prebuild script");
    println!();
    println!("{} Keep .env.local private and never commit it", style("!").yellow());
    Ok(())
}

/// Verify a protection installation. Always succeeds.
pub fn verify(root: &Path) {
    println!("{}\n", style("Verifying Protection System").bold());

    let report = ProtectionVerifier::new(root).verify();
    print_verification(&report);
}

fn print_verification(report: &VerificationReport) {
    for check in &report.checks {
        println!("  {} {}", style("✓").green(), check);
    }

    println!("\n{}", "=".repeat(50));
    println!("VERIFICATION RESULTS");
    println!("{}\n", "=".repeat(50));

    if report.is_clean() {
        println!(
            "{} All checks passed! Protection system is properly configured.",
            style("✓").green()
        );
        return;
    }

    if !report.errors.is_empty() {
        println!("{}", style("ERRORS:").red().bold());
        for error in &report.errors {
            println!("  {} {}", style("✗").red(), error);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("{}", style("WARNINGS:").yellow().bold());
        for warning in &report.warnings {
            println!("  {} {}", style("⚠").yellow(), warning);
        }
        println!();
    }

    println!("Next steps:");
    if report.errors.is_empty() {
        println!("  1. Review warnings and update configuration as needed");
        println!("  2. Complete .env.local setup");
    } else {
        println!("  1. Fix the errors listed above");
        println!("  2. Run \"ruhi setup\" if not done yet");
        println!("  3. Run this verification again");
    }
}

/// Mount the guard once and print what it found.
pub async fn check(snapshot: Option<&Path>, strict: bool) -> anyhow::Result<()> {
    let config = ProtectionConfig::load().context("Failed to load configuration")?;

    let host: Arc<dyn HostEnvironment> = match snapshot {
        Some(path) => Arc::new(
            BrowserSnapshot::from_file(path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?,
        ),
        None => Arc::new(NativeHost),
    };

    let license = LicenseValidator::new(Arc::new(config.clone()), Arc::new(SystemClock)).inspect();

    let mut builder = Guard::builder(config, host).store(Arc::new(FileStore::new(CHECK_STORE)));
    if strict {
        builder = builder.policy(StrictPolicy);
    }
    let guard = builder.build();

    let outcome = guard.mount().await;
    guard.anti_tamper().abort_probe();

    println!("{}", style("Protection check").bold());
    println!("  Validated:           {}", mark(outcome.validated));
    println!("  Integrity:           {}", mark(outcome.integrity));
    println!(
        "  Virtual environment: {}",
        if outcome.virtual_environment {
            style("detected").yellow()
        } else {
            style("no").dim()
        }
    );
    match license {
        Ok(verdict) => println!("  License:             {}", verdict),
        Err(e) => println!("  License:             {}", style(e).red()),
    }
    println!("  Checksum:            {}", guard.manager().checksum());
    println!("  Decision:            {}", style(outcome.decision).bold());

    let report = guard.integrity().generate_integrity_report();
    if !report.is_empty() {
        println!("\nIntegrity report:");
        for line in report.lines() {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn mark(passed: bool) -> console::StyledObject<&'static str> {
    if passed {
        style("✓").green()
    } else {
        style("✗").red()
    }
}

/// Print the effective configuration with the license redacted.
pub fn show_config() -> anyhow::Result<()> {
    let config = ProtectionConfig::load().context("Failed to load configuration")?;

    println!("{}", style("Effective configuration").bold());
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
