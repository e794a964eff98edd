//! CLI command definitions.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a license key
    GenerateLicense {
        /// Days the license stays valid
        #[arg(default_value_t = 365)]
        days: i64,

        /// Application id to bind the license to (defaults to the configured one)
        #[arg(long)]
        app_id: Option<String>,
    },

    /// Hash critical files and write the build constants
    Protect {
        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Provision protection for a project
    Setup {
        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Check that protection is installed correctly
    Verify {
        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Run the full guard against a browser snapshot or this host
    Check {
        /// Recorded browser snapshot (JSON)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Deny rendering when validation or integrity fails
        #[arg(long)]
        strict: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}
