//! Ruhi protection CLI entrypoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod handlers;

use commands::{Commands, ConfigCommands};

#[derive(Parser)]
#[command(name = "ruhi")]
#[command(author, version, about = "Ruhi protection tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::GenerateLicense { days, app_id } => handlers::generate_license(days, app_id)?,
        Commands::Protect { root } => handlers::protect(&root)?,
        Commands::Setup { root } => handlers::setup(&root)?,
        Commands::Verify { root } => handlers::verify(&root),
        Commands::Check { snapshot, strict } => handlers::check(snapshot.as_deref(), strict).await?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config()?,
        },
    }

    Ok(())
}
