//! Corte CLI entry point.

use anyhow::Result;
use clap::Parser;
use corte::cli::{commands, log_directive, Cli, Commands};
use corte::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            log_directive(cli.verbose, &settings.general.log_level)
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Run { url, api_key, overrides } => {
            overrides.apply(&mut settings);
            commands::run_pipeline(url, api_key.as_deref(), settings).await?;
        }

        Commands::Clips { session_dir, clip_encoding } => {
            if let Some(encoding) = clip_encoding {
                settings.clips.encoding = *encoding;
            }
            commands::run_clips(session_dir, &settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, config_path)?;
        }
    }

    Ok(())
}
