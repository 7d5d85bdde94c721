//! # SkillMint CLI
//!
//! Command-line front end for SkillMint progress tracking.
//!
//! Each run signs in the given user, loads their stored progress, applies one
//! command, prints the resulting notifications and writes progress back
//! before exiting.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod commands;
mod config;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use skillmint_common::User;
use skillmint_progress::{Catalog, FileStore, OfflineContentService, ProgressSession, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{execute, Command, ToastPrinter};
use crate::config::CliConfig;

#[derive(Debug, Parser)]
#[command(name = "skillmint")]
#[command(about = "Learn skills, earn tokens, level up")]
#[command(version)]
struct Cli {
    /// Display name to sign in as
    #[arg(short, long, global = true, default_value = "guest")]
    user: String,

    /// Path to the config file (defaults to skillmint.toml in the config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean.
    let directive = if cli.verbose {
        "skillmint=debug"
    } else {
        "skillmint=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)))
        .init();

    info!("SkillMint {}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => CliConfig::load_from(path),
        None => CliConfig::load(),
    };

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load_from(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => Catalog::builtin().context("Built-in catalog is invalid")?,
    };

    if !config.offline_content {
        warn!("No remote content service is available, using offline content");
    }
    let service = OfflineContentService::new();

    let store = Arc::new(FileStore::new(&config.data_dir));
    let mut session = ProgressSession::new(catalog, store, Box::new(SystemClock))?;

    let user = User::from_display_name(&cli.user)?;
    session.start(Some(user))?;

    let mut toasts = ToastPrinter::new(config.toast_lifetime());
    let mut out = io::stdout().lock();
    execute(&mut session, &service, cli.command, &mut toasts, &mut out)?;

    session.flush().context("Failed to save progress")?;
    info!("SkillMint done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_complete_with_answer() {
        let cli = Cli::try_parse_from([
            "skillmint",
            "--user",
            "Ada",
            "complete",
            "gd-2",
            "--answer",
            "To create visual balance",
        ])
        .expect("valid arguments");

        assert_eq!(cli.user, "Ada");
        assert_eq!(
            cli.command,
            Command::Complete {
                challenge: "gd-2".to_string(),
                answer: Some("To create visual balance".to_string()),
                submission: None,
            }
        );
    }

    #[test]
    fn test_answer_and_submission_conflict() {
        let result = Cli::try_parse_from([
            "skillmint",
            "complete",
            "dm-1",
            "--answer",
            "a",
            "--submission",
            "b",
        ]);
        assert!(result.is_err());
    }
}
