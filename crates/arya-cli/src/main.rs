use std::io;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arya_cli::commands::{observe, reset, rules, stats, util};
use arya_cli::{Cli, Commands, Config, RulesAction};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    // --verbose wins over RUST_LOG, which wins over the configured level
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()))
    };
    // Hooks capture stdout, so logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
    tracing::debug!(?config, "loaded configuration");

    let now = Utc::now();

    match &cli.command {
        Some(Commands::Observe { focus, at }) => {
            observe::focus(&config, focus, util::resolve_at(at.as_deref(), now)?)?;
        }
        Some(Commands::Lock { at }) => {
            observe::lock(&config, util::resolve_at(at.as_deref(), now)?)?;
        }
        Some(Commands::Unlock { focus, at }) => {
            observe::unlock(&config, focus, util::resolve_at(at.as_deref(), now)?)?;
        }
        Some(Commands::Stats { json, at }) => {
            let at = util::resolve_at(at.as_deref(), now)?;
            stats::run(&mut io::stdout().lock(), &config, *json, at)?;
        }
        Some(Commands::Reset { focus, at }) => {
            let at = util::resolve_at(at.as_deref(), now)?;
            reset::run(&mut io::stdout().lock(), &config, focus, at)?;
        }
        Some(Commands::Rules(action)) => match action {
            RulesAction::Check { file } => {
                let path = file.as_deref().unwrap_or(&config.rules_path);
                rules::check(&mut io::stdout().lock(), path)?;
            }
            RulesAction::Recompute => {
                rules::recompute(&mut io::stdout().lock(), &config, now)?;
            }
        },
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
