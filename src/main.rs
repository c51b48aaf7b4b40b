// src/main.rs - karmabot entry point

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use karmabot::bot::KarmaBot;
use karmabot::cli::{self, Cli, Commands};
use karmabot::infra::config::Config;
use karmabot::infra::{logger, paths};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Falls back to defaults if no config.toml
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    if let Commands::Migrate { status } = cli.command {
        return cli::migrate::run_migrate(&config, status).await;
    }

    paths::ensure_dirs().await?;
    let bot = KarmaBot::from_config(&config).await?;
    match cli.command {
        Commands::Vote {
            actor,
            channel,
            ambient,
            line,
        } => cli::vote::run_vote(&bot, &actor, &channel, ambient, &line).await,
        Commands::Karma { name } => cli::vote::run_karma(&bot, &name).await,
        Commands::Listen => {
            let interval = Duration::from_secs(config.directory.refresh_interval_secs);
            cli::listen::run_listen(Arc::new(bot), interval).await
        }
        Commands::Migrate { .. } => Ok(()),
    }
}
