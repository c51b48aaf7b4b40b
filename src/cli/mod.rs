// src/cli/mod.rs - CLI definition (clap derive)

pub mod listen;
pub mod migrate;
pub mod vote;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "karmabot", about = "Per-release karma ledger for chat channels", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply the votes in one chat line
    Vote {
        /// Chat nick of the sender
        #[arg(long)]
        actor: String,
        /// Channel the line was said in
        #[arg(long, default_value = "#fedora")]
        channel: String,
        /// Treat the line as channel chatter rather than addressed to the bot
        #[arg(long)]
        ambient: bool,
        /// The chat line, e.g. `dummy++`
        #[arg(required = true, trailing_var_arg = true)]
        line: Vec<String>,
    },
    /// Show karma for an account
    Karma {
        /// Account name or chat nick
        name: String,
    },
    /// Read chat events from stdin and print replies
    Listen,
    /// Run ledger migrations or show their status
    Migrate {
        /// Only show applied migrations
        #[arg(long)]
        status: bool,
    },
}
