// src/bot/mod.rs - Chat event dispatch
//
// Adapter between the chat transport and the karma protocol. Every event
// resolves against one directory snapshot taken when the event arrives.

pub mod command;
pub mod event;
pub mod notify;

pub use command::{parse_command, BotCommand, KARMA_USAGE};
pub use event::ChatEvent;
pub use notify::{JsonLinesNotifier, KarmaNotice, VoteNotifier};

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::identity::{
    refresh_directory, spawn_directory_refresh, Directory, DirectorySource,
    FileDirectorySource, SharedDirectory,
};
use crate::infra::config::Config;
use crate::karma::{KarmaProtocol, Outcome};
use crate::ledger::LedgerStore;
use crate::release;

pub const REFRESH_STARTED: &str = "Downloading caches.  This could take a while...";
pub const REFRESH_DONE: &str = "The operation succeeded.";
pub const LOOKUP_UNAVAILABLE: &str = "Karma is unavailable right now.";

pub struct KarmaBot {
    protocol: KarmaProtocol,
    directory: SharedDirectory,
    source: Option<Arc<dyn DirectorySource>>,
    notifier: Option<Arc<dyn VoteNotifier>>,
    unaddressed: bool,
    nick: String,
    prefix_chars: String,
}

impl KarmaBot {
    pub fn new(protocol: KarmaProtocol, directory: SharedDirectory, config: &Config) -> Self {
        Self {
            protocol,
            directory,
            source: None,
            notifier: None,
            unaddressed: config.karma.unaddressed,
            nick: config.bot.nick.clone(),
            prefix_chars: config.bot.prefix_chars.clone(),
        }
    }

    /// Attach the source used by `refresh` and the periodic refresher.
    pub fn with_source(mut self, source: Arc<dyn DirectorySource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Publish every applied vote to `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn VoteNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wire up ledger, release provider and directory from `config`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let releases = release::from_config(&config.release);
        let current = releases
            .current_release()
            .await
            .context("Cannot determine the current release")?;

        let db_path = config.karma.db_path();
        let ledger = LedgerStore::open(&db_path, &current)
            .with_context(|| format!("Cannot open ledger at {}", db_path.display()))?;
        tracing::info!("Ledger {} ready (release {})", db_path.display(), current);

        let protocol = KarmaProtocol::new(Arc::new(ledger), releases, &config.karma);
        let source: Arc<dyn DirectorySource> =
            Arc::new(FileDirectorySource::new(config.directory.path()));
        let mut bot = Self::new(protocol, SharedDirectory::default(), config).with_source(source);

        if let Some(ref path) = config.karma.notify_path {
            let notifier = JsonLinesNotifier::open(Path::new(path))
                .with_context(|| format!("Cannot open karma notice file {path}"))?;
            bot = bot.with_notifier(Arc::new(notifier));
        }

        if config.directory.refresh_on_startup {
            if let Some(ref source) = bot.source {
                if let Err(e) = refresh_directory(&bot.directory, source.as_ref()).await {
                    tracing::warn!("Starting with an empty directory: {}", e);
                }
            }
        }
        Ok(bot)
    }

    pub fn protocol(&self) -> &KarmaProtocol {
        &self.protocol
    }

    pub fn directory(&self) -> &SharedDirectory {
        &self.directory
    }

    /// Build an event for a raw chat line using our nick and prefix chars.
    pub fn event_from_raw(&self, nick: &str, channel: Option<&str>, text: &str) -> ChatEvent {
        ChatEvent::from_raw(nick, channel, text, &self.nick, &self.prefix_chars)
    }

    /// Handle one chat line; returns the replies to send, in order.
    pub async fn handle_event(&self, event: &ChatEvent) -> Vec<String> {
        let directory = self.directory.snapshot();

        if event.addressed {
            match parse_command(&event.text) {
                BotCommand::Karma(Some(name)) => {
                    return vec![self.lookup_reply(&directory, &name).await]
                }
                BotCommand::Karma(None) => return vec![KARMA_USAGE.to_string()],
                BotCommand::Refresh => return self.refresh().await,
                BotCommand::Votes => {}
            }
        } else if !self.unaddressed {
            return Vec::new();
        }

        if !event.in_channel() {
            if let Some(ref channel) = event.channel {
                tracing::debug!(
                    "Ignoring votes from {} in {:?}: not a channel name",
                    event.nick,
                    channel
                );
            }
            return Vec::new();
        }
        self.apply_votes(&directory, event).await
    }

    async fn apply_votes(&self, directory: &Directory, event: &ChatEvent) -> Vec<String> {
        let mut replies = Vec::new();
        for token in self.protocol.vote_words(&event.text) {
            let outcome = self
                .protocol
                .apply_chat_vote(directory, &event.nick, token, &event.text, event.addressed)
                .await;
            if let (Outcome::Applied(vote), Some(notifier)) = (&outcome, &self.notifier) {
                notifier.vote_applied(&KarmaNotice::new(
                    vote,
                    event.channel.as_deref(),
                    &event.text,
                ));
            }
            if let Some(reply) = outcome.reply(self.protocol.url()) {
                replies.push(reply);
            }
        }
        replies
    }

    async fn lookup_reply(&self, directory: &Directory, name: &str) -> String {
        match self.protocol.lookup(directory, name).await {
            Ok(report) => report.to_string(),
            Err(e) => {
                tracing::error!("Karma lookup for {} failed: {}", name, e);
                LOOKUP_UNAVAILABLE.to_string()
            }
        }
    }

    /// The `refresh` command.
    pub async fn refresh(&self) -> Vec<String> {
        let mut replies = vec![REFRESH_STARTED.to_string()];
        let Some(ref source) = self.source else {
            replies.push("Refresh failed: no directory source configured".to_string());
            return replies;
        };
        match refresh_directory(&self.directory, source.as_ref()).await {
            Ok(_) => replies.push(REFRESH_DONE.to_string()),
            Err(e) => {
                tracing::warn!("Directory refresh failed: {}", e);
                replies.push(format!("Refresh failed: {e}"));
            }
        }
        replies
    }

    /// Start the periodic directory refresher, if a source is attached.
    pub fn spawn_refresh(&self, interval: Duration) -> Option<JoinHandle<()>> {
        self.source
            .clone()
            .map(|source| spawn_directory_refresh(self.directory.clone(), source, interval))
    }
}
