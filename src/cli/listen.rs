// src/cli/listen.rs - Line-oriented chat bridge on stdin/stdout
//
// Input, one event per line: a JSON `ChatEvent`, or raw
// `nick<TAB>channel<TAB>text` (channel `-` or empty for a private message).
// Output: `target<TAB>reply` per reply.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};

use crate::bot::{ChatEvent, KarmaBot};

pub async fn run_listen(bot: Arc<KarmaBot>, refresh_interval: Duration) -> anyhow::Result<()> {
    let refresher = bot.spawn_refresh(refresh_interval);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    tracing::info!("Listening for chat events on stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(event) = parse_input_line(&bot, &line) else {
                    continue;
                };
                let bot = bot.clone();
                tasks.spawn(async move {
                    for reply in bot.handle_event(&event).await {
                        println!("{}\t{}", event.reply_target(), reply);
                    }
                });
            }
            Some(done) = tasks.join_next(), if !tasks.is_empty() => log_join(done),
        }
    }

    while let Some(done) = tasks.join_next().await {
        log_join(done);
    }
    if let Some(handle) = refresher {
        handle.abort();
    }
    Ok(())
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::error!("Event handler task failed: {}", e);
    }
}

/// Decode one input line. Blank or malformed lines yield `None`.
pub fn parse_input_line(bot: &KarmaBot, line: &str) -> Option<ChatEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    if line.trim_start().starts_with('{') {
        return match serde_json::from_str::<ChatEvent>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Skipping malformed event: {}", e);
                None
            }
        };
    }

    let mut fields = line.splitn(3, '\t');
    let (Some(nick), Some(channel), Some(text)) = (fields.next(), fields.next(), fields.next())
    else {
        tracing::warn!("Skipping line without nick/channel/text fields");
        return None;
    };
    let channel = match channel.trim() {
        "" | "-" => None,
        c => Some(c),
    };
    Some(bot.event_from_raw(nick.trim(), channel, text))
}
