// src/cli/vote.rs - One-shot vote and lookup commands

use crate::bot::{ChatEvent, KarmaBot};

/// Votes only count in channels, so reject anything else up front.
pub fn validate_channel(channel: &str) -> anyhow::Result<()> {
    if channel.starts_with('#') || channel.starts_with('&') {
        Ok(())
    } else {
        anyhow::bail!("'{channel}' is not a channel name (expected a leading '#' or '&')")
    }
}

/// Push one chat line through the bot and print whatever it would say.
pub async fn run_vote(
    bot: &KarmaBot,
    actor: &str,
    channel: &str,
    ambient: bool,
    line: &[String],
) -> anyhow::Result<()> {
    validate_channel(channel)?;
    let event = ChatEvent {
        channel: Some(channel.to_string()),
        nick: actor.to_string(),
        text: line.join(" "),
        addressed: !ambient,
    };

    let replies = bot.handle_event(&event).await;
    if replies.is_empty() {
        tracing::debug!("No reply for {:?}", event.text);
    }
    for reply in replies {
        println!("{reply}");
    }
    Ok(())
}

pub async fn run_karma(bot: &KarmaBot, name: &str) -> anyhow::Result<()> {
    let directory = bot.directory().snapshot();
    let report = bot.protocol().lookup(&directory, name).await?;
    println!("{report}");
    Ok(())
}
