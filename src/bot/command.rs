// src/bot/command.rs - Commands understood in addressed lines

/// What an addressed line asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// `karma <name>`; `None` when the name is missing.
    Karma(Option<String>),
    /// `refresh`: reload the account directory.
    Refresh,
    /// Anything else is scanned for vote tokens.
    Votes,
}

pub const KARMA_USAGE: &str =
    "(karma <username>) -- Return the total karma for a FAS user this release cycle.";

/// Parse the text of an addressed line (address prefix already removed).
pub fn parse_command(text: &str) -> BotCommand {
    let trimmed = text.trim();
    let mut words = trimmed.split_whitespace();
    let Some(first) = words.next() else {
        return BotCommand::Votes;
    };

    let lower = first.to_lowercase();
    if lower == "refresh" && words.next().is_none() {
        return BotCommand::Refresh;
    }
    if lower == "karma" {
        // Only the first argument counts, like other single-arg commands.
        return BotCommand::Karma(words.next().map(str::to_string));
    }

    BotCommand::Votes
}
