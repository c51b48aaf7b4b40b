// src/bot/event.rs - Incoming chat events

use serde::{Deserialize, Serialize};

/// One line of chat as delivered by the host framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// `None` for private messages.
    #[serde(default)]
    pub channel: Option<String>,
    pub nick: String,
    /// Message text with any bot address prefix already removed.
    pub text: String,
    /// Whether the line was directed at the bot.
    #[serde(default)]
    pub addressed: bool,
}

impl ChatEvent {
    /// Build an event from a raw line, detecting `<bot_nick>: ...`,
    /// `<bot_nick>, ...` and `<prefix>command` forms of addressing.
    pub fn from_raw(
        nick: &str,
        channel: Option<&str>,
        text: &str,
        bot_nick: &str,
        prefix_chars: &str,
    ) -> Self {
        let text = text.trim();
        let (addressed, body) = match strip_address(text, bot_nick, prefix_chars) {
            Some(rest) => (true, rest),
            // Private messages are always meant for us.
            None => (channel.is_none(), text),
        };
        Self {
            channel: channel.map(str::to_string),
            nick: nick.to_string(),
            text: body.to_string(),
            addressed,
        }
    }

    pub fn in_channel(&self) -> bool {
        self.channel
            .as_deref()
            .is_some_and(|c| c.starts_with('#') || c.starts_with('&'))
    }

    /// Where replies go: the channel, or the sender for private messages.
    pub fn reply_target(&self) -> &str {
        self.channel.as_deref().unwrap_or(&self.nick)
    }
}

fn strip_address<'a>(text: &'a str, bot_nick: &str, prefix_chars: &str) -> Option<&'a str> {
    if let Some(first) = text.chars().next() {
        if prefix_chars.contains(first) {
            let rest = text[first.len_utf8()..].trim_start();
            return (!rest.is_empty()).then_some(rest);
        }
    }

    if bot_nick.is_empty() || text.len() <= bot_nick.len() {
        return None;
    }
    let (head, tail) = text.split_at_checked(bot_nick.len())?;
    if !head.eq_ignore_ascii_case(bot_nick) {
        return None;
    }
    let rest = tail.strip_prefix(':').or_else(|| tail.strip_prefix(','))?;
    Some(rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> ChatEvent {
        ChatEvent::from_raw("test", Some("#fedora"), text, "zodbot", ".")
    }

    #[test]
    fn test_unaddressed_line() {
        let e = raw("dummy++ thanks");
        assert!(!e.addressed);
        assert_eq!(e.text, "dummy++ thanks");
        assert!(e.in_channel());
    }

    #[test]
    fn test_nick_prefix_addressing() {
        let e = raw("zodbot: dummy++");
        assert!(e.addressed);
        assert_eq!(e.text, "dummy++");

        let e = raw("ZodBot, karma dummy");
        assert!(e.addressed);
        assert_eq!(e.text, "karma dummy");
    }

    #[test]
    fn test_prefix_char_addressing() {
        let e = raw(".karma dummy");
        assert!(e.addressed);
        assert_eq!(e.text, "karma dummy");
        assert!(!raw(".").addressed);
    }

    #[test]
    fn test_nick_without_separator_not_addressed() {
        let e = raw("zodbots are great");
        assert!(!e.addressed);
    }

    #[test]
    fn test_private_message_is_addressed() {
        let e = ChatEvent::from_raw("test", None, "karma dummy", "zodbot", ".");
        assert!(e.addressed);
        assert!(!e.in_channel());
        assert_eq!(e.reply_target(), "test");
    }

    #[test]
    fn test_json_defaults() {
        let e: ChatEvent = serde_json::from_str(r#"{"nick": "test", "text": "dummy++"}"#).unwrap();
        assert!(!e.addressed);
        assert!(e.channel.is_none());
    }
}
