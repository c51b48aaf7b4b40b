// src/identity/directory.rs - Account directory snapshot

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use url::Url;

/// A canonical account and the chat handles that map to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub aliases: BTreeSet<String>,
}

/// One account as delivered by the directory sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub username: String,
    /// Bare nicks or IRC URIs (`irc:/nick`, `irc://irc.libera.chat/nick`).
    #[serde(default)]
    pub ircnicks: Vec<String>,
}

/// Immutable lookup table from chat handles to accounts.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    accounts: HashMap<String, Account>,
    /// handle -> username
    aliases: HashMap<String, String>,
}

impl Directory {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = DirectoryRecord>,
    {
        let mut dir = Directory::default();
        for record in records {
            let username = record.username.trim().to_string();
            if username.is_empty() {
                continue;
            }
            let nicks: Vec<String> = record
                .ircnicks
                .iter()
                .filter_map(|raw| normalize_nick(raw))
                .collect();
            dir.insert(&username, nicks);
        }
        dir
    }

    /// Add `username` with the given handles. Later entries win alias clashes.
    pub fn insert<S: AsRef<str>>(&mut self, username: &str, aliases: impl IntoIterator<Item = S>) {
        let account = self
            .accounts
            .entry(username.to_string())
            .or_insert_with(|| Account {
                username: username.to_string(),
                aliases: BTreeSet::new(),
            });
        for alias in aliases {
            let alias = alias.as_ref().to_string();
            account.aliases.insert(alias.clone());
            self.aliases.insert(alias, username.to_string());
        }
    }

    /// Resolve a raw handle: exact username first, then exact alias.
    pub fn resolve(&self, handle: &str) -> Option<&Account> {
        if let Some(account) = self.accounts.get(handle) {
            return Some(account);
        }
        self.aliases
            .get(handle)
            .and_then(|username| self.accounts.get(username))
    }

    /// Canonical name for `handle`, or the handle itself when unknown.
    pub fn canonical_or_raw<'a>(&'a self, handle: &'a str) -> &'a str {
        self.resolve(handle)
            .map(|a| a.username.as_str())
            .unwrap_or(handle)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

/// Turn a directory nick entry into the handle used in chat.
///
/// Accepts `dummy`, `irc:/dummy` and `irc://irc.libera.chat/dummy`.
pub fn normalize_nick(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let nick = match Url::parse(raw) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)?,
        Err(_) => raw.to_string(),
    };
    if nick.is_empty() {
        None
    } else {
        Some(nick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, nicks: &[&str]) -> DirectoryRecord {
        DirectoryRecord {
            username: username.into(),
            ircnicks: nicks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_normalize_nick_formats() {
        assert_eq!(normalize_nick("dummy").as_deref(), Some("dummy"));
        assert_eq!(normalize_nick("irc:/dummy").as_deref(), Some("dummy"));
        assert_eq!(
            normalize_nick("irc://irc.libera.chat/dummy").as_deref(),
            Some("dummy")
        );
        assert_eq!(normalize_nick("  ").as_deref(), None);
        assert_eq!(normalize_nick("irc://irc.libera.chat/").as_deref(), None);
    }

    #[test]
    fn test_resolve_username_and_alias() {
        let dir = Directory::from_records(vec![
            record("dummy", &["irc:/dummy"]),
            record("puiterwijk", &["patrick"]),
        ]);
        assert_eq!(dir.resolve("dummy").unwrap().username, "dummy");
        assert_eq!(dir.resolve("patrick").unwrap().username, "puiterwijk");
        assert!(dir.resolve("Patrick").is_none());
        assert!(dir.resolve("nobody").is_none());
    }

    #[test]
    fn test_username_wins_over_alias() {
        let dir = Directory::from_records(vec![record("alice", &[]), record("bob", &["alice"])]);
        assert_eq!(dir.resolve("alice").unwrap().username, "alice");
    }

    #[test]
    fn test_blank_usernames_skipped() {
        let dir = Directory::from_records(vec![record(" ", &["ghost"]), record("test", &[])]);
        assert_eq!(dir.len(), 1);
        assert!(dir.resolve("ghost").is_none());
    }

    #[test]
    fn test_canonical_or_raw() {
        let dir = Directory::from_records(vec![record("puiterwijk", &["patrick"])]);
        assert_eq!(dir.canonical_or_raw("patrick"), "puiterwijk");
        assert_eq!(dir.canonical_or_raw("stranger"), "stranger");
    }

    #[test]
    fn test_record_deserialize_without_nicks() {
        let r: DirectoryRecord = serde_json::from_str(r#"{"username": "test"}"#).unwrap();
        assert!(r.ircnicks.is_empty());
    }
}
