// src/bot/notify.rs - Notifications for applied votes
//
// Every vote that changes the ledger is handed to the configured
// `VoteNotifier` after the reply is built. Notifiers must not fail the vote.

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::karma::AppliedVote;
use crate::ledger::ReleaseId;

/// Message published for one applied vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KarmaNotice {
    pub agent: String,
    pub recipient: String,
    /// Recipient's total for the current release after this vote.
    pub total: i64,
    /// `1` or `-1`.
    pub vote: i64,
    pub release: ReleaseId,
    pub channel: Option<String>,
    pub line: String,
}

impl KarmaNotice {
    pub fn new(vote: &AppliedVote, channel: Option<&str>, line: &str) -> Self {
        Self {
            agent: vote.voter.clone(),
            recipient: vote.recipient.clone(),
            total: vote.total_this_release,
            vote: vote.direction.value(),
            release: vote.release.clone(),
            channel: channel.map(str::to_string),
            line: line.to_string(),
        }
    }
}

pub trait VoteNotifier: Send + Sync {
    fn vote_applied(&self, notice: &KarmaNotice);
}

/// Appends each notice as one JSON line to a file, for a message-bus
/// bridge or an audit trail to pick up.
pub struct JsonLinesNotifier {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesNotifier {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }
}

impl VoteNotifier for JsonLinesNotifier {
    fn vote_applied(&self, notice: &KarmaNotice) {
        let line = match serde_json::to_string(notice) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Cannot encode karma notice: {}", e);
                return;
            }
        };
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!("Cannot write karma notice to {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Direction;

    fn applied() -> AppliedVote {
        AppliedVote {
            voter: "test".into(),
            recipient: "dummy".into(),
            release: ReleaseId::new("f40"),
            direction: Direction::Down,
            total_this_release: -1,
            total_all_time: 2,
        }
    }

    #[test]
    fn test_notice_from_vote() {
        let n = KarmaNotice::new(&applied(), Some("#fedora"), "dummy--");
        assert_eq!(n.agent, "test");
        assert_eq!(n.vote, -1);
        assert_eq!(n.total, -1);
        assert_eq!(n.channel.as_deref(), Some("#fedora"));
    }

    #[test]
    fn test_json_lines_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notices").join("karma.jsonl");
        let notifier = JsonLinesNotifier::open(&path).unwrap();

        notifier.vote_applied(&KarmaNotice::new(&applied(), Some("#fedora"), "dummy--"));
        notifier.vote_applied(&KarmaNotice::new(&applied(), None, "dummy--"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["recipient"], "dummy");
        assert_eq!(lines[0]["release"], "f40");
        assert_eq!(lines[0]["channel"], "#fedora");
        assert!(lines[1]["channel"].is_null());
    }
}
