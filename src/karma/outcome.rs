// src/karma/outcome.rs - Results of karma operations and their replies

use std::fmt;

use super::parser::Unparsed;
use crate::ledger::{Direction, ReleaseId, VoteCounts};

/// Result of one `apply_chat_vote` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a vote, or a vote we stay quiet about.
    Ignored(IgnoreReason),
    /// A vote refused with an explanation for the channel.
    Rejected(Rejection),
    /// The ledger changed.
    Applied(AppliedVote),
    /// The exact same vote was already recorded this release.
    Duplicate,
    /// Release lookup or ledger failure; logged, never shown in chat.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    Unparsed(Unparsed),
    UnknownActor(String),
    UnknownRecipient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownActor(String),
    UnknownRecipient(String),
    SelfVote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedVote {
    pub voter: String,
    pub recipient: String,
    pub release: ReleaseId,
    pub direction: Direction,
    pub total_this_release: i64,
    pub total_all_time: i64,
}

impl Outcome {
    /// Chat reply for this outcome, if any. `url` is the karma info link.
    pub fn reply(&self, url: &str) -> Option<String> {
        match self {
            Outcome::Applied(v) => Some(format!(
                "Karma for {} changed to {} (for the current release cycle):  {}",
                v.recipient, v.total_this_release, url
            )),
            Outcome::Rejected(Rejection::SelfVote) => {
                Some("You may not modify your own karma.".to_string())
            }
            Outcome::Rejected(Rejection::UnknownActor(name))
            | Outcome::Rejected(Rejection::UnknownRecipient(name)) => {
                Some(format!("Couldn't find {name} in FAS"))
            }
            Outcome::Ignored(_) | Outcome::Duplicate | Outcome::Failed(_) => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }
}

/// Answer to the `karma <name>` lookup command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KarmaReport {
    pub name: String,
    pub release: ReleaseId,
    pub this_release: VoteCounts,
    pub all_time: VoteCounts,
}

impl KarmaReport {
    /// Whether any vote for `name` exists in any release.
    pub fn has_data(&self) -> bool {
        let counted = |c: &VoteCounts| c.increments + c.decrements > 0;
        counted(&self.this_release) || counted(&self.all_time)
    }
}

impl fmt::Display for KarmaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_data() {
            return write!(f, "I have no karma data for {}", self.name);
        }
        write!(
            f,
            "Karma for {} has been increased {} times and decreased {} times \
             this release cycle for a total of {} ({} all time)",
            self.name,
            self.this_release.increments,
            self.this_release.decrements,
            self.this_release.total(),
            self.all_time.total()
        )
    }
}
