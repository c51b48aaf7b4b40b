// src/ledger/types.rs - Votes, releases and the nested ledger maps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::infra::errors::KarmaError;

/// A single karma decision. Persisted as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Parse the trailing `++` / `--` of a vote token.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "++" => Some(Direction::Up),
            "--" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Up => "++",
            Direction::Down => "--",
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

impl From<Direction> for i8 {
    fn from(d: Direction) -> i8 {
        d.value() as i8
    }
}

impl TryFrom<i8> for Direction {
    type Error = KarmaError;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Direction::Up),
            -1 => Ok(Direction::Down),
            other => Err(KarmaError::InvalidVote(other as i64)),
        }
    }
}

/// Opaque partition key for a release cycle, e.g. `f40`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(String);

impl ReleaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn forwards_key(&self) -> String {
        format!("{FORWARDS_PREFIX}{}", self.0)
    }

    pub fn backwards_key(&self) -> String {
        format!("{BACKWARDS_PREFIX}{}", self.0)
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReleaseId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

pub const FORWARDS_PREFIX: &str = "forwards-";
pub const BACKWARDS_PREFIX: &str = "backwards-";

/// Keys of the pre-release (unpartitioned) layout.
pub const LEGACY_FORWARDS_KEY: &str = "forwards";
pub const LEGACY_BACKWARDS_KEY: &str = "backwards";

/// Inner map: counterpart account -> direction.
pub type VoteMap = BTreeMap<String, Direction>;

/// One stored ledger value: account -> (counterpart -> direction).
pub type NestedVotes = BTreeMap<String, VoteMap>;

/// Net karma of a set of votes.
pub fn tally(votes: &VoteMap) -> i64 {
    votes.values().map(|d| d.value()).sum()
}

/// Net karma summed over several release partitions.
pub fn tally_all(partitions: &[VoteMap]) -> i64 {
    partitions.iter().map(tally).sum()
}

/// Increment/decrement counts over one or more vote maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCounts {
    pub increments: u32,
    pub decrements: u32,
}

impl VoteCounts {
    pub fn of(votes: &VoteMap) -> Self {
        let mut counts = Self::default();
        counts.add(votes);
        counts
    }

    pub fn add(&mut self, votes: &VoteMap) {
        for d in votes.values() {
            match d {
                Direction::Up => self.increments += 1,
                Direction::Down => self.decrements += 1,
            }
        }
    }

    pub fn total(&self) -> i64 {
        i64::from(self.increments) - i64::from(self.decrements)
    }
}
