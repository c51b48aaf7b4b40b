// src/karma/mod.rs - Karma vote protocol

pub mod outcome;
pub mod parser;
pub mod protocol;

pub use outcome::{AppliedVote, IgnoreReason, KarmaReport, Outcome, Rejection};
pub use parser::{parse_vote, vote_words, Unparsed, VoteToken};
pub use protocol::KarmaProtocol;
