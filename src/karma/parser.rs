// src/karma/parser.rs - Vote token extraction

use crate::ledger::Direction;

/// Single letters that are almost always a language name (`c++`, `g++`)
/// or a loop counter (`i++`), not a person.
const RESERVED_RECIPIENTS: &[&str] = &["c", "g", "i"];

/// A vote parsed out of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteToken<'a> {
    pub recipient: &'a str,
    pub direction: Direction,
}

/// Why a token produced no vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unparsed {
    /// No accepted `++`/`--` suffix.
    NotAVote,
    /// Nothing left once the suffix is removed (`++`).
    EmptyRecipient,
    /// `c++`, `g++`, `i++` and friends.
    ReservedWord,
}

fn accepted_direction(token: &str, allow_negative: bool) -> Option<Direction> {
    if token.ends_with("++") {
        Some(Direction::Up)
    } else if allow_negative && token.ends_with("--") {
        Some(Direction::Down)
    } else {
        None
    }
}

/// Whitespace-separated words of `line` that carry a vote suffix.
pub fn vote_words(line: &str, allow_negative: bool) -> Vec<&str> {
    line.split_whitespace()
        .filter(|w| accepted_direction(w, allow_negative).is_some())
        .collect()
}

/// Parse a single vote token such as `alice++`.
///
/// When the token itself contains whitespace (`have a cookie alice++`),
/// only the last word before the suffix is the recipient.
pub fn parse_vote(token: &str, allow_negative: bool) -> Result<VoteToken<'_>, Unparsed> {
    let direction = accepted_direction(token, allow_negative).ok_or(Unparsed::NotAVote)?;
    let stem = &token[..token.len() - direction.suffix().len()];

    let recipient = stem
        .split_whitespace()
        .last()
        .ok_or(Unparsed::EmptyRecipient)?;

    if RESERVED_RECIPIENTS.contains(&recipient.to_lowercase().as_str()) {
        return Err(Unparsed::ReservedWord);
    }

    Ok(VoteToken {
        recipient,
        direction,
    })
}
