// src/karma/protocol.rs - Vote validation and application
//
// Stateless: every call resolves against the directory snapshot it is
// handed and performs at most one ledger session.

use std::sync::Arc;

use super::outcome::{AppliedVote, IgnoreReason, KarmaReport, Outcome, Rejection};
use super::parser::{self, VoteToken};
use crate::identity::Directory;
use crate::infra::config::KarmaConfig;
use crate::infra::errors::KarmaResult;
use crate::ledger::{tally, tally_all, Direction, LedgerStore, ReleaseId, VoteCounts};
use crate::release::ReleaseProvider;

pub struct KarmaProtocol {
    ledger: Arc<LedgerStore>,
    releases: Arc<dyn ReleaseProvider>,
    allow_negative: bool,
    url: String,
}

impl KarmaProtocol {
    pub fn new(
        ledger: Arc<LedgerStore>,
        releases: Arc<dyn ReleaseProvider>,
        config: &KarmaConfig,
    ) -> Self {
        Self {
            ledger,
            releases,
            allow_negative: config.allow_negative,
            url: config.url.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Candidate vote tokens in a chat line.
    pub fn vote_words<'l>(&self, line: &'l str) -> Vec<&'l str> {
        parser::vote_words(line, self.allow_negative)
    }

    /// Validate and apply one vote token seen in `line`, sent by `actor`.
    ///
    /// `explicit` is true when the bot was addressed directly; only then are
    /// unknown actors/recipients reported back.
    pub async fn apply_chat_vote(
        &self,
        directory: &Directory,
        actor: &str,
        token: &str,
        line: &str,
        explicit: bool,
    ) -> Outcome {
        let VoteToken {
            recipient,
            direction,
        } = match parser::parse_vote(token, self.allow_negative) {
            Ok(vote) => vote,
            Err(reason) => {
                tracing::debug!("Ignoring '{}' from {}: {:?}", token, actor, reason);
                return Outcome::Ignored(IgnoreReason::Unparsed(reason));
            }
        };

        let Some(voter) = directory.resolve(actor) else {
            tracing::info!("Saw {} from {}, but {} not in FAS", recipient, actor, actor);
            return unknown(explicit, Rejection::UnknownActor, IgnoreReason::UnknownActor, actor);
        };
        let Some(target) = directory.resolve(recipient) else {
            tracing::info!("Saw {} from {}, but {} not in FAS", recipient, actor, recipient);
            return unknown(
                explicit,
                Rejection::UnknownRecipient,
                IgnoreReason::UnknownRecipient,
                recipient,
            );
        };

        if voter.username == target.username {
            return Outcome::Rejected(Rejection::SelfVote);
        }

        let release = match self.releases.current_release().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Cannot apply karma from {}: {}", voter.username, e);
                return Outcome::Failed(e.to_string());
            }
        };

        match self.record(&voter.username, &target.username, &release, direction) {
            Ok(Some((total_this_release, total_all_time))) => {
                tracing::info!(
                    "Karma {}{} by {} in {} (line: {:?}); now {} ({} all time)",
                    target.username,
                    direction.suffix(),
                    voter.username,
                    release,
                    line,
                    total_this_release,
                    total_all_time
                );
                Outcome::Applied(AppliedVote {
                    voter: voter.username.clone(),
                    recipient: target.username.clone(),
                    release,
                    direction,
                    total_this_release,
                    total_all_time,
                })
            }
            Ok(None) => {
                tracing::debug!(
                    "Duplicate karma {}{} from {} in {}",
                    target.username,
                    direction.suffix(),
                    voter.username,
                    release
                );
                Outcome::Duplicate
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(
                        "Karma update {} -> {} hit a busy ledger: {}",
                        voter.username,
                        target.username,
                        e
                    );
                } else {
                    tracing::error!(
                        "Karma update {} -> {} failed: {}",
                        voter.username,
                        target.username,
                        e
                    );
                }
                Outcome::Failed(e.to_string())
            }
        }
    }

    /// One ledger session: record the vote and, if it changed anything,
    /// return (this-release total, all-time total) for the recipient.
    fn record(
        &self,
        voter: &str,
        recipient: &str,
        release: &ReleaseId,
        direction: Direction,
    ) -> KarmaResult<Option<(i64, i64)>> {
        let mut session = self.ledger.session()?;
        if !session.record_vote(voter, recipient, release, direction)? {
            return Ok(None);
        }
        let this_release = tally(&session.votes_received(recipient, release)?);
        let all_time = tally_all(&session.all_time_received(recipient)?);
        session.commit()?;
        Ok(Some((this_release, all_time)))
    }

    /// The `karma <name>` command.
    pub async fn lookup(&self, directory: &Directory, name: &str) -> KarmaResult<KarmaReport> {
        let name = directory.canonical_or_raw(name.trim()).to_string();
        let release = self.releases.current_release().await?;

        let session = self.ledger.session()?;
        let this_release = VoteCounts::of(&session.votes_received(&name, &release)?);
        let mut all_time = VoteCounts::default();
        for votes in session.all_time_received(&name)? {
            all_time.add(&votes);
        }
        drop(session);

        Ok(KarmaReport {
            name,
            release,
            this_release,
            all_time,
        })
    }
}

fn unknown(
    explicit: bool,
    reject: fn(String) -> Rejection,
    ignore: fn(String) -> IgnoreReason,
    name: &str,
) -> Outcome {
    if explicit {
        Outcome::Rejected(reject(name.to_string()))
    } else {
        Outcome::Ignored(ignore(name.to_string()))
    }
}
