// src/ledger/session.rs - Exclusive unit of work over the ledger
//
// A `Session` holds the store's connection lock and an open
// `BEGIN IMMEDIATE` transaction for its whole lifetime. Nothing is visible
// to other sessions until `commit()`; dropping an uncommitted session rolls
// back, so the forward and backward indices are always written together.

use rusqlite::Connection;
use std::sync::MutexGuard;

use super::kv;
use super::types::{Direction, NestedVotes, ReleaseId, VoteMap, BACKWARDS_PREFIX};
use crate::infra::errors::KarmaResult;

pub struct Session<'a> {
    conn: MutexGuard<'a, Connection>,
    committed: bool,
}

impl<'a> Session<'a> {
    pub(super) fn begin(conn: MutexGuard<'a, Connection>) -> KarmaResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            committed: false,
        })
    }

    // -- Raw key/value access --

    pub fn get(&self, key: &str) -> KarmaResult<Option<NestedVotes>> {
        kv::get(&self.conn, key)
    }

    pub fn put(&self, key: &str, value: &NestedVotes) -> KarmaResult<()> {
        kv::put(&self.conn, key, value)
    }

    pub fn delete(&self, key: &str) -> KarmaResult<bool> {
        kv::delete(&self.conn, key)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> KarmaResult<Vec<String>> {
        kv::keys_with_prefix(&self.conn, prefix)
    }

    // -- Ledger queries --

    /// Every release that has a backward index stored.
    pub fn partitions(&self) -> KarmaResult<Vec<ReleaseId>> {
        Ok(self
            .keys_with_prefix(BACKWARDS_PREFIX)?
            .into_iter()
            .filter_map(|k| k.strip_prefix(BACKWARDS_PREFIX).map(ReleaseId::new))
            .collect())
    }

    /// Voter -> direction for everything `account` received in `release`.
    pub fn votes_received(&self, account: &str, release: &ReleaseId) -> KarmaResult<VoteMap> {
        Ok(self
            .get(&release.backwards_key())?
            .and_then(|mut idx| idx.remove(account))
            .unwrap_or_default())
    }

    /// Recipient -> direction for everything `voter` gave in `release`.
    pub fn votes_given(&self, voter: &str, release: &ReleaseId) -> KarmaResult<VoteMap> {
        Ok(self
            .get(&release.forwards_key())?
            .and_then(|mut idx| idx.remove(voter))
            .unwrap_or_default())
    }

    /// One voter map per stored release partition (empty where `account`
    /// received nothing in that release).
    pub fn all_time_received(&self, account: &str) -> KarmaResult<Vec<VoteMap>> {
        let mut result = Vec::new();
        for key in self.keys_with_prefix(BACKWARDS_PREFIX)? {
            let votes = self
                .get(&key)?
                .and_then(|mut idx| idx.remove(account))
                .unwrap_or_default();
            result.push(votes);
        }
        Ok(result)
    }

    /// Record `voter`'s decision about `recipient` in `release`.
    ///
    /// Returns `false` when the same vote is already stored (nothing is
    /// written), `true` when the vote was new or replaced the opposite one.
    pub fn record_vote(
        &mut self,
        voter: &str,
        recipient: &str,
        release: &ReleaseId,
        direction: Direction,
    ) -> KarmaResult<bool> {
        let fkey = release.forwards_key();
        let bkey = release.backwards_key();

        let mut forwards = self.get(&fkey)?.unwrap_or_default();
        let given = forwards.entry(voter.to_string()).or_default();
        if given.get(recipient) == Some(&direction) {
            return Ok(false);
        }
        given.insert(recipient.to_string(), direction);

        let mut backwards = self.get(&bkey)?.unwrap_or_default();
        backwards
            .entry(recipient.to_string())
            .or_default()
            .insert(voter.to_string(), direction);

        self.put(&fkey, &forwards)?;
        self.put(&bkey, &backwards)?;
        Ok(true)
    }

    pub fn commit(mut self) -> KarmaResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!("Ledger rollback failed: {}", e);
        }
    }
}
