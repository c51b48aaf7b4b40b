// src/ledger/mod.rs - Karma ledger store

mod kv;
pub mod schema;
pub mod session;
pub mod types;

pub use session::Session;
pub use types::{tally, tally_all, Direction, NestedVotes, ReleaseId, VoteCounts, VoteMap};

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::infra::errors::KarmaResult;

/// How long a session waits on another process holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// The on-disk karma ledger. All access goes through [`LedgerStore::session`].
pub struct LedgerStore {
    conn: Mutex<Connection>,
}

impl LedgerStore {
    /// Open (or create) the ledger at `path`, bringing its schema up to date.
    ///
    /// `release` is the partition a legacy unpartitioned ledger is moved into.
    pub fn open(path: &Path, release: &ReleaseId) -> KarmaResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        // Must precede the WAL switch, which itself contends for the lock.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn, release)
    }

    /// Create an in-memory ledger (for testing).
    pub fn in_memory(release: &ReleaseId) -> KarmaResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, release)
    }

    /// Wrap an already-open connection, running pending migrations first.
    pub fn from_connection(conn: Connection, release: &ReleaseId) -> KarmaResult<Self> {
        schema::run_migrations(&conn, release)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire exclusive access to the ledger for one logical operation.
    ///
    /// Blocks while another session (in this process or another one) is open.
    pub fn session(&self) -> KarmaResult<Session<'_>> {
        // A panicking holder already rolled back in `Session::drop`.
        let guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        Session::begin(guard)
    }

    pub fn applied_migrations(&self) -> KarmaResult<Vec<schema::AppliedMigration>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        schema::applied_migrations(&conn)
    }
}
