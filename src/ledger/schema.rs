// src/ledger/schema.rs - Schema + migrations
//
// `_migrations` is the persisted schema-version marker. Each migration runs
// in one transaction together with its marker row, so it is applied exactly
// once no matter how often the ledger is opened.

use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use tracing::info;

use super::kv;
use super::types::{NestedVotes, ReleaseId, LEGACY_BACKWARDS_KEY, LEGACY_FORWARDS_KEY};
use crate::infra::errors::{KarmaError, KarmaResult};

/// What a migration does when applied.
pub enum MigrationStep {
    Sql(&'static str),
    /// Data rewrite that needs the current release partition.
    Rewrite(fn(&Connection, &ReleaseId) -> KarmaResult<()>),
}

/// A database migration with version, name, and its step.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub step: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "ledger_table",
        step: MigrationStep::Sql(include_str!("migrations/001_ledger_table.up.sql")),
    },
    Migration {
        version: 2,
        name: "partition_legacy_ledger",
        step: MigrationStep::Rewrite(partition_legacy_ledger),
    },
];

/// Highest schema version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.iter().map(|m| m.version).max().unwrap_or(0)
}

fn ensure_migrations_table(conn: &Connection) -> KarmaResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;
    Ok(())
}

pub fn current_version(conn: &Connection) -> KarmaResult<u32> {
    ensure_migrations_table(conn)?;
    version_of(conn)
}

fn version_of(conn: &Connection) -> KarmaResult<u32> {
    let v = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;
    Ok(v)
}

/// Run all pending migrations. Returns how many were applied.
///
/// Safe against other connections migrating the same file concurrently:
/// every step takes the write lock up front and re-reads the version
/// under it, so a step finished by someone else is skipped.
pub fn run_migrations(conn: &Connection, release: &ReleaseId) -> KarmaResult<usize> {
    if current_version(conn)? >= latest_version() {
        return Ok(0);
    }

    let mut applied = 0;
    for migration in MIGRATIONS {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        if version_of(&tx)? >= migration.version {
            continue;
        }

        info!(
            "Applying migration {}: {}",
            migration.version, migration.name
        );
        let result = match migration.step {
            MigrationStep::Sql(sql) => tx.execute_batch(sql).map_err(KarmaError::from),
            MigrationStep::Rewrite(rewrite) => rewrite(&tx, release),
        };
        result.map_err(|e| KarmaError::Migration {
            version: migration.version,
            name: migration.name,
            message: e.to_string(),
        })?;
        tx.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
        applied += 1;
    }

    Ok(applied)
}

#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub version: u32,
    pub name: String,
    pub applied_at: String,
}

pub fn applied_migrations(conn: &Connection) -> KarmaResult<Vec<AppliedMigration>> {
    ensure_migrations_table(conn)?;
    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM _migrations ORDER BY version")?;
    let rows = stmt.query_map([], |row| {
        Ok(AppliedMigration {
            version: row.get(0)?,
            name: row.get(1)?,
            applied_at: row.get(2)?,
        })
    })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Move the unpartitioned `forwards` / `backwards` keys into the current
/// release. Votes already stored under the release keys take precedence.
fn partition_legacy_ledger(conn: &Connection, release: &ReleaseId) -> KarmaResult<()> {
    let pairs = [
        (LEGACY_FORWARDS_KEY, release.forwards_key()),
        (LEGACY_BACKWARDS_KEY, release.backwards_key()),
    ];

    for (legacy_key, partition_key) in pairs {
        let Some(legacy) = kv::get(conn, legacy_key)? else {
            continue;
        };
        info!(
            "Migrating legacy ledger key '{}' into '{}' ({} entries)",
            legacy_key,
            partition_key,
            legacy.len()
        );
        let mut partition = kv::get(conn, &partition_key)?.unwrap_or_default();
        merge_missing(&mut partition, legacy);
        kv::put(conn, &partition_key, &partition)?;
        kv::delete(conn, legacy_key)?;
    }

    Ok(())
}

fn merge_missing(target: &mut NestedVotes, source: NestedVotes) {
    for (outer, votes) in source {
        let entry = target.entry(outer).or_default();
        for (inner, direction) in votes {
            entry.entry(inner).or_insert(direction);
        }
    }
}
