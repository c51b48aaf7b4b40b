// src/ledger/kv.rs - Key/value primitives over the `ledger` table
//
// Values are JSON-encoded `NestedVotes`. Callers are responsible for running
// these inside a transaction; see `Session`.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::types::NestedVotes;
use crate::infra::errors::KarmaResult;

pub(crate) fn get(conn: &Connection, key: &str) -> KarmaResult<Option<NestedVotes>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM ledger WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub(crate) fn put(conn: &Connection, key: &str, value: &NestedVotes) -> KarmaResult<()> {
    let json = serde_json::to_string(value)?;
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO ledger (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, json, now],
    )?;
    Ok(())
}

pub(crate) fn delete(conn: &Connection, key: &str) -> KarmaResult<bool> {
    let n = conn.execute("DELETE FROM ledger WHERE key = ?1", params![key])?;
    Ok(n > 0)
}

/// Keys starting with `prefix`, in lexical order.
pub(crate) fn keys_with_prefix(conn: &Connection, prefix: &str) -> KarmaResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT key FROM ledger WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
    )?;
    let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}
