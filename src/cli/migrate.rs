// src/cli/migrate.rs - Ledger migration command
//
// Migrations run whenever the ledger is opened; this command makes that
// explicit and shows what has been applied.

use anyhow::Context;
use rusqlite::{Connection, OpenFlags};

use crate::infra::config::Config;
use crate::ledger::{schema, LedgerStore};
use crate::release;

pub async fn run_migrate(config: &Config, status_only: bool) -> anyhow::Result<()> {
    let db_path = config.karma.db_path();

    if status_only {
        if !db_path.exists() {
            println!("No ledger found at: {}", db_path.display());
            return Ok(());
        }
        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        return show_migration_status(&conn, &db_path.display().to_string());
    }

    let current = release::from_config(&config.release)
        .current_release()
        .await
        .context("Cannot determine the release to migrate legacy votes into")?;

    println!("Running ledger migrations (current release {current})...");
    let store = LedgerStore::open(&db_path, &current)?;
    println!("Migrations complete.");

    println!("Ledger: {}", db_path.display());
    println!(
        "Schema version: {} (latest {})",
        store
            .applied_migrations()?
            .last()
            .map(|m| m.version)
            .unwrap_or(0),
        schema::latest_version()
    );
    let partitions = store.session()?.partitions()?;
    let names: Vec<&str> = partitions.iter().map(|r| r.as_str()).collect();
    println!("Release partitions: {}", names.join(", "));
    Ok(())
}

fn show_migration_status(conn: &Connection, location: &str) -> anyhow::Result<()> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='_migrations'",
        [],
        |row| row.get(0),
    )?;
    if !table_exists {
        println!("No migrations have been run yet.");
        return Ok(());
    }

    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM _migrations ORDER BY version")?;
    let applied = stmt
        .query_map([], |row| {
            Ok(schema::AppliedMigration {
                version: row.get(0)?,
                name: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    println!("Ledger: {location}");
    println!(
        "Schema version: {} (latest {})",
        applied.last().map(|m| m.version).unwrap_or(0),
        schema::latest_version()
    );
    println!();
    println!("Applied migrations:");
    for m in &applied {
        println!("  v{}: {} (applied {})", m.version, m.name, m.applied_at);
    }

    let pending = schema::latest_version()
        .saturating_sub(applied.last().map(|m| m.version).unwrap_or(0));
    if pending > 0 {
        println!();
        println!("{pending} migration(s) pending. Run `karmabot migrate` to apply.");
    }
    Ok(())
}
