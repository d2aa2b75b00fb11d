// src/cli/migrate.rs - Database migration command
//
// Migrations run automatically whenever the SQLite store opens; this command
// shows where the schema stands and can undo the latest migration.

use rusqlite::Connection;

use crate::infra::config::{Config, StorageBackend};
use crate::memory::schema;

/// Apply pending migrations and show status, or roll back the latest one.
pub fn run_migrate(config: &Config, rollback: bool) -> anyhow::Result<()> {
    if config.storage.backend != StorageBackend::Sqlite {
        println!(
            "Storage backend is {:?}; migrations only apply to sqlite.",
            config.storage.backend
        );
        return Ok(());
    }

    let db_path = config.storage.resolved_path();
    if !db_path.exists() && rollback {
        println!("No database found at: {}", db_path.display());
        return Ok(());
    }

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(&db_path)?;

    if rollback {
        schema::run_migrations(&conn)?;
        match schema::rollback_last(&conn)? {
            Some(version) => {
                println!("Rolled back migration v{version}.");
                println!("Learning state stored by that migration was dropped.");
            }
            None => println!("No migrations to roll back."),
        }
        return Ok(());
    }

    schema::run_migrations(&conn)?;
    println!("Database: {}", db_path.display());
    show_migration_status(&conn)
}

fn show_migration_status(conn: &Connection) -> anyhow::Result<()> {
    println!("Current schema version: {}", schema::current_version(conn)?);
    println!();

    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM _migrations ORDER BY version")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    println!("Applied migrations:");
    for row in rows {
        let (version, name, applied_at) = row?;
        println!("  v{}: {} (applied {})", version, name, applied_at);
    }

    Ok(())
}
