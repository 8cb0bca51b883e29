//! # Database Migrations
//!
//! Schema for the billing store, embedded from `migrations/sqlite/` at
//! compile time:
//!
//! ```text
//! 001_initial_schema.sql   invoices, expenses
//! 002_code_sequences.sql   code_sequences (one row per prefix)
//! ```
//!
//! Add new files with the next number; applied files are checksummed by
//! sqlx and must not be edited.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Where a database stands against the embedded migrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Embedded migrations.
    pub total: usize,

    /// Migrations recorded as successfully applied.
    pub applied: usize,

    /// `NNN description` of every embedded migration not yet applied.
    pub pending: Vec<String>,
}

impl MigrationStatus {
    /// True when nothing is pending.
    pub fn is_current(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies every pending migration, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema is current");
        return Ok(());
    }

    for name in &before.pending {
        info!(migration = %name, "Applying migration");
    }
    MIGRATOR.run(pool).await?;

    info!(applied = before.pending.len(), "Migrations applied");
    Ok(())
}

/// Compares the embedded migrations with `_sqlx_migrations`.
///
/// A database that has never been migrated reports every migration as
/// pending rather than failing.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let applied_versions: Vec<i64> = if tracked > 0 {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?
    } else {
        Vec::new()
    };

    let pending = MIGRATOR
        .iter()
        .filter(|m| !applied_versions.contains(&m.version))
        .map(|m| format!("{:03} {}", m.version, m.description))
        .collect();

    Ok(MigrationStatus {
        total: MIGRATOR.iter().count(),
        applied: applied_versions.len(),
        pending,
    })
}
