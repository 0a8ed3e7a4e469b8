use sqlx::migrate::{Migrate, Migrator};
use sqlx::{Database, Pool};
use tracing::info;

use crate::error::StarshipError;

/// Counts of applied migrations around one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied_before: usize,
    pub applied_after: usize,
}

impl MigrationReport {
    pub fn newly_applied(&self) -> usize {
        self.applied_after.saturating_sub(self.applied_before)
    }
}

/// Applies migration scripts in version order.
///
/// Applied versions are recorded in `_sqlx_migrations`, so re-running is a
/// no-op. Unapplied scripts older than the newest applied version are
/// always run; sqlx has no switch to refuse them. A failing script aborts
/// the run; nothing is rolled back beyond the failing script's own
/// transaction.
pub struct MigrationRunner {
    migrator: Migrator,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::embedded()
    }
}

impl MigrationRunner {
    /// Wrap an already loaded migrator, keeping its settings.
    pub fn new(migrator: Migrator) -> Self {
        Self { migrator }
    }

    /// The embedded `migrations/` set, tolerating retired versions.
    pub fn embedded() -> Self {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        Self { migrator }
    }

    /// Whether versions recorded as applied but absent from this set are
    /// tolerated. When `false`, such a version fails the run.
    pub fn ignore_retired_versions(mut self, ignore: bool) -> Self {
        self.migrator.set_ignore_missing(ignore);
        self
    }

    pub fn versions(&self) -> Vec<i64> {
        self.migrator.iter().map(|m| m.version).collect()
    }

    pub async fn run<DB>(&self, pool: &Pool<DB>) -> Result<MigrationReport, StarshipError>
    where
        DB: Database,
        DB::Connection: Migrate,
    {
        let applied_before = applied_count(pool).await?;
        self.migrator.run(pool).await?;
        let applied_after = applied_count(pool).await?;

        let report = MigrationReport {
            applied_before,
            applied_after,
        };
        info!(
            applied = report.newly_applied(),
            total = report.applied_after,
            "migrations complete"
        );
        Ok(report)
    }
}

async fn applied_count<DB>(pool: &Pool<DB>) -> Result<usize, StarshipError>
where
    DB: Database,
    DB::Connection: Migrate,
{
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    Ok(conn.list_applied_migrations().await?.len())
}
