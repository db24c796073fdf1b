/// Schema migrations
///
/// The SQL files under `taskdesk-shared/migrations/` are embedded into the
/// binary by `sqlx::migrate!` and applied at startup. Every migration is a
/// reversible `*.up.sql` / `*.down.sql` pair.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::migrations::{get_migration_status, run_migrations};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
/// run_migrations(&pool).await?;
///
/// let status = get_migration_status(&pool).await?;
/// assert!(status.is_up_to_date);
/// # Ok(())
/// # }
/// ```

use sqlx::migrate::{MigrateDatabase, MigrateError, Migrator};
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{debug, error, info};

/// Migrations compiled into the crate
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applied-migration summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Successfully applied migrations
    pub applied_migrations: usize,

    /// Highest applied version, if any
    pub latest_version: Option<i64>,

    /// True when the highest applied version is the newest embedded one
    pub is_up_to_date: bool,
}

/// Newest version among the embedded up-migrations
pub fn latest_embedded_version() -> Option<i64> {
    MIGRATOR
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .map(|m| m.version)
        .max()
}

/// Applies every pending migration
///
/// Each migration runs in its own transaction; a failure stops the run and
/// leaves earlier migrations applied.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(latest = ?latest_embedded_version(), "Applying database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Database migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Reads `_sqlx_migrations` to report what has been applied
///
/// A database that has never been migrated reports zero applied migrations
/// rather than an error.
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let (applied, latest_version): (i64, Option<i64>) = if tracked {
        sqlx::query_as("SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await?
    } else {
        (0, None)
    };

    let status = MigrationStatus {
        applied_migrations: applied as usize,
        latest_version,
        is_up_to_date: latest_version == latest_embedded_version(),
    };
    debug!(?status, "Migration status");

    Ok(status)
}

/// Creates the target database when it is missing
///
/// Used outside production so a fresh local Postgres works without manual
/// setup.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Creating database");
    Postgres::create_database(database_url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_ordered() {
        let versions: Vec<i64> = MIGRATOR
            .iter()
            .filter(|m| m.migration_type.is_up_migration())
            .map(|m| m.version)
            .collect();
        assert_eq!(versions, vec![20250101000001, 20250101000002]);
        assert_eq!(latest_embedded_version(), Some(20250101000002));
    }

    #[test]
    fn test_embedded_migrations_reversible() {
        assert!(MIGRATOR.iter().all(|m| m.migration_type.is_reversible()));
        assert!(MIGRATOR.iter().any(|m| m.migration_type.is_down_migration()));
    }
}
