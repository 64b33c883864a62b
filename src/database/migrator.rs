//! # Database Migration Support
//!
//! ```rust,ignore
//! #[sqlx::test(migrator = "context_core::database::migrator::MIGRATOR")]
//! async fn test_something(pool: PgPool) { /* ... */ }
//! ```

use sqlx::PgPool;
use tracing::info;

/// Migrator over the crate's `migrations/` directory
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, sqlx::migrate::MigrateError>;

/// Bring the schema up to date
pub async fn run_migrations(pool: &PgPool) -> MigrationResult<()> {
    MIGRATOR.run(pool).await?;
    info!("Context schema migrations applied");
    Ok(())
}
