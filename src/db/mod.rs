//! Database pool setup and migration embedding.

use anyhow::{Context, Result};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Per-connection pragmas for the pool.
#[derive(Debug, Clone, Copy)]
struct LedgerConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for LedgerConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // Ledger rows reference orders/parties; keep the database honest.
        sql_query("PRAGMA foreign_keys = ON;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        // Wait for locks instead of failing immediately under
        // concurrent delivery confirmations.
        sql_query("PRAGMA busy_timeout = 5000;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        sql_query("PRAGMA journal_mode = WAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        sql_query("PRAGMA synchronous = NORMAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}

/// Create the connection pool used by the HTTP handlers.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(10)
        .connection_timeout(std::time::Duration::from_secs(30))
        .connection_customizer(Box::new(LedgerConnectionCustomizer))
        .build(manager)
        .context("Failed to create database connection pool")?;
    Ok(pool)
}

/// Apply pending migrations on startup.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    Ok(())
}

/// Fresh in-memory database with the schema applied. Test helper; an
/// in-memory SQLite database lives and dies with its one connection,
/// so this bypasses the pool on purpose.
pub fn establish_in_memory() -> Result<SqliteConnection> {
    let mut conn =
        SqliteConnection::establish(":memory:").context("Failed to open in-memory database")?;
    sql_query("PRAGMA foreign_keys = ON;")
        .execute(&mut conn)
        .context("Failed to enable foreign keys")?;
    run_migrations(&mut conn)?;
    Ok(conn)
}
