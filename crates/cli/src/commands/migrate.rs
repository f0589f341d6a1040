//! Database migration command.
//!
//! Applies `crates/server/migrations/` and creates the session store table.
//! Migrations are never run by the server on startup.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run schema and session store migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Creating session store...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
