//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary and applied
//! in filename order. sqlx records each applied file in `_sqlx_migrations`
//! together with its checksum, so editing an applied file makes startup fail.
//! Schema changes go into a new `NNN_description.sql`.
//!
//! After the SQL runs, product name keys are recomputed in Rust: SQL's
//! `lower()` cannot fold "É" to "é", so keys backfilled by a migration may be
//! wrong for non-ASCII names.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use stockwise_core::validation::product_name_key;

use crate::error::{DbError, DbResult};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever hasn't been applied yet. A no-op on an up-to-date store.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    refresh_name_keys(pool).await?;

    let (known, applied) = migration_status(pool).await?;
    info!(known, applied, "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.iter().count();

    let has_table: i64 = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;
    if has_table == 0 {
        return Ok((embedded, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    let applied = usize::try_from(applied)
        .map_err(|_| DbError::corrupt("_sqlx_migrations", format!("count {}", applied)))?;
    Ok((embedded, applied))
}

/// Rewrites `name_key` wherever it differs from the application's folding.
///
/// Two names that only differ by non-ASCII case can predate the key column;
/// the second one keeps its old key and is reported.
async fn refresh_name_keys(pool: &SqlitePool) -> DbResult<()> {
    let rows: Vec<(String, String, String)> =
        sqlx::query_as("SELECT id, name, name_key FROM products")
            .fetch_all(pool)
            .await?;

    for (id, name, stored) in rows {
        let key = product_name_key(&name);
        if key == stored {
            continue;
        }

        let updated = sqlx::query("UPDATE products SET name_key = ?2 WHERE id = ?1")
            .bind(&id)
            .bind(&key)
            .execute(pool)
            .await
            .map_err(DbError::from);

        match updated {
            Ok(_) => debug!(product_id = %id, name = %name, "Name key refreshed"),
            Err(DbError::UniqueViolation { .. }) => warn!(
                product_id = %id,
                name = %name,
                "Another product has the same name ignoring case; rename one of them"
            ),
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
