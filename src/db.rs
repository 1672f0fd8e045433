use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult},
    SqlitePool,
};
use time::{OffsetDateTime, UtcOffset};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Row identifier. SQLite rowids are signed 64-bit; ids are always positive.
pub type Id = i64;

/// Opens the shared pool. Every connection gets case-sensitive LIKE so
/// free-text search is an exact substring match.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {database_url}"))?
        .create_if_missing(true);

    let mut pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA case_sensitive_like = ON")
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        });
    if database_url.contains(":memory:") {
        // each connection would otherwise see its own empty database
        pool = pool.max_connections(1).idle_timeout(None).max_lifetime(None);
    }

    let pool = pool
        .connect_with(options)
        .await
        .context("connect to database")?;
    info!(max_connections, "database pool ready");
    Ok(pool)
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// In-memory database with the schema applied. Used by tests.
pub async fn memory_pool() -> anyhow::Result<SqlitePool> {
    let pool = connect("sqlite::memory:", 1).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Turns a mutation result into its affected-row count, surfacing zero rows
/// as [`AppError::NoRowsAffected`].
pub(crate) fn affected(result: SqliteQueryResult) -> AppResult<u64> {
    match result.rows_affected() {
        0 => Err(AppError::NoRowsAffected),
        n => Ok(n),
    }
}

/// Stored form of caller-supplied timestamps: UTC, whole seconds. Keeps text
/// comparison in SQL consistent with [`crate::query::SqlValue::Timestamp`].
pub(crate) fn stored_ts(ts: OffsetDateTime) -> OffsetDateTime {
    let utc = ts.to_offset(UtcOffset::UTC);
    utc.replace_nanosecond(0).unwrap_or(utc)
}
