//! # Database Migration Runner
//!
//! Incremental migrations with version tracking. Migrations are discovered
//! from the `migrations/` directory using a timestamp-based naming
//! convention (`YYYYMMDDHHMMSS_description.sql`) and applied in order.
//! A PostgreSQL advisory lock serializes concurrent runners (parallel test
//! processes racing to prepare the same database).

use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const MIGRATION_LOCK_KEY: i64 = 7_420_196_508_231_114;

/// One discovered migration file
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version timestamp (YYYYMMDDHHMMSS)
    pub version: String,
    /// Human-readable migration name
    pub name: String,
    /// Full SQL content
    pub sql: String,
}

/// Discover migration files under `dir`, sorted by version
pub fn discover_migrations(dir: &Path) -> std::io::Result<Vec<Migration>> {
    let mut found = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(".sql") {
            continue;
        }
        let stem = file_name.trim_end_matches(".sql");
        let Some((version, name)) = stem.split_once('_') else {
            continue;
        };
        if version.len() != 14 || !version.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let sql = fs::read_to_string(&path)?;
        found.insert(
            version.to_string(),
            Migration {
                version: version.to_string(),
                name: name.to_string(),
                sql,
            },
        );
    }

    Ok(found.into_values().collect())
}

/// Apply every pending migration from `dir`, under an advisory lock
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<usize, sqlx::Error> {
    let migrations = discover_migrations(dir).map_err(|e| {
        sqlx::Error::Io(std::io::Error::new(
            e.kind(),
            format!("migration discovery failed: {e}"),
        ))
    })?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(pool)
        .await?;

    let result = apply_pending(pool, &migrations).await;

    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(pool)
        .await?;

    result
}

async fn apply_pending(pool: &PgPool, migrations: &[Migration]) -> Result<usize, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fulfillment_schema_migrations (
            version VARCHAR PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let applied: Vec<String> = sqlx::query("SELECT version FROM fulfillment_schema_migrations")
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| row.get::<String, _>("version"))
        .collect();

    let mut count = 0;
    for migration in migrations {
        if applied.contains(&migration.version) {
            continue;
        }

        tracing::info!(
            version = %migration.version,
            name = %migration.name,
            "Applying migration"
        );

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(&migration.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO fulfillment_schema_migrations (version) VALUES ($1)")
            .bind(&migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        count += 1;
    }

    Ok(count)
}
