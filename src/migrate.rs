//! Schema creation. Every statement is idempotent, so `init` can be run
//! any number of times and `seed` runs it before touching the tables.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create tables and indexes on an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Survey versions. Content columns are written once; only is_active
    // and updated_at change after insert.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surveys (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            sections_json TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            source_file TEXT NOT NULL DEFAULT '',
            file_hash TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS survey_responses (
            id TEXT PRIMARY KEY,
            survey_id TEXT NOT NULL,
            email TEXT NOT NULL,
            name TEXT,
            responses_json TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (survey_id) REFERENCES surveys(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_surveys_source_file ON surveys(source_file)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_surveys_created_at ON surveys(created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_survey_responses_survey_id ON survey_responses(survey_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
