//! SQLite-backed [`SurveyStore`] implementation.
//!
//! Sections and answers are stored as JSON text columns; everything the
//! reconciliation engine filters on (`source_file`, `file_hash`,
//! `is_active`, `created_at`) is a plain column. Timestamps are Unix
//! milliseconds.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use survey_core::models::{
    NewResponse, NewSurvey, ResponseRecord, Section, SurveyIndexEntry, SurveyRecord,
};
use survey_core::store::SurveyStore;

use crate::config::Config;
use crate::{db, migrate};

/// SQLite implementation of the [`SurveyStore`] trait.
pub struct SqliteSurveyStore {
    pool: SqlitePool,
}

impl SqliteSurveyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

const SURVEY_COLUMNS: &str = "id, title, description, sections_json, is_active, source_file, file_hash, created_at, updated_at";

fn survey_from_row(row: &SqliteRow) -> Result<SurveyRecord> {
    let id: String = row.get("id");
    let sections_json: String = row.get("sections_json");
    let sections: Vec<Section> = serde_json::from_str(&sections_json)
        .with_context(|| format!("survey {} has malformed sections", id))?;

    Ok(SurveyRecord {
        id,
        title: row.get("title"),
        description: row.get("description"),
        sections,
        is_active: row.get("is_active"),
        source_file: row.get("source_file"),
        file_hash: row.get("file_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn response_from_row(row: &SqliteRow) -> Result<ResponseRecord> {
    let id: String = row.get("id");
    let responses_json: String = row.get("responses_json");
    let responses = serde_json::from_str(&responses_json)
        .with_context(|| format!("response {} has malformed answers", id))?;

    Ok(ResponseRecord {
        id,
        survey_id: row.get("survey_id"),
        email: row.get("email"),
        name: row.get("name"),
        responses,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl SurveyStore for SqliteSurveyStore {
    async fn survey_index(&self) -> Result<Vec<SurveyIndexEntry>> {
        let rows = sqlx::query(
            "SELECT id, title, source_file, is_active, file_hash, created_at FROM surveys ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SurveyIndexEntry {
                id: row.get("id"),
                title: row.get("title"),
                source_file: row.get("source_file"),
                is_active: row.get("is_active"),
                file_hash: row.get("file_hash"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn create_survey(&self, survey: &NewSurvey) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = now_millis();
        let sections_json = serde_json::to_string(&survey.data.sections)?;

        sqlx::query(
            r#"
            INSERT INTO surveys (id, title, description, sections_json, is_active,
                                 source_file, file_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&survey.data.title)
        .bind(&survey.data.description)
        .bind(&sections_json)
        .bind(&survey.source_file)
        .bind(&survey.file_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE surveys SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("survey not found: {}", id);
        }
        Ok(())
    }

    async fn get_survey(&self, id: &str) -> Result<Option<SurveyRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM surveys WHERE id = ?", SURVEY_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(survey_from_row).transpose()
    }

    async fn list_surveys(&self, include_inactive: bool) -> Result<Vec<SurveyRecord>> {
        let sql = if include_inactive {
            format!(
                "SELECT {} FROM surveys ORDER BY created_at DESC, rowid DESC",
                SURVEY_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM surveys WHERE is_active = 1 ORDER BY created_at DESC, rowid DESC",
                SURVEY_COLUMNS
            )
        };

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(survey_from_row).collect()
    }

    async fn insert_response(&self, response: &NewResponse) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let responses_json = serde_json::to_string(&response.responses)?;

        sqlx::query(
            r#"
            INSERT INTO survey_responses (id, survey_id, email, name, responses_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&response.survey_id)
        .bind(&response.email)
        .bind(&response.name)
        .bind(&responses_json)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store response for survey {}", response.survey_id))?;

        Ok(id)
    }

    async fn responses_for_survey(&self, survey_id: &str) -> Result<Vec<ResponseRecord>> {
        let rows = sqlx::query(
            "SELECT id, survey_id, email, name, responses_json, created_at FROM survey_responses WHERE survey_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(response_from_row).collect()
    }

    async fn count_responses(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM survey_responses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn list_responses(&self, offset: usize, limit: usize) -> Result<Vec<ResponseRecord>> {
        let rows = sqlx::query(
            "SELECT id, survey_id, email, name, responses_json, created_at FROM survey_responses ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(response_from_row).collect()
    }
}
