//! Extraction history database operations

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Extraction record: the persisted result of one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Extraction {
    pub id: i64,
    pub filename: String,
    pub file_size: i64,
    pub extracted_text: String,
    pub page_count: Option<i64>,
    pub processing_time: Option<f64>,
    pub created_at: String,
}

/// Fields supplied when persisting a finished extraction
#[derive(Debug, Clone)]
pub struct NewExtraction {
    pub filename: String,
    pub file_size: i64,
    pub extracted_text: String,
    pub page_count: Option<i64>,
    pub processing_time: Option<f64>,
}

/// Extraction repository
pub struct ExtractionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ExtractionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a specific extraction
    pub async fn get(&self, id: i64) -> Result<Option<Extraction>> {
        let extraction = sqlx::query_as::<_, Extraction>(
            r#"
            SELECT id, filename, file_size, extracted_text, page_count,
                   processing_time, created_at
            FROM extractions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(extraction)
    }

    /// List extractions in insertion order
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Extraction>> {
        let extractions = sqlx::query_as::<_, Extraction>(
            r#"
            SELECT id, filename, file_size, extracted_text, page_count,
                   processing_time, created_at
            FROM extractions
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await?;

        Ok(extractions)
    }

    /// Persist a new extraction and return the full record
    pub async fn create(&self, data: &NewExtraction) -> Result<Extraction> {
        let result = sqlx::query(
            r#"
            INSERT INTO extractions (filename, file_size, extracted_text, page_count, processing_time)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.filename)
        .bind(data.file_size)
        .bind(&data.extracted_text)
        .bind(data.page_count)
        .bind(data.processing_time)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();

        self.get(id).await?.ok_or_else(|| {
            crate::error::AppError::Internal("Failed to fetch created extraction".to_string())
        })
    }

    /// Delete an extraction; returns whether a row existed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM extractions WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
