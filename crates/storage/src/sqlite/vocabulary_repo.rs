use sqlx::Row;

use vocab_core::model::VocabularyItem;

use super::SqliteStore;
use super::mapping::ser;
use crate::repository::{StorageError, VocabularyRepository};

impl SqliteStore {
    /// Insert or replace the vocabulary set for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn put_vocabulary(
        &self,
        kind: &str,
        items: &[VocabularyItem],
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(items).map_err(ser)?;
        sqlx::query(
            r"
                INSERT INTO vocabulary_sets (kind, items)
                VALUES (?1, ?2)
                ON CONFLICT(kind) DO UPDATE SET items = excluded.items
            ",
        )
        .bind(kind)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl VocabularyRepository for SqliteStore {
    async fn fetch_set(&self, kind: &str) -> Result<Option<Vec<VocabularyItem>>, StorageError> {
        let row = sqlx::query("SELECT items FROM vocabulary_sets WHERE kind = ?1")
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("items").map_err(ser)?;
        let items: Vec<VocabularyItem> = serde_json::from_str(&raw).map_err(ser)?;
        Ok(Some(items))
    }
}
