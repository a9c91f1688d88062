use vocab_core::model::{GameId, PlayerName, SessionId};

use super::SqliteStore;
use super::mapping::{map_session_record, map_session_row, rowid_from_session_id};
use crate::repository::{SessionRecord, SessionRepository, SessionRow, StorageError};

const SESSION_COLUMNS: &str = r"
    player_id, game_id, status, timestamp, date, start_time_ms,
    total_words, correct_count, wrong_count, skipped_count,
    lesson, difficulty, is_retry_mode, source,
    score, words_completed, end_time_ms, duration_seconds
";

fn bind_record<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    record: &'q SessionRecord,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(record.player_id.as_str())
        .bind(record.game_id.as_str())
        .bind(record.status.as_str())
        .bind(record.timestamp)
        .bind(record.date.as_str())
        .bind(record.start_time_ms)
        .bind(i64::from(record.total_words))
        .bind(i64::from(record.correct_count))
        .bind(i64::from(record.wrong_count))
        .bind(i64::from(record.skipped_count))
        .bind(record.lesson.as_deref())
        .bind(record.difficulty.as_deref())
        .bind(record.is_retry_mode)
        .bind(record.source.as_str())
        .bind(record.score.map(i64::from))
        .bind(record.words_completed.map(i64::from))
        .bind(record.end_time_ms)
        .bind(record.duration_seconds.map(i64::from))
}

#[async_trait::async_trait]
impl SessionRepository for SqliteStore {
    async fn create_session(&self, record: &SessionRecord) -> Result<SessionId, StorageError> {
        let sql = format!(
            r"
                INSERT INTO sessions ({SESSION_COLUMNS})
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                        ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ",
        );
        let res = bind_record(sqlx::query(&sql), record)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(SessionId::new(res.last_insert_rowid().to_string()))
    }

    async fn update_session(
        &self,
        id: &SessionId,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        let rowid = rowid_from_session_id(id)?;
        let sql = r"
            UPDATE sessions SET
                player_id = ?1, game_id = ?2, status = ?3, timestamp = ?4,
                date = ?5, start_time_ms = ?6, total_words = ?7,
                correct_count = ?8, wrong_count = ?9, skipped_count = ?10,
                lesson = ?11, difficulty = ?12, is_retry_mode = ?13,
                source = ?14, score = ?15, words_completed = ?16,
                end_time_ms = ?17, duration_seconds = ?18
            WHERE id = ?19
        ";
        let res = bind_record(sqlx::query(sql), record)
            .bind(rowid)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<SessionRecord, StorageError> {
        let rowid = rowid_from_session_id(id)?;
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(rowid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        map_session_record(&row)
    }

    async fn sessions_by_player(
        &self,
        player: &PlayerName,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StorageError> {
        let sql = format!(
            r"
                SELECT id, {SESSION_COLUMNS} FROM sessions
                WHERE player_id = ?1
                ORDER BY timestamp DESC, id DESC
                LIMIT ?2
            ",
        );
        let rows = sqlx::query(&sql)
            .bind(player.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_session_row).collect()
    }

    async fn sessions_by_game(
        &self,
        game: &GameId,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StorageError> {
        let sql = format!(
            r"
                SELECT id, {SESSION_COLUMNS} FROM sessions
                WHERE game_id = ?1
                ORDER BY timestamp DESC, id DESC
                LIMIT ?2
            ",
        );
        let rows = sqlx::query(&sql)
            .bind(game.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_session_row).collect()
    }

    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, StorageError> {
        let sql = format!(
            r"
                SELECT id, {SESSION_COLUMNS} FROM sessions
                ORDER BY timestamp DESC, id DESC
                LIMIT ?1
            ",
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_session_row).collect()
    }
}
