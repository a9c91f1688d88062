use sqlx::Row;

use vocab_core::model::{GameId, PlayerName, SessionId, SessionStatus};

use crate::repository::{SessionRecord, SessionRow, StorageError};

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn opt_u32_from_i64(
    field: &'static str,
    v: Option<i64>,
) -> Result<Option<u32>, StorageError> {
    v.map(|v| u32_from_i64(field, v)).transpose()
}

/// Parse the string form of a session id back into the rowid it came from.
pub(super) fn rowid_from_session_id(id: &SessionId) -> Result<i64, StorageError> {
    id.as_str()
        .parse::<i64>()
        .map_err(|_| StorageError::Serialization(format!("invalid session id: {id}")))
}

pub(super) fn map_session_record(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRecord, StorageError> {
    let player_id =
        PlayerName::new(row.try_get::<String, _>("player_id").map_err(ser)?).map_err(ser)?;
    let status: String = row.try_get("status").map_err(ser)?;
    let score: Option<i64> = row.try_get("score").map_err(ser)?;
    let score = match score {
        Some(v) => Some(u8::try_from(v).map_err(|_| ser(format!("invalid score: {v}")))?),
        None => None,
    };

    Ok(SessionRecord {
        player_id,
        game_id: GameId::new(row.try_get::<String, _>("game_id").map_err(ser)?),
        status: status.parse::<SessionStatus>().map_err(ser)?,
        timestamp: row.try_get("timestamp").map_err(ser)?,
        date: row.try_get("date").map_err(ser)?,
        start_time_ms: row.try_get("start_time_ms").map_err(ser)?,
        total_words: u32_from_i64("total_words", row.try_get("total_words").map_err(ser)?)?,
        correct_count: u32_from_i64("correct_count", row.try_get("correct_count").map_err(ser)?)?,
        wrong_count: u32_from_i64("wrong_count", row.try_get("wrong_count").map_err(ser)?)?,
        skipped_count: u32_from_i64("skipped_count", row.try_get("skipped_count").map_err(ser)?)?,
        lesson: row.try_get("lesson").map_err(ser)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
        is_retry_mode: row.try_get("is_retry_mode").map_err(ser)?,
        source: row.try_get("source").map_err(ser)?,
        score,
        words_completed: opt_u32_from_i64(
            "words_completed",
            row.try_get("words_completed").map_err(ser)?,
        )?,
        end_time_ms: row.try_get("end_time_ms").map_err(ser)?,
        duration_seconds: opt_u32_from_i64(
            "duration_seconds",
            row.try_get("duration_seconds").map_err(ser)?,
        )?,
    })
}

pub(super) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let record = map_session_record(row)?;
    Ok(SessionRow::new(SessionId::new(id.to_string()), record))
}
