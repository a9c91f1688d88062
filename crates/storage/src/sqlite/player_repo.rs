use sqlx::Row;

use vocab_core::model::{GameId, PlayerName};

use super::SqliteStore;
use super::mapping::{ser, u32_from_i64};
use crate::repository::{PlayerRecord, PlayerRepository, StorageError};

fn games_to_json(games: &[GameId]) -> Result<String, StorageError> {
    let names: Vec<&str> = games.iter().map(GameId::as_str).collect();
    serde_json::to_string(&names).map_err(ser)
}

fn games_from_json(raw: &str) -> Result<Vec<GameId>, StorageError> {
    let names: Vec<String> = serde_json::from_str(raw).map_err(ser)?;
    Ok(names.into_iter().map(GameId::new).collect())
}

fn map_player_record(row: &sqlx::sqlite::SqliteRow) -> Result<PlayerRecord, StorageError> {
    Ok(PlayerRecord {
        created_at: row.try_get("created_at").map_err(ser)?,
        last_seen: row.try_get("last_seen").map_err(ser)?,
        total_sessions: u32_from_i64(
            "total_sessions",
            row.try_get("total_sessions").map_err(ser)?,
        )?,
        total_play_time: u32_from_i64(
            "total_play_time",
            row.try_get("total_play_time").map_err(ser)?,
        )?,
        games_played: games_from_json(&row.try_get::<String, _>("games_played").map_err(ser)?)?,
    })
}

#[async_trait::async_trait]
impl PlayerRepository for SqliteStore {
    async fn get_player(&self, name: &PlayerName) -> Result<Option<PlayerRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT created_at, last_seen, total_sessions, total_play_time, games_played
                FROM players
                WHERE name = ?1
            ",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_player_record).transpose()
    }

    async fn put_player(
        &self,
        name: &PlayerName,
        record: &PlayerRecord,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO players (name, created_at, last_seen, total_sessions, total_play_time, games_played)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(name) DO UPDATE SET
                    last_seen = excluded.last_seen,
                    total_sessions = excluded.total_sessions,
                    total_play_time = excluded.total_play_time,
                    games_played = excluded.games_played
            ",
        )
        .bind(name.as_str())
        .bind(record.created_at)
        .bind(record.last_seen)
        .bind(i64::from(record.total_sessions))
        .bind(i64::from(record.total_play_time))
        .bind(games_to_json(&record.games_played)?)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_players(&self) -> Result<Vec<(PlayerName, PlayerRecord)>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT name, created_at, last_seen, total_sessions, total_play_time, games_played
                FROM players
                ORDER BY name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let name =
                PlayerName::new(row.try_get::<String, _>("name").map_err(ser)?).map_err(ser)?;
            out.push((name, map_player_record(row)?));
        }
        Ok(out)
    }
}
