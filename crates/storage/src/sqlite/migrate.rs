use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates sessions, players, vocabulary sets, and the listing indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS sessions (
                    id INTEGER PRIMARY KEY,
                    player_id TEXT NOT NULL,
                    game_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    timestamp TEXT NOT NULL,
                    date TEXT NOT NULL,
                    start_time_ms INTEGER NOT NULL,
                    total_words INTEGER NOT NULL CHECK (total_words >= 0),
                    correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
                    wrong_count INTEGER NOT NULL CHECK (wrong_count >= 0),
                    skipped_count INTEGER NOT NULL CHECK (skipped_count >= 0),
                    lesson TEXT,
                    difficulty TEXT,
                    is_retry_mode INTEGER NOT NULL CHECK (is_retry_mode IN (0, 1)),
                    source TEXT NOT NULL,
                    score INTEGER CHECK (score BETWEEN 0 AND 100),
                    words_completed INTEGER CHECK (words_completed >= 0),
                    end_time_ms INTEGER,
                    duration_seconds INTEGER CHECK (duration_seconds >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS players (
                    name TEXT PRIMARY KEY,
                    created_at TEXT NOT NULL,
                    last_seen TEXT NOT NULL,
                    total_sessions INTEGER NOT NULL CHECK (total_sessions >= 0),
                    total_play_time INTEGER NOT NULL CHECK (total_play_time >= 0),
                    games_played TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS vocabulary_sets (
                    kind TEXT PRIMARY KEY,
                    items TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_sessions_player_timestamp
                    ON sessions (player_id, timestamp);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_sessions_game_timestamp
                    ON sessions (game_id, timestamp);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
