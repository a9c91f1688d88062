use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use vocab_core::model::{GameId, PlayerName, SessionId, SessionStatus, VocabularyItem};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of one play-through.
///
/// Created with status `in_progress` when a session starts; counters are
/// pushed periodically while play continues; the finalization fields
/// (`score`, `words_completed`, `end_time_ms`, `duration_seconds`) are set
/// when the session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub player_id: PlayerName,
    pub game_id: GameId,
    pub status: SessionStatus,
    pub timestamp: DateTime<Utc>,
    /// Calendar day of `timestamp`, `YYYY-MM-DD`.
    pub date: String,
    pub start_time_ms: i64,
    pub total_words: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub skipped_count: u32,
    pub lesson: Option<String>,
    pub difficulty: Option<String>,
    pub is_retry_mode: bool,
    /// Which vocabulary tier fed the session (remote/local/embedded).
    pub source: String,
    pub score: Option<u8>,
    pub words_completed: Option<u32>,
    pub end_time_ms: Option<i64>,
    pub duration_seconds: Option<u32>,
}

impl SessionRecord {
    /// Build a fresh `in_progress` record for a session starting at `at`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn started(
        player_id: PlayerName,
        game_id: GameId,
        at: DateTime<Utc>,
        total_words: u32,
        lesson: Option<String>,
        difficulty: Option<String>,
        is_retry_mode: bool,
        source: impl Into<String>,
    ) -> Self {
        Self {
            player_id,
            game_id,
            status: SessionStatus::InProgress,
            timestamp: at,
            date: at.format("%Y-%m-%d").to_string(),
            start_time_ms: at.timestamp_millis(),
            total_words,
            correct_count: 0,
            wrong_count: 0,
            skipped_count: 0,
            lesson,
            difficulty,
            is_retry_mode,
            source: source.into(),
            score: None,
            words_completed: None,
            end_time_ms: None,
            duration_seconds: None,
        }
    }
}

/// A session record together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub id: SessionId,
    pub record: SessionRecord,
}

impl SessionRow {
    #[must_use]
    pub fn new(id: SessionId, record: SessionRecord) -> Self {
        Self { id, record }
    }
}

/// Per-player aggregate, updated when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub total_sessions: u32,
    /// Accumulated play time in whole seconds.
    pub total_play_time: u32,
    /// Distinct games this player has played, insertion-ordered.
    pub games_played: Vec<GameId>,
}

impl PlayerRecord {
    /// Fresh aggregate for a player first seen at `at`.
    #[must_use]
    pub fn first_seen(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            last_seen: at,
            total_sessions: 0,
            total_play_time: 0,
            games_played: Vec::new(),
        }
    }

    /// Fold one completed session into the aggregate.
    pub fn absorb_session(&mut self, game_id: &GameId, duration_seconds: u32, at: DateTime<Utc>) {
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.total_play_time = self.total_play_time.saturating_add(duration_seconds);
        self.last_seen = at;
        if !self.games_played.contains(game_id) {
            self.games_played.push(game_id.clone());
        }
    }
}

/// Repository contract for session records.
///
/// Listing methods sort descending by `timestamp`; ties fall back to store
/// iteration order, which is deliberately unspecified.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new record, returning the generated id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn create_session(&self, record: &SessionRecord) -> Result<SessionId, StorageError>;

    /// Overwrite an existing record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is unknown, or other
    /// storage errors.
    async fn update_session(
        &self,
        id: &SessionId,
        record: &SessionRecord,
    ) -> Result<(), StorageError>;

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_session(&self, id: &SessionId) -> Result<SessionRecord, StorageError>;

    /// List a player's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn sessions_by_player(
        &self,
        player: &PlayerName,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StorageError>;

    /// List a game's sessions across all players, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn sessions_by_game(
        &self,
        game: &GameId,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StorageError>;

    /// List all sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, StorageError>;
}

/// Repository contract for per-player aggregates.
///
/// `put_player` is a plain overwrite; the read-modify-write sequence around
/// it is not atomic (see the statistics service for the documented race).
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Fetch a player's aggregate, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_player(&self, name: &PlayerName) -> Result<Option<PlayerRecord>, StorageError>;

    /// Insert or overwrite a player's aggregate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn put_player(
        &self,
        name: &PlayerName,
        record: &PlayerRecord,
    ) -> Result<(), StorageError>;

    /// List all player aggregates.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_players(&self) -> Result<Vec<(PlayerName, PlayerRecord)>, StorageError>;
}

/// Repository contract for remote vocabulary sets.
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    /// Fetch the vocabulary set for `kind`, or `None` if the store has no
    /// entry for it. An empty set is returned as-is; interpreting empty as a
    /// miss is the vocabulary service's policy, not the store's.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached or the payload
    /// cannot be decoded.
    async fn fetch_set(&self, kind: &str) -> Result<Option<Vec<VocabularyItem>>, StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    next_id: Arc<AtomicI64>,
    sessions: Arc<Mutex<Vec<SessionRow>>>,
    players: Arc<Mutex<BTreeMap<PlayerName, PlayerRecord>>>,
    vocabulary: Arc<Mutex<HashMap<String, Vec<VocabularyItem>>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicI64::new(1)),
            sessions: Arc::new(Mutex::new(Vec::new())),
            players: Arc::new(Mutex::new(BTreeMap::new())),
            vocabulary: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seed a vocabulary set so `fetch_set` can serve it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn put_vocabulary(
        &self,
        kind: &str,
        items: Vec<VocabularyItem>,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.vocabulary)?;
        guard.insert(kind.to_string(), items);
        Ok(())
    }

    fn sorted_rows<F>(&self, filter: F, limit: u32) -> Result<Vec<SessionRow>, StorageError>
    where
        F: Fn(&SessionRow) -> bool,
    {
        let guard = lock(&self.sessions)?;
        let mut rows: Vec<SessionRow> = guard.iter().filter(|r| filter(r)).cloned().collect();
        rows.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
    m.lock().map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create_session(&self, record: &SessionRecord) -> Result<SessionId, StorageError> {
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
        let mut guard = lock(&self.sessions)?;
        guard.push(SessionRow::new(id.clone(), record.clone()));
        Ok(id)
    }

    async fn update_session(
        &self,
        id: &SessionId,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.sessions)?;
        let row = guard
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(StorageError::NotFound)?;
        row.record = record.clone();
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<SessionRecord, StorageError> {
        let guard = lock(&self.sessions)?;
        guard
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.record.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn sessions_by_player(
        &self,
        player: &PlayerName,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StorageError> {
        self.sorted_rows(|r| &r.record.player_id == player, limit)
    }

    async fn sessions_by_game(
        &self,
        game: &GameId,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StorageError> {
        self.sorted_rows(|r| &r.record.game_id == game, limit)
    }

    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, StorageError> {
        self.sorted_rows(|_| true, limit)
    }
}

#[async_trait]
impl PlayerRepository for InMemoryStore {
    async fn get_player(&self, name: &PlayerName) -> Result<Option<PlayerRecord>, StorageError> {
        let guard = lock(&self.players)?;
        Ok(guard.get(name).cloned())
    }

    async fn put_player(
        &self,
        name: &PlayerName,
        record: &PlayerRecord,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.players)?;
        guard.insert(name.clone(), record.clone());
        Ok(())
    }

    async fn list_players(&self) -> Result<Vec<(PlayerName, PlayerRecord)>, StorageError> {
        let guard = lock(&self.players)?;
        Ok(guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

#[async_trait]
impl VocabularyRepository for InMemoryStore {
    async fn fetch_set(&self, kind: &str) -> Result<Option<Vec<VocabularyItem>>, StorageError> {
        let guard = lock(&self.vocabulary)?;
        Ok(guard.get(kind).cloned())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub players: Arc<dyn PlayerRepository>,
    pub vocabulary: Arc<dyn VocabularyRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            sessions: Arc::new(store.clone()),
            players: Arc::new(store.clone()),
            vocabulary: Arc::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::time::fixed_now;

    fn build_record(player: &str, game: &str, offset_secs: i64) -> SessionRecord {
        SessionRecord::started(
            PlayerName::new(player).unwrap(),
            GameId::new(game),
            fixed_now() + chrono::Duration::seconds(offset_secs),
            10,
            None,
            None,
            false,
            "remote",
        )
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let store = InMemoryStore::new();
        let a = store
            .create_session(&build_record("anna", "quiz", 0))
            .await
            .unwrap();
        let b = store
            .create_session(&build_record("anna", "quiz", 1))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn update_overwrites_record() {
        let store = InMemoryStore::new();
        let mut record = build_record("anna", "quiz", 0);
        let id = store.create_session(&record).await.unwrap();

        record.correct_count = 4;
        record.status = SessionStatus::Completed;
        store.update_session(&id, &record).await.unwrap();

        let fetched = store.get_session(&id).await.unwrap();
        assert_eq!(fetched.correct_count, 4);
        assert_eq!(fetched.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = InMemoryStore::new();
        let record = build_record("anna", "quiz", 0);
        let err = store
            .update_session(&SessionId::new("999"), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_filtered() {
        let store = InMemoryStore::new();
        store
            .create_session(&build_record("anna", "quiz", 0))
            .await
            .unwrap();
        store
            .create_session(&build_record("ben", "quiz", 10))
            .await
            .unwrap();
        store
            .create_session(&build_record("anna", "typing", 20))
            .await
            .unwrap();

        let anna = PlayerName::new("anna").unwrap();
        let by_player = store.sessions_by_player(&anna, 10).await.unwrap();
        assert_eq!(by_player.len(), 2);
        assert_eq!(by_player[0].record.game_id, GameId::new("typing"));

        let by_game = store
            .sessions_by_game(&GameId::new("quiz"), 10)
            .await
            .unwrap();
        assert_eq!(by_game.len(), 2);
        assert_eq!(by_game[0].record.player_id, PlayerName::new("ben").unwrap());

        let limited = store.list_sessions(1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].record.game_id, GameId::new("typing"));
    }

    #[tokio::test]
    async fn player_aggregate_roundtrip() {
        let store = InMemoryStore::new();
        let anna = PlayerName::new("anna").unwrap();
        assert!(store.get_player(&anna).await.unwrap().is_none());

        let mut record = PlayerRecord::first_seen(fixed_now());
        record.absorb_session(&GameId::new("quiz"), 30, fixed_now());
        record.absorb_session(&GameId::new("quiz"), 15, fixed_now());
        record.absorb_session(&GameId::new("typing"), 5, fixed_now());
        store.put_player(&anna, &record).await.unwrap();

        let fetched = store.get_player(&anna).await.unwrap().unwrap();
        assert_eq!(fetched.total_sessions, 3);
        assert_eq!(fetched.total_play_time, 50);
        assert_eq!(
            fetched.games_played,
            vec![GameId::new("quiz"), GameId::new("typing")]
        );
    }

    #[tokio::test]
    async fn vocabulary_fetch_misses_unknown_kind() {
        let store = InMemoryStore::new();
        assert!(store.fetch_set("animals").await.unwrap().is_none());

        let items = vec![VocabularyItem::new("hund", "dog").unwrap()];
        store.put_vocabulary("animals", items.clone()).unwrap();
        assert_eq!(store.fetch_set("animals").await.unwrap(), Some(items));
    }
}
