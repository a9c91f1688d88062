use chrono::{DateTime, Utc};
use std::sync::Arc;

use storage::repository::{
    PlayerRecord, PlayerRepository, SessionRecord, SessionRepository,
};
use vocab_core::Clock;
use vocab_core::model::{AnswerKind, GameId, SessionId, SessionStatus, score_percent};

use crate::player_identity::PlayerIdentity;

/// How many recorded answers may pass between partial saves.
pub const DEFAULT_SAVE_FREQUENCY: u32 = 5;

/// Context supplied when a session starts.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub total_words: u32,
    pub lesson: Option<String>,
    pub difficulty: Option<String>,
    pub is_retry_mode: bool,
    /// Which vocabulary tier fed the session.
    pub source: String,
}

struct ActiveSession {
    id: Option<SessionId>,
    record: SessionRecord,
    started_at: DateTime<Utc>,
    answers_since_save: u32,
}

/// Session lifecycle recorder with periodic partial persistence.
///
/// A session is persisted optimistically as `in_progress` the moment it
/// starts, so abandoned sessions remain observable. Storage failures in the
/// lifecycle path are logged and swallowed; at worst, play proceeds without
/// persisted statistics. At most one session is active per service instance;
/// starting a new one replaces the old.
pub struct StatisticsService {
    clock: Clock,
    pub(crate) sessions: Arc<dyn SessionRepository>,
    pub(crate) players: Arc<dyn PlayerRepository>,
    identity: Arc<PlayerIdentity>,
    save_frequency: u32,
    active: Option<ActiveSession>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        players: Arc<dyn PlayerRepository>,
        identity: Arc<PlayerIdentity>,
    ) -> Self {
        Self {
            clock,
            sessions,
            players,
            identity,
            save_frequency: DEFAULT_SAVE_FREQUENCY,
            active: None,
        }
    }

    /// Override how many answers may pass between partial saves.
    #[must_use]
    pub fn with_save_frequency(mut self, frequency: u32) -> Self {
        self.save_frequency = frequency.max(1);
        self
    }

    #[must_use]
    pub fn has_active_session(&self) -> bool {
        self.active.is_some()
    }

    /// The id of the active session, if the store assigned one.
    #[must_use]
    pub fn active_session_id(&self) -> Option<&SessionId> {
        self.active.as_ref().and_then(|a| a.id.as_ref())
    }

    /// Begin tracking a session.
    ///
    /// Resolves the player identity, which may prompt on first-ever use.
    /// Without an identity the session is simply not tracked; the game goes
    /// on regardless.
    pub async fn start_session(&mut self, game_id: GameId, options: SessionOptions) {
        let Some(player) = self.identity.resolve().await else {
            log::warn!("no player identity; session for '{game_id}' is untracked");
            self.active = None;
            return;
        };

        let now = self.clock.now();
        let record = SessionRecord::started(
            player,
            game_id,
            now,
            options.total_words,
            options.lesson,
            options.difficulty,
            options.is_retry_mode,
            options.source,
        );

        let id = match self.sessions.create_session(&record).await {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("failed to persist session start: {e}");
                None
            }
        };

        self.active = Some(ActiveSession {
            id,
            record,
            started_at: now,
            answers_since_save: 0,
        });
    }

    /// Record one answered item. Every Nth call pushes the counters to the
    /// persisted in-progress record, bounding both write volume and how
    /// much an abandoned session can lose.
    pub async fn record_answer(&mut self, kind: AnswerKind) {
        let Some(active) = &mut self.active else {
            return;
        };

        match kind {
            AnswerKind::Correct => active.record.correct_count += 1,
            AnswerKind::Wrong => active.record.wrong_count += 1,
            AnswerKind::Skipped => active.record.skipped_count += 1,
        }

        active.answers_since_save += 1;
        if active.answers_since_save < self.save_frequency {
            return;
        }
        active.answers_since_save = 0;

        if let Some(id) = &active.id {
            if let Err(e) = self.sessions.update_session(id, &active.record).await {
                log::warn!("partial save failed for session {id}: {e}");
            }
        }
    }

    /// Finalize the active session and fold it into the player aggregate.
    ///
    /// Returns the session id, or `None` when no session was active or the
    /// store never assigned one.
    pub async fn end_session(&mut self) -> Option<SessionId> {
        let mut active = self.active.take()?;
        let now = self.clock.now();

        let duration =
            u32::try_from((now - active.started_at).num_seconds().max(0)).unwrap_or(u32::MAX);
        let completed = active.record.correct_count
            + active.record.wrong_count
            + active.record.skipped_count;

        active.record.status = SessionStatus::Completed;
        active.record.score = Some(score_percent(active.record.correct_count, completed));
        active.record.words_completed = Some(completed);
        active.record.end_time_ms = Some(now.timestamp_millis());
        active.record.duration_seconds = Some(duration);

        let id = match active.id {
            Some(id) => {
                if let Err(e) = self.sessions.update_session(&id, &active.record).await {
                    log::warn!("failed to finalize session {id}: {e}");
                }
                Some(id)
            }
            // The store was unavailable at start; write one full record now.
            None => match self.sessions.create_session(&active.record).await {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("failed to persist completed session: {e}");
                    None
                }
            },
        };

        self.update_player_aggregate(&active.record, duration, now)
            .await;

        id
    }

    // Read-modify-write with no compare-and-swap: two sessions ending at the
    // same moment (e.g. two tabs) can lose an update, last write wins. An
    // accepted limitation, not one to fix silently.
    async fn update_player_aggregate(
        &self,
        record: &SessionRecord,
        duration: u32,
        now: DateTime<Utc>,
    ) {
        let existing = match self.players.get_player(&record.player_id).await {
            Ok(existing) => existing,
            Err(e) => {
                log::warn!("failed to read player aggregate: {e}");
                return;
            }
        };

        let mut aggregate = existing.unwrap_or_else(|| PlayerRecord::first_seen(now));
        aggregate.absorb_session(&record.game_id, duration, now);

        if let Err(e) = self.players.put_player(&record.player_id, &aggregate).await {
            log::warn!("failed to write player aggregate: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storage::repository::InMemoryStore;
    use vocab_core::model::PlayerName;
    use vocab_core::time::{fixed_clock, fixed_now};

    use crate::player_identity::{MemoryIdentityStore, NoPrompt, PlayerIdentity};

    fn identity(name: &str) -> Arc<PlayerIdentity> {
        Arc::new(PlayerIdentity::new(
            Arc::new(MemoryIdentityStore::with_name(name)),
            Arc::new(NoPrompt),
        ))
    }

    fn service(store: &InMemoryStore, identity: Arc<PlayerIdentity>) -> StatisticsService {
        StatisticsService::new(
            fixed_clock(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            identity,
        )
    }

    fn options(total_words: u32) -> SessionOptions {
        SessionOptions {
            total_words,
            source: "remote".to_string(),
            ..SessionOptions::default()
        }
    }

    #[tokio::test]
    async fn perfect_session_scores_one_hundred() {
        let store = InMemoryStore::new();
        let mut stats = service(&store, identity("anna"));

        stats.start_session(GameId::new("g1"), options(5)).await;
        for _ in 0..5 {
            stats.record_answer(AnswerKind::Correct).await;
        }
        let id = stats.end_session().await.unwrap();

        let record = store.get_session(&id).await.unwrap();
        assert_eq!(record.status, SessionStatus::Completed);
        assert_eq!(record.score, Some(100));
        assert_eq!(record.words_completed, Some(5));
        assert_eq!(record.correct_count, 5);
        assert_eq!(record.wrong_count, 0);
    }

    #[tokio::test]
    async fn session_is_persisted_in_progress_at_start() {
        let store = InMemoryStore::new();
        let mut stats = service(&store, identity("anna"));

        stats.start_session(GameId::new("g1"), options(3)).await;
        let id = stats.active_session_id().unwrap().clone();

        let record = store.get_session(&id).await.unwrap();
        assert_eq!(record.status, SessionStatus::InProgress);
        assert_eq!(record.total_words, 3);
        assert_eq!(record.correct_count, 0);
    }

    #[tokio::test]
    async fn partial_saves_land_every_nth_answer() {
        let store = InMemoryStore::new();
        let mut stats = service(&store, identity("anna")).with_save_frequency(3);

        stats.start_session(GameId::new("g1"), options(10)).await;
        let id = stats.active_session_id().unwrap().clone();

        stats.record_answer(AnswerKind::Correct).await;
        stats.record_answer(AnswerKind::Wrong).await;
        let record = store.get_session(&id).await.unwrap();
        assert_eq!(record.correct_count, 0); // not yet flushed

        stats.record_answer(AnswerKind::Correct).await;
        let record = store.get_session(&id).await.unwrap();
        assert_eq!(record.correct_count, 2);
        assert_eq!(record.wrong_count, 1);
        assert_eq!(record.status, SessionStatus::InProgress);
    }

    #[tokio::test]
    async fn without_identity_the_session_is_untracked() {
        let store = InMemoryStore::new();
        let no_identity = Arc::new(PlayerIdentity::new(
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(NoPrompt),
        ));
        let mut stats = service(&store, no_identity);

        stats.start_session(GameId::new("g1"), options(3)).await;
        assert!(!stats.has_active_session());

        stats.record_answer(AnswerKind::Correct).await;
        assert!(stats.end_session().await.is_none());
        assert!(store.list_sessions(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_without_start_returns_none() {
        let store = InMemoryStore::new();
        let mut stats = service(&store, identity("anna"));
        assert!(stats.end_session().await.is_none());
    }

    #[tokio::test]
    async fn duration_comes_from_the_clock() {
        let store = InMemoryStore::new();
        let mut stats = service(&store, identity("anna"));

        stats.start_session(GameId::new("g1"), options(1)).await;
        stats.record_answer(AnswerKind::Correct).await;
        // Fixed clock: start and end coincide.
        let id = stats.end_session().await.unwrap();

        let record = store.get_session(&id).await.unwrap();
        assert_eq!(record.duration_seconds, Some(0));
        assert_eq!(record.end_time_ms, Some(fixed_now().timestamp_millis()));
    }

    #[tokio::test]
    async fn aggregate_accumulates_across_sessions() {
        let store = InMemoryStore::new();
        let mut stats = service(&store, identity("anna"));

        stats.start_session(GameId::new("quiz"), options(1)).await;
        stats.record_answer(AnswerKind::Correct).await;
        stats.end_session().await.unwrap();

        stats.start_session(GameId::new("typing"), options(1)).await;
        stats.record_answer(AnswerKind::Wrong).await;
        stats.end_session().await.unwrap();

        let anna = PlayerName::new("anna").unwrap();
        let aggregate = store.get_player(&anna).await.unwrap().unwrap();
        assert_eq!(aggregate.total_sessions, 2);
        assert_eq!(
            aggregate.games_played,
            vec![GameId::new("quiz"), GameId::new("typing")]
        );
    }

    // The aggregate update is read-then-write without compare-and-swap, so
    // two services ending sessions concurrently could lose one increment
    // (last write wins). This test only pins the sequential behavior; the
    // race itself is a known, accepted limitation.
    #[tokio::test]
    async fn aggregate_update_is_read_modify_write() {
        let store = InMemoryStore::new();
        let mut a = service(&store, identity("anna"));
        let mut b = service(&store, identity("anna"));

        a.start_session(GameId::new("quiz"), options(1)).await;
        b.start_session(GameId::new("quiz"), options(1)).await;
        a.end_session().await.unwrap();
        b.end_session().await.unwrap();

        let anna = PlayerName::new("anna").unwrap();
        let aggregate = store.get_player(&anna).await.unwrap().unwrap();
        assert_eq!(aggregate.total_sessions, 2);
    }

    #[tokio::test]
    async fn starting_a_new_session_replaces_the_old() {
        let store = InMemoryStore::new();
        let mut stats = service(&store, identity("anna"));

        stats.start_session(GameId::new("g1"), options(2)).await;
        let first = stats.active_session_id().unwrap().clone();
        stats.start_session(GameId::new("g1"), options(2)).await;
        let second = stats.active_session_id().unwrap().clone();

        assert_ne!(first, second);
        // The first record stays in_progress forever; that is the abandoned
        // session shape dashboards are expected to see.
        let record = store.get_session(&first).await.unwrap();
        assert_eq!(record.status, SessionStatus::InProgress);
    }
}
