use std::collections::BTreeMap;

use storage::repository::SessionRow;
use vocab_core::model::{GameId, PlayerName, SessionStatus};

use crate::error::StatsQueryError;
use super::service::StatisticsService;

/// One leaderboard row: a player's best score for a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player: PlayerName,
    pub score: u8,
}

/// Per-game slice of the overview aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOverview {
    pub game_id: GameId,
    pub session_count: u32,
    /// Mean score over completed, scored sessions; `None` when there are none.
    pub average_score: Option<f64>,
}

/// Dashboard aggregation over the whole session store.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsOverview {
    pub games: Vec<GameOverview>,
    pub most_active_player: Option<(PlayerName, u32)>,
    pub recent: Vec<SessionRow>,
}

fn completed_score(row: &SessionRow) -> Option<u8> {
    if row.record.status == SessionStatus::Completed {
        row.record.score
    } else {
        None
    }
}

/// Read-side queries for dashboards. These operate directly on the
/// persisted collections and, unlike the lifecycle methods, do propagate
/// storage failures.
impl StatisticsService {
    /// A player's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StatsQueryError` on storage failures.
    pub async fn player_history(
        &self,
        player: &PlayerName,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StatsQueryError> {
        Ok(self.sessions.sessions_by_player(player, limit).await?)
    }

    /// A game's sessions across all players, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StatsQueryError` on storage failures.
    pub async fn game_history(
        &self,
        game: &GameId,
        limit: u32,
    ) -> Result<Vec<SessionRow>, StatsQueryError> {
        Ok(self.sessions.sessions_by_game(game, limit).await?)
    }

    /// A player's best score per game, over completed sessions.
    ///
    /// # Errors
    ///
    /// Returns `StatsQueryError` on storage failures.
    pub async fn best_scores(
        &self,
        player: &PlayerName,
    ) -> Result<BTreeMap<GameId, u8>, StatsQueryError> {
        let rows = self.sessions.sessions_by_player(player, u32::MAX).await?;
        let mut best = BTreeMap::new();
        for row in &rows {
            let Some(score) = completed_score(row) else {
                continue;
            };
            let entry = best.entry(row.record.game_id.clone()).or_insert(score);
            if score > *entry {
                *entry = score;
            }
        }
        Ok(best)
    }

    /// Best score per player for a game, descending, truncated to `limit`.
    /// Ties fall back to store iteration order.
    ///
    /// # Errors
    ///
    /// Returns `StatsQueryError` on storage failures.
    pub async fn leaderboard(
        &self,
        game: &GameId,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, StatsQueryError> {
        let rows = self.sessions.sessions_by_game(game, u32::MAX).await?;
        let mut best: BTreeMap<PlayerName, u8> = BTreeMap::new();
        for row in &rows {
            let Some(score) = completed_score(row) else {
                continue;
            };
            let entry = best.entry(row.record.player_id.clone()).or_insert(score);
            if score > *entry {
                *entry = score;
            }
        }

        let mut entries: Vec<LeaderboardEntry> = best
            .into_iter()
            .map(|(player, score)| LeaderboardEntry { player, score })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Store-wide aggregation: per-game counts and average scores, the most
    /// active player, and a recent-activity slice.
    ///
    /// # Errors
    ///
    /// Returns `StatsQueryError` on storage failures.
    pub async fn overview(&self, recent_limit: u32) -> Result<StatsOverview, StatsQueryError> {
        let rows = self.sessions.list_sessions(u32::MAX).await?;

        let mut per_game: BTreeMap<GameId, (u32, u32, u64)> = BTreeMap::new();
        for row in &rows {
            let entry = per_game.entry(row.record.game_id.clone()).or_default();
            entry.0 += 1;
            if let Some(score) = completed_score(row) {
                entry.1 += 1;
                entry.2 += u64::from(score);
            }
        }
        let games = per_game
            .into_iter()
            .map(|(game_id, (session_count, scored, score_sum))| GameOverview {
                game_id,
                session_count,
                average_score: (scored > 0)
                    .then(|| score_sum as f64 / f64::from(scored)),
            })
            .collect();

        let most_active_player = self
            .players
            .list_players()
            .await?
            .into_iter()
            .max_by_key(|(_, record)| record.total_sessions)
            .map(|(name, record)| (name, record.total_sessions));

        let recent = rows.into_iter().take(recent_limit as usize).collect();

        Ok(StatsOverview {
            games,
            most_active_player,
            recent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storage::repository::InMemoryStore;
    use vocab_core::model::AnswerKind;
    use vocab_core::time::fixed_clock;

    use crate::player_identity::{MemoryIdentityStore, NoPrompt, PlayerIdentity};
    use crate::stats::SessionOptions;

    fn service(store: &InMemoryStore, player: &str) -> StatisticsService {
        let identity = Arc::new(PlayerIdentity::new(
            Arc::new(MemoryIdentityStore::with_name(player)),
            Arc::new(NoPrompt),
        ));
        StatisticsService::new(
            fixed_clock(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            identity,
        )
    }

    async fn play(store: &InMemoryStore, player: &str, game: &str, correct: u32, wrong: u32) {
        let mut stats = service(store, player);
        stats
            .start_session(
                GameId::new(game),
                SessionOptions {
                    total_words: correct + wrong,
                    source: "remote".to_string(),
                    ..SessionOptions::default()
                },
            )
            .await;
        for _ in 0..correct {
            stats.record_answer(AnswerKind::Correct).await;
        }
        for _ in 0..wrong {
            stats.record_answer(AnswerKind::Wrong).await;
        }
        stats.end_session().await.unwrap();
    }

    #[tokio::test]
    async fn best_scores_keep_the_maximum_per_game() {
        let store = InMemoryStore::new();
        play(&store, "anna", "quiz", 1, 1).await; // 50
        play(&store, "anna", "quiz", 3, 1).await; // 75
        play(&store, "anna", "typing", 1, 0).await; // 100

        let stats = service(&store, "anna");
        let anna = PlayerName::new("anna").unwrap();
        let best = stats.best_scores(&anna).await.unwrap();

        assert_eq!(best.get(&GameId::new("quiz")), Some(&75));
        assert_eq!(best.get(&GameId::new("typing")), Some(&100));
    }

    #[tokio::test]
    async fn leaderboard_sorts_descending_and_truncates() {
        let store = InMemoryStore::new();
        play(&store, "anna", "quiz", 3, 1).await; // 75
        play(&store, "ben", "quiz", 1, 0).await; // 100
        play(&store, "carla", "quiz", 1, 3).await; // 25

        let stats = service(&store, "anna");
        let board = stats.leaderboard(&GameId::new("quiz"), 2).await.unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].player, PlayerName::new("ben").unwrap());
        assert_eq!(board[0].score, 100);
        assert_eq!(board[1].player, PlayerName::new("anna").unwrap());
    }

    #[tokio::test]
    async fn in_progress_sessions_do_not_score() {
        let store = InMemoryStore::new();
        play(&store, "anna", "quiz", 1, 0).await;

        // Abandoned session: started, never ended.
        let mut abandoned = service(&store, "ben");
        abandoned
            .start_session(
                GameId::new("quiz"),
                SessionOptions {
                    total_words: 5,
                    source: "remote".to_string(),
                    ..SessionOptions::default()
                },
            )
            .await;

        let stats = service(&store, "anna");
        let board = stats.leaderboard(&GameId::new("quiz"), 10).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].player, PlayerName::new("anna").unwrap());
    }

    #[tokio::test]
    async fn overview_aggregates_per_game_and_most_active() {
        let store = InMemoryStore::new();
        play(&store, "anna", "quiz", 1, 1).await; // 50
        play(&store, "anna", "quiz", 1, 0).await; // 100
        play(&store, "ben", "typing", 0, 1).await; // 0

        let stats = service(&store, "anna");
        let overview = stats.overview(2).await.unwrap();

        assert_eq!(overview.games.len(), 2);
        let quiz = overview
            .games
            .iter()
            .find(|g| g.game_id == GameId::new("quiz"))
            .unwrap();
        assert_eq!(quiz.session_count, 2);
        assert_eq!(quiz.average_score, Some(75.0));

        let (most_active, count) = overview.most_active_player.unwrap();
        assert_eq!(most_active, PlayerName::new("anna").unwrap());
        assert_eq!(count, 2);
        assert_eq!(overview.recent.len(), 2);
    }

    #[tokio::test]
    async fn histories_come_back_newest_first() {
        let store = InMemoryStore::new();
        play(&store, "anna", "quiz", 1, 0).await;
        play(&store, "anna", "typing", 1, 0).await;

        let stats = service(&store, "anna");
        let anna = PlayerName::new("anna").unwrap();
        let history = stats.player_history(&anna, 10).await.unwrap();
        assert_eq!(history.len(), 2);

        let quiz_history = stats.game_history(&GameId::new("quiz"), 10).await.unwrap();
        assert_eq!(quiz_history.len(), 1);
        assert_eq!(quiz_history[0].record.player_id, anna);
    }
}
