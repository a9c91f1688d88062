use storage::repository::{
    PlayerRecord, PlayerRepository, SessionRecord, SessionRepository, StorageError,
    VocabularyRepository,
};
use storage::sqlite::SqliteStore;
use vocab_core::model::{GameId, PlayerName, SessionId, SessionStatus, VocabularyItem};
use vocab_core::time::fixed_now;

async fn memory_store() -> SqliteStore {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    store
}

fn build_record(player: &str, game: &str, offset_secs: i64) -> SessionRecord {
    SessionRecord::started(
        PlayerName::new(player).unwrap(),
        GameId::new(game),
        fixed_now() + chrono::Duration::seconds(offset_secs),
        12,
        Some("3".to_string()),
        None,
        false,
        "remote",
    )
}

#[tokio::test]
async fn session_record_roundtrips() {
    let store = memory_store().await;
    let mut record = build_record("anna", "flashcards", 0);
    let id = store.create_session(&record).await.unwrap();

    let fetched = store.get_session(&id).await.unwrap();
    assert_eq!(fetched, record);

    record.status = SessionStatus::Completed;
    record.correct_count = 9;
    record.wrong_count = 2;
    record.skipped_count = 1;
    record.score = Some(75);
    record.words_completed = Some(12);
    record.end_time_ms = Some(record.start_time_ms + 90_000);
    record.duration_seconds = Some(90);
    store.update_session(&id, &record).await.unwrap();

    let finalized = store.get_session(&id).await.unwrap();
    assert_eq!(finalized, record);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let store = memory_store().await;
    let err = store
        .get_session(&SessionId::new("12345"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let err = store
        .update_session(&SessionId::new("12345"), &build_record("anna", "quiz", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn listings_filter_and_sort_newest_first() {
    let store = memory_store().await;
    store
        .create_session(&build_record("anna", "quiz", 0))
        .await
        .unwrap();
    store
        .create_session(&build_record("ben", "quiz", 60))
        .await
        .unwrap();
    store
        .create_session(&build_record("anna", "typing", 120))
        .await
        .unwrap();

    let anna = PlayerName::new("anna").unwrap();
    let rows = store.sessions_by_player(&anna, 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].record.game_id, GameId::new("typing"));
    assert_eq!(rows[1].record.game_id, GameId::new("quiz"));

    let rows = store
        .sessions_by_game(&GameId::new("quiz"), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].record.player_id, PlayerName::new("ben").unwrap());

    let rows = store.list_sessions(2).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].record.game_id, GameId::new("typing"));
}

#[tokio::test]
async fn player_aggregate_upserts() {
    let store = memory_store().await;
    let anna = PlayerName::new("anna").unwrap();
    assert!(store.get_player(&anna).await.unwrap().is_none());

    let mut record = PlayerRecord::first_seen(fixed_now());
    record.absorb_session(&GameId::new("quiz"), 45, fixed_now());
    store.put_player(&anna, &record).await.unwrap();

    record.absorb_session(&GameId::new("typing"), 30, fixed_now());
    store.put_player(&anna, &record).await.unwrap();

    let fetched = store.get_player(&anna).await.unwrap().unwrap();
    assert_eq!(fetched.total_sessions, 2);
    assert_eq!(fetched.total_play_time, 75);
    assert_eq!(
        fetched.games_played,
        vec![GameId::new("quiz"), GameId::new("typing")]
    );

    let players = store.list_players().await.unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].0, anna);
}

#[tokio::test]
async fn vocabulary_set_roundtrips() {
    let store = memory_store().await;
    assert!(store.fetch_set("animals").await.unwrap().is_none());

    let items = vec![
        VocabularyItem::new("hund", "dog").unwrap(),
        VocabularyItem::with_id("w2", "katze", "cat").unwrap(),
    ];
    store.put_vocabulary("animals", &items).await.unwrap();
    assert_eq!(store.fetch_set("animals").await.unwrap(), Some(items));
}
