#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod lesson_manager;
pub mod player_identity;
pub mod remote_source;
pub mod stats;
pub mod vocabulary_service;

pub use vocab_core::Clock;

pub use engine::{GameConfig, GameEngine, GameEvents, GameResults, GameSession, NoopEvents};
pub use error::StatsQueryError;
pub use lesson_manager::{LessonManager, LessonSelection, LessonSelectorOptions};
pub use player_identity::{
    FileIdentityStore, IdentityStore, MemoryIdentityStore, NamePrompt, NoPrompt, PlayerIdentity,
};
pub use remote_source::HttpVocabularySource;
pub use stats::{
    DEFAULT_SAVE_FREQUENCY, GameOverview, LeaderboardEntry, SessionOptions, StatisticsService,
    StatsOverview,
};
pub use vocabulary_service::{
    SourceResolution, SourceStatus, SourceTier, StatusListener, VocabularyService,
};
