mod queries;
mod service;

pub use queries::{GameOverview, LeaderboardEntry, StatsOverview};
pub use service::{DEFAULT_SAVE_FREQUENCY, SessionOptions, StatisticsService};
