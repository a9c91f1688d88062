mod events;
mod game;
mod session;

pub use events::{GameEvents, NoopEvents};
pub use game::{GameConfig, GameEngine};
pub use session::{GameResults, GameSession};
