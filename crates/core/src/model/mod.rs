mod ids;
mod item;
mod player;
mod session;

pub use ids::{GameId, LessonId, ParseLessonIdError, SessionId};
pub use item::{VocabularyItem, VocabularyItemError};
pub use player::{PlayerName, PlayerNameError};
pub use session::{AnswerKind, ParseStatusError, SessionStatus, score_percent};
